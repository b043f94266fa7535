use std::collections::BTreeMap;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};

use crate::analysis::{AggregateSummary, EndpointCategory, EndpointMetrics, classify};
use crate::capture::{CapturedRequest, Session};

pub fn requests_table(requests: &[CapturedRequest]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "ID", "Time", "Method", "Endpoint", "URL", "Status", "Duration",
    ]);

    for request in requests {
        let (status, duration) = match (&request.response, &request.error) {
            (Some(response), _) => {
                let color = if response.status < 400 {
                    Color::Green
                } else {
                    Color::Red
                };
                (
                    Cell::new(response.status).fg(color),
                    Cell::new(format!("{}ms", response.duration_ms)),
                )
            }
            (None, Some(_)) => (Cell::new("error").fg(Color::Red), Cell::new("-")),
            (None, None) => (Cell::new("pending").fg(Color::Yellow), Cell::new("-")),
        };

        table.add_row(vec![
            Cell::new(&request.id),
            Cell::new(request.timestamp.format("%H:%M:%S")),
            Cell::new(&request.method),
            Cell::new(classify(&request.url, &request.method)),
            Cell::new(&request.url).add_attribute(Attribute::Dim),
            status,
            duration,
        ]);
    }
    table
}

pub fn summary_table(
    summary: &AggregateSummary,
    metrics: &BTreeMap<EndpointCategory, EndpointMetrics>,
) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Endpoint", "Requests", "Succeeded", "Failed", "Pending", "Avg (ms)",
    ]);

    for (category, m) in metrics {
        table.add_row(vec![
            Cell::new(category),
            Cell::new(m.total),
            Cell::new(m.successful).fg(Color::Green),
            Cell::new(m.failed).fg(Color::Red),
            Cell::new(m.pending),
            Cell::new(format!("{:.1}", m.average_duration_ms)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(summary.total).add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format!("{:.1}", summary.average_duration_ms)).add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn sessions_table(sessions: &[Session]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Session", "Status", "Created", "Messages", "Last message"]);

    for session in sessions {
        let last = session
            .messages
            .last()
            .map(|m| m.content.chars().take(40).collect::<String>())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&session.id),
            Cell::new(&session.status),
            Cell::new(session.created_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(session.messages.len()),
            Cell::new(last).add_attribute(Attribute::Dim),
        ]);
    }
    table
}
