use anyhow::Result;
use colored::*;

use crate::http::Response;
use crate::monitor::AnalysisReport;

pub enum ResponseFormat {
    Compact,
    Verbose,
}

pub struct ResponseFormatter {
    format: ResponseFormat,
    color: bool,
}

impl ResponseFormatter {
    pub fn new(format: ResponseFormat) -> Self {
        Self {
            format,
            color: true,
        }
    }

    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }

    fn paint_status(&self, line: String, response: &Response) -> String {
        if !self.color {
            return line;
        }
        let painted = if response.is_success() {
            line.green()
        } else if response.is_client_error() {
            line.yellow()
        } else {
            line.red()
        };
        match self.format {
            ResponseFormat::Verbose => painted.bold().to_string(),
            ResponseFormat::Compact => painted.to_string(),
        }
    }

    fn paint_heading(&self, text: &str) -> String {
        if self.color {
            text.blue().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn format(&self, response: &Response) -> Result<String> {
        let mut output = Vec::new();
        let status_line = format!("HTTP {} {}", response.status.code(), response.status_text);
        output.push(self.paint_status(status_line, response));

        let timing = format!("Time: {}ms", response.duration.as_millis());
        output.push(if self.color {
            timing.cyan().to_string()
        } else {
            timing
        });

        if let ResponseFormat::Verbose = self.format {
            output.push(String::new());
            output.push(self.paint_heading("Headers:"));
            for (key, value) in response.headers.iter() {
                let value = value.to_str().unwrap_or("<invalid utf-8>");
                output.push(format!("   {}: {}", key, value));
            }
        }

        let body = &response.body;
        match self.format {
            ResponseFormat::Compact if body.len() >= 200 => {
                output.push(format!("Body: {} bytes", body.len()));
            }
            _ if !body.is_empty() => {
                if let ResponseFormat::Verbose = self.format {
                    output.push(String::new());
                    output.push(self.paint_heading("Body:"));
                }
                output.push(self.try_format_json(body).unwrap_or_else(|_| body.to_string()));
            }
            _ => {}
        }

        Ok(output.join("\n"))
    }

    /// One block describing how the monitor saw the call
    pub fn format_analysis(&self, report: &AnalysisReport) -> String {
        let mut output = vec![self.paint_heading("Captured:")];
        output.push(format!("   id:        {}", report.request.id));
        output.push(format!("   endpoint:  {}", report.endpoint));
        output.push(format!("   transport: {}", report.request.transport.as_str()));
        match (report.timing.duration, &report.error) {
            (Some(duration), _) => output.push(format!("   duration:  {}ms", duration)),
            (None, Some(error)) => output.push(format!("   error:     {}", error)),
            (None, None) => output.push("   pending".to_string()),
        }
        output.join("\n")
    }

    fn try_format_json(&self, body: &str) -> Result<String> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        serde_json::to_string_pretty(&value).map_err(Into::into)
    }
}
