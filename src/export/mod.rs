//! Snapshot export.
//!
//! Writing the file is best effort: a failed write is logged and the caller
//! still gets the document back.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::analysis::{AggregateSummary, AuthSummary, SessionSummary, classify};
use crate::capture::{AuthEvent, CapturedRequest, Message, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestExport {
    pub requests: Vec<CapturedRequest>,
    pub summary: AggregateSummary,
    pub export_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthExport {
    pub events: Vec<AuthEvent>,
    pub summary: AuthSummary,
    pub export_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExport {
    pub sessions: Vec<Session>,
    pub messages: Vec<Message>,
    pub summary: SessionSummary,
    pub export_time: DateTime<Utc>,
}

pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// `<prefix>-20261019T101500123Z.<ext>`
    pub fn file_name(prefix: &str, format: ExportFormat, at: DateTime<Utc>) -> String {
        format!(
            "{}-{}.{}",
            prefix,
            at.format("%Y%m%dT%H%M%S%3fZ"),
            format.extension()
        )
    }

    /// Serialize `document` as pretty JSON into the export directory
    pub fn write_json<T: Serialize>(&self, prefix: &str, document: &T) -> Option<PathBuf> {
        let content = match serde_json::to_string_pretty(document) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to serialize {} export: {}", prefix, e);
                return None;
            }
        };
        self.write(prefix, ExportFormat::Json, &content)
    }

    pub fn write_csv(&self, prefix: &str, requests: &[CapturedRequest]) -> Option<PathBuf> {
        self.write(prefix, ExportFormat::Csv, &requests_to_csv(requests))
    }

    fn write(&self, prefix: &str, format: ExportFormat, content: &str) -> Option<PathBuf> {
        let path = self
            .dir
            .join(Self::file_name(prefix, format, Utc::now()));
        match self.try_write(&path, content) {
            Ok(()) => {
                tracing::info!("Exported {} to {}", prefix, path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Export to {} failed: {}", path.display(), e);
                None
            }
        }
    }

    fn try_write(&self, path: &Path, content: &str) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One row per request; pending fields are `N/A`
pub fn requests_to_csv(requests: &[CapturedRequest]) -> String {
    let mut csv = String::from("id,method,url,endpoint,status,duration_ms,timestamp,error\n");
    for request in requests {
        let (status, duration) = match &request.response {
            Some(response) => (response.status.to_string(), response.duration_ms.to_string()),
            None => ("N/A".to_string(), "N/A".to_string()),
        };
        let row = [
            csv_field(&request.id),
            csv_field(&request.method),
            csv_field(&request.url),
            classify(&request.url, &request.method).to_string(),
            status,
            duration,
            request.timestamp.to_rfc3339(),
            csv_field(request.error.as_deref().unwrap_or_default()),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::summarize;
    use crate::capture::Transport;
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn request(id: &str, error: Option<&str>) -> CapturedRequest {
        CapturedRequest {
            id: id.to_string(),
            url: "https://api.devin.ai/v1/session/s1/message".to_string(),
            method: "POST".to_string(),
            headers: BTreeMap::new(),
            body: None,
            timestamp: Utc::now(),
            transport: Transport::Xhr,
            response: None,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_file_name() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 5).unwrap();
        assert_eq!(
            Exporter::file_name("requests", ExportFormat::Json, at),
            "requests-20261019T083005000Z.json"
        );
    }

    #[test]
    fn test_write_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path());
        let requests = vec![request("r1", None)];
        let document = RequestExport {
            summary: summarize(&requests),
            requests,
            export_time: Utc::now(),
        };

        let path = exporter.write_json("requests", &document).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"exportTime\""));

        let parsed: RequestExport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let exporter = Exporter::new(&blocker);
        assert!(exporter.write_csv("requests", &[]).is_none());
    }

    #[test]
    fn test_csv_escaping() {
        let csv = requests_to_csv(&[request("r1", Some("bad \"gateway\", retry"))]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("r1,POST,https://api.devin.ai/v1/session/s1/message,MessageSending,N/A,N/A,"));
        assert!(lines[1].ends_with("\"bad \"\"gateway\"\", retry\""));
    }
}
