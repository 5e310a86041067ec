//! Event log rendering.

use anyhow::Result;

use eqs_events::EventRecord;

/// How events are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `#seq company Event key=value…` line per event.
    Text,
    /// One JSON object per line.
    Json,
}

impl OutputFormat {
    /// `Json` when `json` is set, `Text` otherwise.
    pub fn from_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Render `records` in `format`, one line each.
pub fn render_events(records: &[EventRecord], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    for record in records {
        match format {
            OutputFormat::Text => {
                out.push_str(&format!(
                    "#{} {} {}\n",
                    record.sequence, record.company_name, record.event
                ));
            }
            OutputFormat::Json => {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
        }
    }
    Ok(out)
}
