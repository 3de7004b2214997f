//! On-screen debug log.
//!
//! Webviews swallow `console.log` on most hosts, so diagnostics are also kept
//! here and rendered as a panel under the map.

#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Text(String),
    /// Pretty-printed dump of a structured value.
    Dump(String),
}

impl LogEntry {
    pub fn as_str(&self) -> &str {
        match self {
            LogEntry::Text(s) | LogEntry::Dump(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebugConsole {
    enabled: bool,
    entries: Vec<LogEntry>,
}

impl DebugConsole {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Vec::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Turning the console off hides and freezes it; existing entries stay.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Append a text line. Returns whether anything was recorded.
    pub fn log_text(&mut self, text: impl Into<String>) -> bool {
        if !self.enabled {
            return false;
        }
        let text = text.into();
        tracing::info!(target: "debug_console", "{text}");
        self.entries.push(LogEntry::Text(text));
        true
    }

    /// Append a structured dump. Returns whether anything was recorded.
    pub fn log_value(&mut self, value: &serde_json::Value) -> bool {
        if !self.enabled {
            return false;
        }
        let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        tracing::debug!(target: "debug_console", "{value}");
        self.entries.push(LogEntry::Dump(pretty));
        true
    }
}
