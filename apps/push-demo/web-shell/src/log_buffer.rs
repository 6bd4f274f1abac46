/// Collects formatted tracing output and hands back complete lines, so each
/// console entry is one event rather than one `write` call.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.push_str(&String::from_utf8_lossy(bytes));
        let mut lines = Vec::new();
        while let Some(index) = self.pending.find('\n') {
            let line = self.pending[..index].trim_end_matches('\r').to_string();
            self.pending.drain(..=index);
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    pub(crate) fn take_remainder(&mut self) -> Option<String> {
        let remainder = std::mem::take(&mut self.pending);
        let trimmed = remainder.trim_end();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Console method for a formatted line, picked from the level tag the fmt
/// layer prints at the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsoleLevel {
    Error,
    Warn,
    Log,
    Debug,
}

pub(crate) fn console_level(line: &str) -> ConsoleLevel {
    match line.split_whitespace().next() {
        Some("ERROR") => ConsoleLevel::Error,
        Some("WARN") => ConsoleLevel::Warn,
        Some("DEBUG" | "TRACE") => ConsoleLevel::Debug,
        _ => ConsoleLevel::Log,
    }
}
