//! Console buffer for algorithm output and run diagnostics

/// What produced a console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Output,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub text: String,
    pub kind: LineKind,
}

/// Append-only log of what the algorithm printed
#[derive(Debug, Clone, Default)]
pub struct Console {
    pub lines: Vec<ConsoleLine>,
}

impl Console {
    pub fn new() -> Self {
        Console { lines: Vec::new() }
    }

    /// Append text, splitting embedded newlines into separate lines
    pub fn push(&mut self, text: &str, kind: LineKind) {
        let mut parts: Vec<&str> = text.split('\n').collect();
        // Drop the empty piece left by a trailing newline
        if parts.len() > 1 && parts.last().is_some_and(|s| s.is_empty()) {
            parts.pop();
        }
        self.lines.extend(parts.into_iter().map(|p| ConsoleLine {
            text: p.to_string(),
            kind,
        }));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_splits_lines() {
        let mut console = Console::new();
        console.push("one\ntwo\n", LineKind::Output);
        console.push("", LineKind::Info);
        assert_eq!(console.len(), 3);
        assert_eq!(console.lines[1].text, "two");
        assert_eq!(console.lines[2].text, "");
    }
}
