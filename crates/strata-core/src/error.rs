use std::fmt;

/// Machine-readable error codes emitted by the graph engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Committing the batch would introduce a directed cycle.
    CycleDetected,
    /// An added edge references a node id absent at the moment edges are applied.
    UnknownEndpoint,
    /// Snapshot version is unsupported.
    UnsupportedVersion,
    /// Deserialization of the snapshot JSON failed.
    InvalidSnapshot,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CycleDetected => "CYCLE_DETECTED",
            ErrorCode::UnknownEndpoint => "UNKNOWN_ENDPOINT",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::InvalidSnapshot => "INVALID_SNAPSHOT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level graph error (returned from every commit entry point).
///
/// For `CycleDetected` the machine-readable `cycle` field is authoritative:
/// an ordered list of node ids whose first and last elements coincide. The
/// `message` rendering (`"Cycle detected: a → b → … → a"`) is incidental.
#[derive(Debug, Clone)]
pub struct GraphError {
    pub code: ErrorCode,
    pub message: String,
    /// Present iff `code == CycleDetected`.
    pub cycle: Option<Vec<String>>,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for GraphError {}

impl GraphError {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), cycle: None }
    }

    /// Build a `CycleDetected` error from the ordered cycle of node ids.
    pub fn cycle(cycle: Vec<String>) -> Self {
        Self {
            code: ErrorCode::CycleDetected,
            message: format!("Cycle detected: {}", cycle.join(" → ")),
            cycle: Some(cycle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_begins_with_cycle_detected() {
        let err = GraphError::cycle(vec!["a".into(), "b".into(), "a".into()]);
        assert!(err.message.starts_with("Cycle detected"));
        assert_eq!(err.message, "Cycle detected: a → b → a");
        assert_eq!(err.cycle.as_deref(), Some(&["a".to_string(), "b".into(), "a".into()][..]));
    }

    #[test]
    fn display_includes_code() {
        let err = GraphError::new(ErrorCode::UnknownEndpoint, "missing node 'x'");
        assert_eq!(err.to_string(), "[UNKNOWN_ENDPOINT] missing node 'x'");
        assert!(err.cycle.is_none());
    }
}
