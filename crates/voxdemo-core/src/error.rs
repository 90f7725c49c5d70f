//! Error types for decoding input into the core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown event tag: {0}")]
    UnknownEvent(String),

    #[error("invalid payload for {tag}: {detail}")]
    InvalidPayload { tag: String, detail: String },

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("unknown agent type: {0}")]
    UnknownAgent(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::InvalidPayload {
            tag: "ADD_MESSAGE".into(),
            detail: "missing field `role`".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ADD_MESSAGE"));
        assert!(msg.contains("role"));
    }
}
