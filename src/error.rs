use std::fmt;

use thiserror::Error;

/// Coarse classification of a relay failure, as exposed on the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Parse,
    Upstream,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Parse => "parse",
            ErrorKind::Upstream => "upstream",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid RPC response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{message}")]
    Upstream { code: Option<i64>, message: String },

    #[error("RPC response carries neither result nor error")]
    Malformed,
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Transport(_) | RelayError::Status(_) => ErrorKind::Transport,
            RelayError::Parse(_) | RelayError::Malformed => ErrorKind::Parse,
            RelayError::Upstream { .. } => ErrorKind::Upstream,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid listen address {0}")]
    InvalidAddr(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_displays_bare_message() {
        let err = RelayError::Upstream {
            code: Some(-32004),
            message: "Block not available for slot 12".to_string(),
        };
        assert_eq!(err.to_string(), "Block not available for slot 12");
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[test]
    fn status_and_malformed_kinds() {
        let err = RelayError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_transport());
        assert_eq!(RelayError::Malformed.kind(), ErrorKind::Parse);
        assert_eq!(ErrorKind::Parse.to_string(), "parse");
    }
}
