use thiserror::Error;
use tradepie_core::{CoreError, TransportError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid configuration: {0}")]
    Config(ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Timestamp(#[from] time::error::Format),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Command(_) => 2,
            Self::Transport(_) => 3,
            Self::Core(CoreError::Validation(_)) => 2,
            Self::Core(CoreError::Serialization(_)) => 4,
            Self::Core(CoreError::Io(_)) => 10,
            Self::Serialization(_) => 4,
            Self::Timestamp(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_exit_with_three() {
        let error = CliError::from(TransportError::status(502));
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn config_and_validation_share_exit_code() {
        let config = CliError::Config(ValidationError::ZeroPeriod {
            field: "high_frequency",
        });
        let validation = CliError::from(ValidationError::EmptySymbol);
        assert_eq!(config.exit_code(), 2);
        assert_eq!(validation.exit_code(), 2);
    }
}
