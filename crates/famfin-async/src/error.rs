use thiserror::Error;

/// Protocol violations detected by [`Outbound`](crate::Outbound).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("response start sent more than once")]
    DuplicateStart,

    #[error("response body sent after the final chunk")]
    BodyAfterComplete,
}

/// Failure reported by an application while handling one invocation.
///
/// Wraps a human-readable message. The bridge logs it and never returns
/// it to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AppError {
    message: String,
}

impl AppError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ChannelError> for AppError {
    fn from(e: ChannelError) -> Self {
        Self::new(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_from_str() {
        let err = AppError::from("store unreachable");
        assert_eq!(err.message(), "store unreachable");
        assert_eq!(format!("{err}"), "store unreachable");
    }

    #[test]
    fn app_error_from_channel_error() {
        let err = AppError::from(ChannelError::DuplicateStart);
        assert_eq!(err.message(), "response start sent more than once");
    }

    #[test]
    fn app_error_is_std_error() {
        let err = AppError::new("test");
        let _: &dyn std::error::Error = &err;
    }
}
