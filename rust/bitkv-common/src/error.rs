use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` if the error was raised before any command reached the store
    /// because of a bad argument or a misuse of an aggregation session.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidArgument { .. } | ErrorKind::InvalidOperation { .. }
        )
    }

    pub fn configuration(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Configuration {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn unexpected_reply(context: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::UnexpectedReply {
                context: context.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn command_rejected(command: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::CommandRejected {
                command: command.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn store<E>(context: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::Store {
                context: context.into(),
                source: Box::new(source),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("unexpected reply for '{context}': {message}")]
    UnexpectedReply { context: String, message: String },

    #[error("store rejected {command}: {message}")]
    CommandRejected { command: String, message: String },

    #[error("store error for '{context}': {source}")]
    Store {
        context: String,
        source: StdErrorBoxed,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn test_error_display() {
        let e = Error::invalid_arg("keys", "at least one key is required");
        assert_eq!(
            e.to_string(),
            "invalid argument keys: at least one key is required"
        );
        assert!(e.is_caller_error());

        let e = Error::configuration("connection must return raw buffers");
        assert!(matches!(e.kind(), ErrorKind::Configuration { .. }));
        assert!(!e.is_caller_error());

        let e = Error::store(
            "exec",
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "connection lost"),
        );
        assert_eq!(e.to_string(), "store error for 'exec': connection lost");
    }

    #[test]
    fn test_into_kind() {
        let e = Error::invalid_operation("set_bit after exec");
        match e.into_kind() {
            ErrorKind::InvalidOperation { name } => assert_eq!(name, "set_bit after exec"),
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
