use std::fmt::{Debug, Display};
use std::time::Duration;

pub struct Error {
    kind: ErrorKind,
    category: Category,
    context: Vec<String>,
}

pub enum ErrorKind {
    Io(std::io::Error),
    WebDriverSession(fantoccini::error::NewSessionError),
    WebDriverCmd(fantoccini::error::CmdError),
    PrintConfiguration(fantoccini::error::PrintConfigurationError),
    Json(serde_json::Error),
    Timeout(Duration),
    Other(String),
}

/// Failure classes surfaced to the transport boundary. Every rendering
/// pipeline stage pins its own category so a failed request can be reported
/// as exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    EngineLaunch,
    Navigation,
    Injection,
    Capture,
    Validation,
    Internal,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::EngineLaunch => "EngineLaunchError",
            Category::Navigation => "NavigationError",
            Category::Injection => "InjectionError",
            Category::Capture => "CaptureError",
            Category::Validation => "ValidationError",
            Category::Internal => "InternalError",
        }
    }
}

pub trait AddContext<T> {
    fn add_context(self, ctx: &str) -> Result<T, Error>;
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut context = self.context.clone();
        context.reverse();
        let context = if context.is_empty() {
            String::from("no context")
        } else {
            context.join(" -> ")
        };
        write!(f, "{context}")
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            category: Category::Internal,
            kind: ErrorKind::Io(value),
        }
    }
}

impl From<fantoccini::error::NewSessionError> for Error {
    fn from(value: fantoccini::error::NewSessionError) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            category: Category::EngineLaunch,
            kind: ErrorKind::WebDriverSession(value),
        }
    }
}

impl From<fantoccini::error::CmdError> for Error {
    fn from(value: fantoccini::error::CmdError) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            category: Category::Internal,
            kind: ErrorKind::WebDriverCmd(value),
        }
    }
}

impl From<fantoccini::error::PrintConfigurationError> for Error {
    fn from(value: fantoccini::error::PrintConfigurationError) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            category: Category::Capture,
            kind: ErrorKind::PrintConfiguration(value),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            category: Category::Internal,
            kind: ErrorKind::Json(value),
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error {
            context: vec![value.to_string()],
            category: Category::Internal,
            kind: ErrorKind::Other(value),
        }
    }
}

impl Error {
    /// Add more context to the given error. This context will ultimately be
    /// displayed to the user and could be useful for correcting bad input or
    /// filing a help ticket.
    ///
    /// Generally a single layer of context should be added for every level
    /// that an error is surfaced. If the error is surfaced all the way to
    /// main and not handled there, then all the context will be displayed to
    /// the user in reverse order
    ///
    /// # Arguments
    /// * `context` - Any additional information that would be useful for the
    /// user to see if the error is surfaced to them
    pub fn add_context(self, context: &str) -> Error {
        let mut existing = self.context.clone();
        existing.push(context.to_string());
        Self {
            context: existing,
            ..self
        }
    }

    /// Pin the failure category for this error. Pipeline stages use this to
    /// attribute a generic engine error to the stage that was running when it
    /// was raised.
    pub fn categorize(self, category: Category) -> Error {
        Self { category, ..self }
    }

    /// The failure class this error belongs to
    pub fn category(&self) -> Category {
        self.category
    }

    /// Build an error representing a stage that ran past its time budget
    pub fn timeout(limit: Duration) -> Error {
        Error {
            context: vec![format!("stage did not complete within {limit:?}")],
            category: Category::Internal,
            kind: ErrorKind::Timeout(limit),
        }
    }

    /// Build an error for a request that is malformed or incomplete
    pub fn validation(message: &str) -> Error {
        Error {
            context: vec![message.to_string()],
            category: Category::Validation,
            kind: ErrorKind::Other(message.to_string()),
        }
    }
}

impl<T> AddContext<T> for Result<T, Error> {
    fn add_context(self, ctx: &str) -> Result<T, Error> {
        match self {
            Ok(d) => Ok(d),
            Err(e) => Err(e.add_context(ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_displayed_in_reverse_order() {
        let err = Error::from(String::from("root cause"))
            .add_context("middle")
            .add_context("outer");
        assert_eq!(format!("{err}"), "outer -> middle -> root cause");
    }

    #[test]
    fn from_impls_pick_default_categories() {
        let launch: Error = fantoccini::error::NewSessionError::NotW3C(serde_json::json!(null)).into();
        assert_eq!(launch.category(), Category::EngineLaunch);

        let other = Error::from(String::from("boom"));
        assert_eq!(other.category(), Category::Internal);
    }

    #[test]
    fn categorize_overrides_the_default() {
        let err = Error::from(String::from("page blew up")).categorize(Category::Injection);
        assert_eq!(err.category(), Category::Injection);
        assert_eq!(err.category().as_str(), "InjectionError");
    }

    #[test]
    fn validation_errors_keep_their_message() {
        let err = Error::validation("no target url");
        assert_eq!(err.category(), Category::Validation);
        assert_eq!(format!("{err}"), "no target url");
    }
}
