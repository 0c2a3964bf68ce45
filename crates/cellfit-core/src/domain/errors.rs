use std::fmt::{Display, Formatter};

pub type CellfitResult<T> = Result<T, CellfitError>;
pub type DecodeResult<T> = CellfitResult<T>;
pub type DecorResult<T> = CellfitResult<T>;

/// Failure class; decides the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorCategory {
    InputValidation,
    IoSystem,
    Decoration,
    Internal,
}

impl ErrorCategory {
    const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidation => 2,
            Self::IoSystem => 3,
            Self::Decoration => 4,
            Self::Internal => 5,
        }
    }
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InputValidation => "InputValidationError",
            Self::IoSystem => "IoSystemError",
            Self::Decoration => "DecorationError",
            Self::Internal => "InternalError",
        })
    }
}

/// Error shared by decoding, decoration and pipeline I/O.
///
/// `placeholder` is a stable dotted identifier (`INPUT.MALFORMED_RECORD`,
/// `DECOR.UNKNOWN_MECHANISM`, ...) that callers and tests match on instead of
/// the free-form message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{category} [{placeholder}] {message}")]
pub struct CellfitError {
    category: ErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl CellfitError {
    fn new(category: ErrorCategory, placeholder: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InputValidation, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::IoSystem, placeholder, message)
    }

    pub fn decoration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Decoration, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, placeholder, message)
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}
