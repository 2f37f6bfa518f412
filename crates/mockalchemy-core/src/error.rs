//! Error types for mock session operations.

use std::fmt;

/// The primary error type for all mockalchemy operations.
///
/// `NoResult` and `MultipleResults` are expected, test-visible outcomes of
/// the `one`-family terminals, so callers can branch on which occurred.
#[derive(Debug)]
pub enum Error {
    /// A terminal requiring exactly one row matched none
    NoResult {
        /// Terminal that failed (`one`, `one_or_none`, ...)
        method: String,
    },
    /// A terminal allowing at most one row matched several
    MultipleResults {
        /// Terminal that failed
        method: String,
        /// Number of rows that matched
        count: usize,
    },
    /// A primary-key lookup could not be resolved
    InvalidKey(KeyError),
    /// A call assertion did not hold
    AssertionMismatch(AssertionError),
    /// Value conversion errors
    Type(TypeError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct KeyError {
    pub kind: KeyErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyErrorKind {
    /// Row carries no declared primary key (e.g. a column projection)
    NoPrimaryKey,
    /// Named key component is not a primary-key column
    UnknownColumn,
    /// Key has a different number of components than the primary key
    Arity,
}

/// A failed call assertion with both sides rendered canonically.
#[derive(Debug, Clone)]
pub struct AssertionError {
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Build a [`Error::NoResult`] for the given terminal.
    pub fn no_result(method: impl Into<String>) -> Self {
        Error::NoResult {
            method: method.into(),
        }
    }

    /// Build a [`Error::MultipleResults`] for the given terminal.
    pub fn multiple_results(method: impl Into<String>, count: usize) -> Self {
        Error::MultipleResults {
            method: method.into(),
            count,
        }
    }

    pub fn is_no_result(&self) -> bool {
        matches!(self, Error::NoResult { .. })
    }

    pub fn is_multiple_results(&self) -> bool {
        matches!(self, Error::MultipleResults { .. })
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Error::AssertionMismatch(_))
    }
}

impl KeyError {
    pub fn new(kind: KeyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl AssertionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// Attach the canonical rendering of the expected call.
    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Attach the canonical rendering of the actual call(s).
    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoResult { method } => write!(f, "No row was found for {method}()"),
            Error::MultipleResults { method, .. } => {
                write!(f, "Multiple rows were found for {method}()")
            }
            Error::InvalidKey(e) => write!(f, "Invalid key: {}", e.message),
            Error::AssertionMismatch(e) => write!(f, "{e}"),
            Error::Type(e) => write!(f, "Type error: {e}"),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for AssertionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(expected) = &self.expected {
            write!(f, "\nExpected: {expected}")?;
        }
        if let Some(actual) = &self.actual {
            write!(f, "\nActual: {actual}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl From<KeyError> for Error {
    fn from(err: KeyError) -> Self {
        Error::InvalidKey(err)
    }
}

impl From<AssertionError> for Error {
    fn from(err: AssertionError) -> Self {
        Error::AssertionMismatch(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

/// Result type alias for mockalchemy operations.
pub type Result<T> = std::result::Result<T, Error>;
