use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ExtractionError {
    BadSelector(String),
    MissingElement {
        field: &'static str,
        selector: &'static str,
    },
    MissingAttribute {
        field: &'static str,
        attribute: &'static str,
    },
    Malformed {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl ExtractionError {
    /// The listing field that failed to extract, when known.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ExtractionError::BadSelector(_) => None,
            ExtractionError::MissingElement { field, .. }
            | ExtractionError::MissingAttribute { field, .. }
            | ExtractionError::Malformed { field, .. } => Some(field),
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::BadSelector(msg) => write!(f, "Bad selector: {msg}"),
            ExtractionError::MissingElement { field, selector } => {
                write!(f, "Field '{field}': no element matches '{selector}'")
            }
            ExtractionError::MissingAttribute { field, attribute } => {
                write!(f, "Field '{field}': missing attribute '{attribute}'")
            }
            ExtractionError::Malformed { field, value, reason } => {
                write!(f, "Field '{field}': cannot parse '{value}': {reason}")
            }
        }
    }
}

impl Error for ExtractionError {}
