//! Structs received and sent by the `web` module, their parsing implementations and tests.

use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only media type whose body gets parsed, parameters such as `charset` are ignored.
const JSON_MEDIA_TYPE: &str = "application/json";

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable Submission
/// The body of a signup form submission, the email can be absent, of any JSON type or invalid.
#[derive(Debug, Deserialize)]
pub struct DeserSubmission {
    pub email: Option<Value>,
}

/// Validated Email
/// Non-empty local part and domain, a single `@`, a `.` in the domain and no whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEmail(String);

/// The JSON body of every response of the submission endpoint.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MessageBody {
    pub message: String,
}

// ###################################
// ->   IMPLS
// ###################################
impl DeserSubmission {
    /// Parses a raw request body. Anything that doesn't carry an `email` (no body, a body that
    /// isn't declared as JSON, invalid JSON, not an object) counts as a missing email.
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Result<Self, DataParsingError> {
        if body.is_empty() || !is_json_media_type(content_type) {
            return Err(DataParsingError::EmailMissing);
        }
        let submission: DeserSubmission =
            serde_json::from_slice(body).map_err(|_| DataParsingError::EmailMissing)?;

        Ok(submission)
    }
}

impl TryFrom<DeserSubmission> for ValidEmail {
    type Error = DataParsingError;

    /// `null`, `false`, `0` and `""` count as a missing email. Any other value is checked
    /// against the email format in its text form, so `42` or `true` are invalid emails.
    fn try_from(submission: DeserSubmission) -> Result<Self, Self::Error> {
        let email = match submission.email {
            None | Some(Value::Null) | Some(Value::Bool(false)) => {
                return Err(DataParsingError::EmailMissing)
            }
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {
                return Err(DataParsingError::EmailMissing)
            }
            Some(Value::String(email)) if email.is_empty() => {
                return Err(DataParsingError::EmailMissing)
            }
            Some(Value::String(email)) => email,
            Some(other) => other.to_string(),
        };

        ValidEmail::parse(email)
    }
}

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        // `\s` leaves out U+FEFF (byte order mark), so it is excluded on its own.
        if regex_is_match!(
            r"^[^\s\x{FEFF}@]+@[^\s\x{FEFF}@]+\.[^\s\x{FEFF}@]+$",
            value
        ) {
            Ok(ValidEmail(value.to_owned()))
        } else {
            Err(DataParsingError::EmailInvalid(value.to_owned()))
        }
    }
}

fn is_json_media_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        MessageBody {
            message: message.into(),
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("the request body is missing or the email is empty")]
    EmailMissing,
    #[error("invalid email format: {0}")]
    EmailInvalid(String),
}
