use std::fmt;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    Status(u16, String),
    Envelope(String),
    Other(String),
}

impl Error {
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Status(_, body) => Some(body),
            _                      => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Error::Status(code, body) => write!(f, "status {}: {}", code, body),
            Error::Envelope(detail)   => write!(f, "malformed response: {}", detail),
            Error::Other(detail)      => write!(f, "{}", detail),
        }
    }
}
