use std::fmt;

#[derive(Debug)]
pub struct CliError(pub String);

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CliError {}

impl From<String> for CliError {
    fn from(s: String) -> Self {
        CliError(s)
    }
}

impl From<&str> for CliError {
    fn from(s: &str) -> Self {
        CliError(s.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError(format!("JSON error: {e}"))
    }
}

impl From<reqwest::Error> for CliError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            CliError(format!("Could not reach the warden daemon: {e}"))
        } else {
            CliError(format!("HTTP error: {e}"))
        }
    }
}

impl From<url::ParseError> for CliError {
    fn from(e: url::ParseError) -> Self {
        CliError(format!("Invalid daemon URL: {e}"))
    }
}

pub type CliResult<T> = Result<T, CliError>;
