//! Error handling for probing operations.
//!
//! This module defines one error type covering every way a run can fail
//! before or around a probe: bad input, bad configuration, transport faults,
//! and file I/O. Failures of an individual probe are not raised to the
//! caller; they are folded into an `ERROR` check result instead.

use std::fmt;
use std::time::Duration;

/// Main error type for probing operations.
#[derive(Debug, Clone)]
pub enum ProbeError {
    /// Candidate name failed validation
    InvalidName { name: String, reason: String },

    /// Network-related errors (connection refused, DNS, TLS, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// Remote endpoint answered with an unexpected HTTP status
    HttpStatus { status: u16, message: String },

    /// Response body could not be understood
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Configuration errors (invalid settings, missing token, etc.)
    ConfigError { message: String },

    /// File I/O errors for candidate lists, proxy lists and result logs
    FileError { path: String, message: String },

    /// Remote wordlist could not be fetched
    RemoteList { url: String, message: String },

    /// Operation took longer than allowed
    Timeout {
        operation: String,
        duration: Option<Duration>,
    },

    /// The run was cancelled before this operation finished
    Cancelled,

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl ProbeError {
    /// Create a new invalid name error.
    pub fn invalid_name<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new HTTP status error.
    pub fn http_status<M: Into<String>>(status: u16, message: M) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new remote wordlist error.
    pub fn remote_list<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::RemoteList {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration: Some(duration),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error suggests the operation could succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. }
                | Self::Timeout { .. }
                | Self::HttpStatus {
                    status: 500..=599,
                    ..
                }
        )
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName { name, reason } => {
                write!(f, "Invalid name '{}': {}", name, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::HttpStatus { status, message } => {
                write!(f, "HTTP {}: {}", status, message)
            }
            Self::ParseError { message, content: _ } => {
                write!(f, "Parse error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::RemoteList { url, message } => {
                write!(f, "Failed to fetch wordlist from '{}': {}", url, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => match duration {
                Some(duration) => write!(f, "Timeout after {:?} during: {}", duration, operation),
                None => write!(f, "Timed out during: {}", operation),
            },
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ProbeError {}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: "HTTP request".to_string(),
                duration: None,
            }
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if let Some(status) = err.status() {
            Self::http_status(status.as_u16(), err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}

impl From<toml::de::Error> for ProbeError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<regex::Error> for ProbeError {
    fn from(err: regex::Error) -> Self {
        Self::Internal {
            message: format!("Regex error: {}", err),
        }
    }
}
