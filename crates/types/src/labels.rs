//! Closed label sets for entity roles and custody status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors raised when a label is not part of its closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("unknown mode label: {0:?}")]
    UnknownMode(String),
    #[error("unknown status label: {0:?}")]
    UnknownStatus(String),
}

/// Role an entity plays in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Issuer,
    Prover,
    Verifier,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Issuer, Mode::Prover, Mode::Verifier];

    /// Parse an exact, case-sensitive mode label.
    pub fn parse(label: &str) -> Result<Self, LabelError> {
        match label {
            "ISSUER" => Ok(Mode::Issuer),
            "PROVER" => Ok(Mode::Prover),
            "VERIFIER" => Ok(Mode::Verifier),
            other => Err(LabelError::UnknownMode(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Issuer => "ISSUER",
            Mode::Prover => "PROVER",
            Mode::Verifier => "VERIFIER",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::parse(s)
    }
}

/// Custody status attested by a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Manufactured,
    DeliveringInternational,
    Stored,
    DeliveringLocal,
    Delivered,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Manufactured,
        Status::DeliveringInternational,
        Status::Stored,
        Status::DeliveringLocal,
        Status::Delivered,
    ];

    /// Parse an exact, case-sensitive status label.
    pub fn parse(label: &str) -> Result<Self, LabelError> {
        match label {
            "MANUFACTURED" => Ok(Status::Manufactured),
            "DELIVERING_INTERNATIONAL" => Ok(Status::DeliveringInternational),
            "STORED" => Ok(Status::Stored),
            "DELIVERING_LOCAL" => Ok(Status::DeliveringLocal),
            "DELIVERED" => Ok(Status::Delivered),
            other => Err(LabelError::UnknownStatus(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Manufactured => "MANUFACTURED",
            Status::DeliveringInternational => "DELIVERING_INTERNATIONAL",
            Status::Stored => "STORED",
            Status::DeliveringLocal => "DELIVERING_LOCAL",
            Status::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::parse(s)
    }
}
