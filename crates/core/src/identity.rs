//! Patient identity.
//!
//! Two identifiers exist per casualty:
//! - [`PatientId`]: opaque, immutable, globally unique. Canonical form is **32 lowercase
//!   hexadecimal characters** (a v4 UUID without hyphens), e.g.
//!   `550e8400e29b41d4a716446655440000`.
//! - [`PatientNumber`]: the sequential display label written on the casualty card (`P-001`).
//!   It is derived from the record count at creation time and never recomputed, so it is not
//!   guaranteed unique once records are removed and it is never reused.

use crate::constants::PATIENT_NUMBER_PREFIX;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Canonical patient identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatientId(Uuid);

impl Default for PatientId {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientId {
    /// Allocates a fresh identifier for a new patient.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates an identifier that must already be canonical.
    ///
    /// Hyphenated or uppercase forms are rejected rather than normalised, so the same patient
    /// can never appear under two spellings.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPatientId`] if `input` is not canonical.
    pub fn parse(input: &str) -> EngineResult<Self> {
        if !Self::is_canonical(input) {
            return Err(EngineError::InvalidPatientId(format!(
                "expected 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| EngineError::InvalidPatientId(e.to_string()))
    }

    /// Purely syntactic canonical-form check.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for PatientId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatientId::parse(s)
    }
}

impl Serialize for PatientId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PatientId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PatientId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Sequential display number, `P-` followed by at least three digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatientNumber(String);

impl PatientNumber {
    /// Number for a record created when `existing_records` records already exist.
    pub fn from_record_count(existing_records: usize) -> Self {
        Self(format!(
            "{}{:03}",
            PATIENT_NUMBER_PREFIX,
            existing_records.saturating_add(1)
        ))
    }

    /// Validates a stored display number.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] unless the text is `P-` followed by digits.
    pub fn parse(input: &str) -> EngineResult<Self> {
        let digits = input.strip_prefix(PATIENT_NUMBER_PREFIX).ok_or_else(|| {
            EngineError::InvalidInput(format!("patient number must start with 'P-': '{}'", input))
        })?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::InvalidInput(format!(
                "patient number must end in digits: '{}'",
                input
            )));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PatientNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PatientNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PatientNumber::parse(&s).map_err(serde::de::Error::custom)
    }
}
