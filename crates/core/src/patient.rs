//! Patient snapshot: the data model shared by the log, chart and rule engine.
//!
//! The engine never owns storage. A storage collaborator hands it a snapshot to read, or
//! receives a complete replacement snapshot after a mutation. JSON and YAML helpers exist so
//! that collaborators (and the CLI) can exchange snapshots; field names are camelCase.

use crate::error::{EngineError, EngineResult};
use crate::identity::{PatientId, PatientNumber};
use crate::treatment_log::{MatchPolicy, TreatmentLog};
use crate::vitals::VitalReading;
use serde::{Deserialize, Serialize};

/// Triage category. P1 is the most urgent; P4 is deceased.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriageCategory {
    P1,
    P2,
    P3,
    P4,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl TriageCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Some(TriageCategory::P1),
            "P2" => Some(TriageCategory::P2),
            "P3" => Some(TriageCategory::P3),
            "P4" => Some(TriageCategory::P4),
            "" => Some(TriageCategory::Unset),
            _ => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TriageCategory::P1 => "Immediate",
            TriageCategory::P2 => "Urgent",
            TriageCategory::P3 => "Delayed",
            TriageCategory::P4 => "Deceased",
            TriageCategory::Unset => "Not triaged",
        }
    }
}

impl std::fmt::Display for TriageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriageCategory::P1 => f.write_str("P1"),
            TriageCategory::P2 => f.write_str("P2"),
            TriageCategory::P3 => f.write_str("P3"),
            TriageCategory::P4 => f.write_str("P4"),
            TriageCategory::Unset => f.write_str("-"),
        }
    }
}

/// Everything documented about one casualty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSnapshot {
    pub id: PatientId,
    pub patient_number: PatientNumber,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub time_of_injury: String,
    #[serde(default)]
    pub mechanism: String,
    /// Free-text injury description, read by the bleeding rules.
    #[serde(default)]
    pub injuries: String,
    #[serde(default)]
    pub triage_category: TriageCategory,
    /// Current vitals. The time label is not used.
    #[serde(default)]
    pub vitals: VitalReading,
    /// Treatment log text.
    #[serde(default)]
    pub treatment: String,
    /// Append-only reading history, oldest first.
    #[serde(default)]
    pub vital_history: Vec<VitalReading>,
}

impl PatientSnapshot {
    /// An empty snapshot with the given identity.
    pub fn new(id: PatientId, patient_number: PatientNumber) -> Self {
        Self {
            id,
            patient_number,
            name: String::new(),
            age: String::new(),
            unit: String::new(),
            location: String::new(),
            time_of_injury: String::new(),
            mechanism: String::new(),
            injuries: String::new(),
            triage_category: TriageCategory::Unset,
            vitals: VitalReading::default(),
            treatment: String::new(),
            vital_history: Vec::new(),
        }
    }

    /// Creates a new empty snapshot when `existing_records` records already exist.
    ///
    /// The display number is fixed here and never recomputed.
    pub fn create(existing_records: usize) -> Self {
        Self::new(
            PatientId::new(),
            PatientNumber::from_record_count(existing_records),
        )
    }

    /// The treatment log, parsed.
    pub fn treatment_log(&self, policy: MatchPolicy) -> TreatmentLog {
        TreatmentLog::parse_with(&self.treatment, policy)
    }

    /// Appends a reading to the history. Readings without any value are ignored.
    ///
    /// Returns whether the reading was appended.
    pub fn append_reading(&mut self, reading: VitalReading) -> bool {
        if !reading.has_any_value() {
            return false;
        }
        tracing::debug!(
            "patient {}: appending vital reading at '{}'",
            self.patient_number,
            reading.time
        );
        self.vital_history.push(reading);
        true
    }

    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`] naming the path of the offending field, or when
    /// anything other than whitespace follows the snapshot.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        let snapshot = serde_path_to_error::deserialize(&mut deserializer).map_err(decode_error)?;
        deserializer.end().map_err(|e| {
            EngineError::Decode(format!("Patient snapshot has trailing data: {e}"))
        })?;
        Ok(snapshot)
    }

    /// Parse a snapshot from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Decode`] naming the path of the offending field.
    pub fn from_yaml(text: &str) -> EngineResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(text);
        serde_path_to_error::deserialize(deserializer).map_err(decode_error)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(EngineError::JsonSerialization)
    }

    pub fn to_yaml(&self) -> EngineResult<String> {
        serde_yaml::to_string(self).map_err(EngineError::YamlSerialization)
    }
}

fn decode_error<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> EngineError {
    let path = err.path().to_string();
    let source = err.into_inner();
    let path = if path.is_empty() || path == "." {
        "<root>"
    } else {
        path.as_str()
    };
    EngineError::Decode(format!("Patient snapshot schema mismatch at {path}: {source}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitals::VitalField;

    #[test]
    fn test_create_assigns_number_from_count() {
        let first = PatientSnapshot::create(0);
        let third = PatientSnapshot::create(2);
        assert_eq!(first.patient_number.as_str(), "P-001");
        assert_eq!(third.patient_number.as_str(), "P-003");
        assert_ne!(first.id, third.id);
        assert_eq!(first.triage_category, TriageCategory::Unset);
    }

    #[test]
    fn test_append_reading_skips_empty() {
        let mut patient = PatientSnapshot::create(0);
        assert!(!patient.append_reading(VitalReading::at("10:00")));
        assert!(patient.append_reading(VitalReading::at("10:05").with(VitalField::Pulse, "88")));
        assert_eq!(patient.vital_history.len(), 1);
        assert_eq!(patient.vital_history[0].time, "10:05");
    }

    #[test]
    fn test_json_round_trip_uses_camel_case() {
        let mut patient = PatientSnapshot::create(0);
        patient.vitals.blood_pressure = "120/80".into();
        patient.triage_category = TriageCategory::P2;

        let json = patient.to_json().unwrap();
        assert!(json.contains("\"bloodPressure\": \"120/80\""));
        assert!(json.contains("\"patientNumber\": \"P-001\""));
        assert!(json.contains("\"triageCategory\": \"P2\""));

        assert_eq!(PatientSnapshot::from_json(&json).unwrap(), patient);
    }

    #[test]
    fn test_from_yaml_minimal() {
        let yaml = "id: 550e8400e29b41d4a716446655440000\npatientNumber: P-004\nvitals:\n  pulse: '130'\ntriageCategory: ''\n";
        let patient = PatientSnapshot::from_yaml(yaml).unwrap();
        assert_eq!(patient.vitals.pulse, "130");
        assert_eq!(patient.triage_category, TriageCategory::Unset);
        assert!(patient.vital_history.is_empty());
    }

    #[test]
    fn test_from_json_reports_field_path() {
        let json = r#"{"id":"550e8400e29b41d4a716446655440000","patientNumber":"P-001","vitalHistory":[{"pulse":5}]}"#;
        match PatientSnapshot::from_json(json) {
            Err(EngineError::Decode(msg)) => assert!(msg.contains("vitalHistory"), "{}", msg),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json_rejects_trailing_data() {
        let json = PatientSnapshot::create(0).to_json().unwrap();
        assert!(PatientSnapshot::from_json(&format!("{json}\n  ")).is_ok());
        match PatientSnapshot::from_json(&format!("{json} trailing garbage")) {
            Err(EngineError::Decode(msg)) => assert!(msg.contains("trailing data"), "{}", msg),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_triage_category_parse() {
        assert_eq!(TriageCategory::parse("p1"), Some(TriageCategory::P1));
        assert_eq!(TriageCategory::parse(""), Some(TriageCategory::Unset));
        assert_eq!(TriageCategory::parse("P5"), None);
        assert_eq!(TriageCategory::P4.description(), "Deceased");
    }
}
