//! Vital-sign readings and lossy numeric extraction.
//!
//! Vital fields are stored exactly as typed (`"120/80"`, `"38.5 axillary"`, `"a"`). Numeric
//! interpretation happens on read: the first numeric token wins, and a field with no numeric
//! token is *absent* rather than zero.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One captured set of vital signs.
///
/// Readings are immutable once appended to a patient's history. Every value is the raw text
/// entered by the clinician and may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VitalReading {
    /// Capture time label (`HH:MM`, or the current-reading sentinel).
    pub time: String,
    /// ACVPU code.
    pub consciousness: String,
    /// Respiratory rate, breaths per minute.
    pub respiration: String,
    /// Heart rate, beats per minute.
    pub pulse: String,
    /// `systolic/diastolic`.
    pub blood_pressure: String,
    pub spo2: String,
    /// Degrees Celsius.
    pub temperature: String,
}

/// The vital fields tracked on every reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalField {
    Consciousness,
    Respiration,
    Pulse,
    BloodPressure,
    Spo2,
    Temperature,
}

impl VitalField {
    pub const ALL: [VitalField; 6] = [
        VitalField::Consciousness,
        VitalField::Respiration,
        VitalField::Pulse,
        VitalField::BloodPressure,
        VitalField::Spo2,
        VitalField::Temperature,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VitalField::Consciousness => "consciousness",
            VitalField::Respiration => "respiration",
            VitalField::Pulse => "pulse",
            VitalField::BloodPressure => "blood_pressure",
            VitalField::Spo2 => "spo2",
            VitalField::Temperature => "temperature",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "consciousness" | "acvpu" => Some(VitalField::Consciousness),
            "respiration" | "rr" => Some(VitalField::Respiration),
            "pulse" | "hr" => Some(VitalField::Pulse),
            "blood_pressure" | "bp" => Some(VitalField::BloodPressure),
            "spo2" => Some(VitalField::Spo2),
            "temperature" | "temp" => Some(VitalField::Temperature),
            _ => None,
        }
    }

    /// Short clinical abbreviation used in handover text.
    pub fn abbreviation(self) -> &'static str {
        match self {
            VitalField::Consciousness => "ACVPU",
            VitalField::Respiration => "RR",
            VitalField::Pulse => "HR",
            VitalField::BloodPressure => "BP",
            VitalField::Spo2 => "SpO2",
            VitalField::Temperature => "Temp",
        }
    }
}

impl VitalReading {
    /// Creates an empty reading stamped with `time`.
    pub fn at(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            ..Self::default()
        }
    }

    pub fn field(&self, field: VitalField) -> &str {
        match field {
            VitalField::Consciousness => &self.consciousness,
            VitalField::Respiration => &self.respiration,
            VitalField::Pulse => &self.pulse,
            VitalField::BloodPressure => &self.blood_pressure,
            VitalField::Spo2 => &self.spo2,
            VitalField::Temperature => &self.temperature,
        }
    }

    pub fn field_mut(&mut self, field: VitalField) -> &mut String {
        match field {
            VitalField::Consciousness => &mut self.consciousness,
            VitalField::Respiration => &mut self.respiration,
            VitalField::Pulse => &mut self.pulse,
            VitalField::BloodPressure => &mut self.blood_pressure,
            VitalField::Spo2 => &mut self.spo2,
            VitalField::Temperature => &mut self.temperature,
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, field: VitalField, value: impl Into<String>) -> Self {
        *self.field_mut(field) = value.into();
        self
    }

    /// True if at least one vital field is non-empty. The time label is not a vital.
    pub fn has_any_value(&self) -> bool {
        VitalField::ALL.iter().any(|f| !self.field(*f).is_empty())
    }

    /// Same values stamped with a different time label.
    pub fn stamped(&self, time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            ..self.clone()
        }
    }

    pub fn respiration_rate(&self) -> Option<f64> {
        first_number(&self.respiration)
    }

    pub fn pulse_rate(&self) -> Option<f64> {
        first_number(&self.pulse)
    }

    pub fn spo2_value(&self) -> Option<f64> {
        first_number(&self.spo2)
    }

    pub fn temperature_value(&self) -> Option<f64> {
        first_number(&self.temperature)
    }

    pub fn blood_pressure_value(&self) -> BloodPressure {
        BloodPressure::parse(&self.blood_pressure)
    }

    pub fn consciousness_level(&self) -> Option<Consciousness> {
        Consciousness::parse(&self.consciousness)
    }
}

static NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("numeric token pattern is valid"));

/// Extracts the first numeric token (integer or decimal) from free text.
///
/// Returns `None` when the text holds no digits at all.
pub fn first_number(text: &str) -> Option<f64> {
    NUMBER_REGEX
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// A blood pressure split into its two sides.
///
/// Each side is parsed independently; a missing or non-numeric side is `None` without
/// affecting the other.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BloodPressure {
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
}

impl BloodPressure {
    pub fn parse(text: &str) -> Self {
        let (systolic, diastolic) = match text.split_once('/') {
            Some((s, d)) => (s, Some(d)),
            None => (text, None),
        };
        Self {
            systolic: first_number(systolic),
            diastolic: diastolic.and_then(first_number),
        }
    }
}

/// ACVPU consciousness level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Consciousness {
    /// Alert.
    A,
    /// New confusion.
    C,
    /// Responds to voice.
    V,
    /// Responds to pain.
    P,
    /// Unresponsive.
    U,
}

impl Consciousness {
    /// Parses a single-letter ACVPU code, case-insensitively. Anything else is `None`.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Consciousness::A),
            "C" => Some(Consciousness::C),
            "V" => Some(Consciousness::V),
            "P" => Some(Consciousness::P),
            "U" => Some(Consciousness::U),
            _ => None,
        }
    }

    /// Position on the shared 0–200 chart axis.
    pub fn chart_value(self) -> f64 {
        match self {
            Consciousness::A => 100.0,
            Consciousness::C => 80.0,
            Consciousness::V => 50.0,
            Consciousness::P => 30.0,
            Consciousness::U => 0.0,
        }
    }
}

/// Most recent non-empty value of every field across `readings`.
///
/// The returned reading carries the time label of the newest reading that contributed
/// anything, or an empty label when nothing was recorded.
pub fn latest_values<'a, I>(readings: I) -> VitalReading
where
    I: IntoIterator<Item = &'a VitalReading>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut latest = VitalReading::default();

    for reading in readings.into_iter().rev() {
        if latest.time.is_empty() && reading.has_any_value() {
            latest.time = reading.time.clone();
        }
        for field in VitalField::ALL {
            let slot = latest.field_mut(field);
            if slot.is_empty() && !reading.field(field).is_empty() {
                *slot = reading.field(field).to_string();
            }
        }
    }

    latest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_number_takes_first_token() {
        assert_eq!(first_number("130"), Some(130.0));
        assert_eq!(first_number("ca 38.5 axillary"), Some(38.5));
        assert_eq!(first_number("12 then 20"), Some(12.0));
        assert_eq!(first_number("0"), Some(0.0));
    }

    #[test]
    fn test_first_number_absent() {
        assert_eq!(first_number(""), None);
        assert_eq!(first_number("weak"), None);
        assert_eq!(first_number("-"), None);
    }

    #[test]
    fn test_first_number_ignores_trailing_dot() {
        assert_eq!(first_number("37."), Some(37.0));
    }

    #[test]
    fn test_blood_pressure_both_sides() {
        let bp = BloodPressure::parse("120/80");
        assert_eq!(bp.systolic, Some(120.0));
        assert_eq!(bp.diastolic, Some(80.0));
    }

    #[test]
    fn test_blood_pressure_partial() {
        let bp = BloodPressure::parse("85");
        assert_eq!(bp.systolic, Some(85.0));
        assert_eq!(bp.diastolic, None);

        let bp = BloodPressure::parse("?/60");
        assert_eq!(bp.systolic, None);
        assert_eq!(bp.diastolic, Some(60.0));

        let bp = BloodPressure::parse("palp/");
        assert_eq!(bp, BloodPressure::default());
    }

    #[test]
    fn test_consciousness_parse() {
        assert_eq!(Consciousness::parse("a"), Some(Consciousness::A));
        assert_eq!(Consciousness::parse(" U "), Some(Consciousness::U));
        assert_eq!(Consciousness::parse("x"), None);
        assert_eq!(Consciousness::parse("alert"), None);
        assert_eq!(Consciousness::parse(""), None);
    }

    #[test]
    fn test_consciousness_chart_values() {
        assert_eq!(Consciousness::A.chart_value(), 100.0);
        assert_eq!(Consciousness::C.chart_value(), 80.0);
        assert_eq!(Consciousness::V.chart_value(), 50.0);
        assert_eq!(Consciousness::P.chart_value(), 30.0);
        assert_eq!(Consciousness::U.chart_value(), 0.0);
    }

    #[test]
    fn test_has_any_value_ignores_time() {
        assert!(!VitalReading::at("10:00").has_any_value());
        assert!(VitalReading::at("10:00")
            .with(VitalField::Spo2, "97")
            .has_any_value());
    }

    #[test]
    fn test_latest_values_prefers_newest() {
        let readings = vec![
            VitalReading::at("10:00")
                .with(VitalField::Pulse, "90")
                .with(VitalField::Temperature, "36.1"),
            VitalReading::at("10:15").with(VitalField::Pulse, "110"),
            VitalReading::at("10:30"),
        ];

        let latest = latest_values(&readings);
        assert_eq!(latest.pulse, "110");
        assert_eq!(latest.temperature, "36.1");
        assert_eq!(latest.time, "10:15");
        assert!(latest.respiration.is_empty());
    }

    #[test]
    fn test_vital_field_parse_aliases() {
        assert_eq!(VitalField::parse("bp"), Some(VitalField::BloodPressure));
        assert_eq!(VitalField::parse("spo2"), Some(VitalField::Spo2));
        assert_eq!(VitalField::parse("weight"), None);
    }

    #[test]
    fn test_reading_deserializes_camel_case_with_defaults() {
        let reading: VitalReading =
            serde_json::from_str(r#"{"time":"10:00","bloodPressure":"120/80"}"#).unwrap();
        assert_eq!(reading.blood_pressure, "120/80");
        assert!(reading.pulse.is_empty());
    }
}
