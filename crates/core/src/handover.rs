//! AT-MIST handover summary.

use crate::patient::{PatientSnapshot, TriageCategory};
use crate::vitals::{latest_values, VitalField, VitalReading};
use serde::Serialize;
use std::fmt;

/// Age, Time, Mechanism, Injuries, Signs, Treatment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtMist {
    pub patient_number: String,
    pub unit: String,
    pub name: String,
    pub triage_category: TriageCategory,
    pub age: String,
    pub time_of_injury: String,
    pub mechanism: String,
    pub injuries: String,
    /// Newest recorded value of every vital, across the history and the pending reading.
    pub signs: VitalReading,
    pub treatment: String,
}

impl AtMist {
    pub fn from_snapshot(snapshot: &PatientSnapshot, pending: Option<&VitalReading>) -> Self {
        let readings: Vec<&VitalReading> = snapshot
            .vital_history
            .iter()
            .chain(pending.filter(|p| p.has_any_value()))
            .collect();

        Self {
            patient_number: snapshot.patient_number.to_string(),
            unit: snapshot.unit.clone(),
            name: snapshot.name.clone(),
            triage_category: snapshot.triage_category,
            age: snapshot.age.clone(),
            time_of_injury: snapshot.time_of_injury.clone(),
            mechanism: snapshot.mechanism.clone(),
            injuries: snapshot.injuries.clone(),
            signs: latest_values(readings),
            treatment: snapshot.treatment.clone(),
        }
    }

    pub fn has_signs(&self) -> bool {
        self.signs.has_any_value()
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

impl fmt::Display for AtMist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Patient number: {}", self.patient_number)?;
        writeln!(f, "Unit: {}", or_dash(&self.unit))?;
        writeln!(f, "Name: {}", or_dash(&self.name))?;
        match self.triage_category {
            TriageCategory::Unset => writeln!(f, "Triage: -")?,
            category => writeln!(f, "Triage: {} ({})", category, category.description())?,
        }
        writeln!(f)?;
        writeln!(f, "A - Age: {}", or_dash(&self.age))?;
        writeln!(f, "T - Time of injury: {}", or_dash(&self.time_of_injury))?;
        writeln!(f, "M - Mechanism: {}", or_dash(&self.mechanism))?;
        writeln!(f, "I - Injuries: {}", or_dash(&self.injuries))?;

        if self.has_signs() {
            writeln!(f, "S - Signs (latest values):")?;
            for field in VitalField::ALL {
                let value = self.signs.field(field);
                if !value.is_empty() {
                    writeln!(f, "    {}: {}", field.abbreviation(), value)?;
                }
            }
        } else {
            writeln!(f, "S - Signs: no vital signs recorded")?;
        }

        if self.treatment.is_empty() {
            writeln!(f, "T - Treatment: -")
        } else {
            writeln!(f, "T - Treatment:")?;
            for line in self.treatment.split('\n') {
                writeln!(f, "    {}", line)?;
            }
            Ok(())
        }
    }
}
