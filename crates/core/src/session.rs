//! Edit session for one patient.
//!
//! A session is opened when a clinician starts editing a record and closed by [`EditSession::commit`],
//! which hands the storage collaborator a complete replacement snapshot. The treatment log as it
//! was when the session began is kept as the baseline so dose buttons count only what was given
//! during this session.

use crate::catalog::{ActionKind, CatalogEntry};
use crate::chart::VitalChart;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::patient::PatientSnapshot;
use crate::rules::{self, Recommendations};
use crate::time::{normalize_checked, resolve_time, NormalizedTime};
use crate::treatment_log::{LogChange, TreatmentLog};
use crate::vitals::{VitalField, VitalReading};
use casualty_types::ActionLabel;

#[derive(Clone, Debug)]
pub struct EditSession {
    snapshot: PatientSnapshot,
    baseline_log: TreatmentLog,
    log: TreatmentLog,
    pending: VitalReading,
    vitals_time: NormalizedTime,
    treatment_time: NormalizedTime,
    config: EngineConfig,
}

fn empty_time() -> NormalizedTime {
    normalize_checked("")
}

impl EditSession {
    /// Opens a session on an existing record. The pending reading starts empty.
    pub fn begin(snapshot: PatientSnapshot, config: EngineConfig) -> Self {
        let baseline_log = snapshot.treatment_log(config.match_policy());
        tracing::debug!(
            "editing patient {} ({} log entries)",
            snapshot.patient_number,
            baseline_log.len()
        );
        Self {
            log: baseline_log.clone(),
            baseline_log,
            snapshot,
            pending: VitalReading::default(),
            vitals_time: empty_time(),
            treatment_time: empty_time(),
            config,
        }
    }

    /// Opens a session on a record that does not exist yet.
    pub fn begin_new(existing_records: usize, config: EngineConfig) -> Self {
        Self::begin(PatientSnapshot::create(existing_records), config)
    }

    pub fn snapshot(&self) -> &PatientSnapshot {
        &self.snapshot
    }

    /// Demographic and injury fields. The treatment text and the current vitals are rebuilt
    /// from the session on commit, so edits to those fields here are discarded.
    pub fn snapshot_mut(&mut self) -> &mut PatientSnapshot {
        &mut self.snapshot
    }

    pub fn log(&self) -> &TreatmentLog {
        &self.log
    }

    pub fn baseline_log(&self) -> &TreatmentLog {
        &self.baseline_log
    }

    pub fn pending(&self) -> &VitalReading {
        &self.pending
    }

    /// Replaces the working log with free text typed by the clinician.
    pub fn set_treatment_text(&mut self, text: &str) {
        self.log = TreatmentLog::parse_with(text, self.config.match_policy());
    }

    pub fn set_vital(&mut self, field: VitalField, value: impl Into<String>) {
        *self.pending.field_mut(field) = value.into();
    }

    /// Sets the custom time used to stamp the pending reading.
    pub fn set_vitals_time(&mut self, raw: &str) -> &NormalizedTime {
        self.vitals_time = normalize_checked(raw);
        &self.vitals_time
    }

    /// Sets the custom time used to stamp treatment entries.
    pub fn set_treatment_time(&mut self, raw: &str) -> &NormalizedTime {
        self.treatment_time = normalize_checked(raw);
        &self.treatment_time
    }

    pub fn vitals_time(&self) -> &NormalizedTime {
        &self.vitals_time
    }

    pub fn treatment_time(&self) -> &NormalizedTime {
        &self.treatment_time
    }

    fn entry_time(&self, clock: &dyn Clock) -> String {
        resolve_time(&self.treatment_time.text, clock)
    }

    /// Applies or removes a binary action.
    pub fn toggle_action(&mut self, label: &ActionLabel, clock: &dyn Clock) -> LogChange {
        let time = self.entry_time(clock);
        self.log.toggle(label, &time)
    }

    /// Dose button: undoes this session's latest dose if there is one, else records a dose.
    pub fn step_dose(&mut self, label: &ActionLabel, clock: &dyn Clock) -> LogChange {
        let time = self.entry_time(clock);
        self.log.step_dose(label, &self.baseline_log, &time)
    }

    /// Presses the button for a catalog action.
    pub fn apply(&mut self, entry: &CatalogEntry, clock: &dyn Clock) -> LogChange {
        match entry.kind {
            ActionKind::Toggle => self.toggle_action(&entry.label, clock),
            ActionKind::Dose => self.step_dose(&entry.label, clock),
        }
    }

    pub fn is_applied(&self, label: &str) -> bool {
        self.log.is_applied(label)
    }

    /// Doses of `label` recorded since the session began.
    pub fn session_doses(&self, label: &str) -> usize {
        self.log.session_count(label, &self.baseline_log)
    }

    /// Vitals the rule engine should read: the pending reading once it holds anything,
    /// otherwise the stored current vitals.
    pub fn effective_vitals(&self) -> &VitalReading {
        if self.pending.has_any_value() {
            &self.pending
        } else {
            &self.snapshot.vitals
        }
    }

    /// Chart of the stored history plus the pending reading.
    pub fn chart(&self) -> Option<VitalChart> {
        VitalChart::project(
            &self.snapshot.vital_history,
            Some(&self.pending),
            true,
            &self.config,
        )
    }

    pub fn recommend(&self) -> Recommendations {
        rules::evaluate(&self.snapshot.injuries, self.effective_vitals())
    }

    /// Closes the session and returns the replacement snapshot.
    ///
    /// The working log becomes the treatment text. A pending reading with any value is stamped
    /// (custom vitals time, else the clock), appended to the history and becomes the current
    /// vitals; an empty pending reading leaves both untouched.
    pub fn commit(self, clock: &dyn Clock) -> PatientSnapshot {
        let mut snapshot = self.snapshot;
        snapshot.treatment = self.log.render();

        if self.pending.has_any_value() {
            let reading = self
                .pending
                .stamped(resolve_time(&self.vitals_time.text, clock));
            snapshot.vitals = reading.clone();
            snapshot.append_reading(reading);
        }

        tracing::info!(
            "committed patient {} ({} readings)",
            snapshot.patient_number,
            snapshot.vital_history.len()
        );
        snapshot
    }
}
