//! Treatment log: the append-only textual ledger of actions and doses.
//!
//! The log text is the single source of truth. It is what clinicians read, edit by hand and
//! hand over. Each line is either a free note or a tagged entry:
//!
//! ```text
//! Patient found prone, extracted under fire
//! TQ RA [14:02]
//! TXA 2g IV (not after 3h from injury) [14:10]
//! ```
//!
//! [`TreatmentLog`] parses that text into ordered [`LogEntry`] values, keeps every raw line so
//! rendering an untouched log reproduces the input byte for byte, and re-serializes after each
//! mutation. Whether an action is "applied", and how many doses were given, is always derived
//! by re-scanning the entries; there is no separate event store.
//!
//! Two action shapes exist:
//! - toggle actions ([`TreatmentLog::toggle`]): applied iff a matching line exists;
//! - repeatable doses ([`TreatmentLog::step_dose`]): counted per edit session against the
//!   baseline log captured when the session began.
//!
//! Removal is always LIFO: only the most recently appended matching line is removed, all other
//! lines keep their order, and a removal that matches nothing is a no-op.

use crate::error::EngineError;
use casualty_types::ActionLabel;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// How an action label is matched against log lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchPolicy {
    /// A tagged entry matches when its label equals the target; a note line matches when the
    /// whole line equals the target. Labels that share a prefix never cross-trigger.
    #[default]
    Exact,
    /// Substring matching as done by the field application: a line matches when it contains
    /// the target anywhere, and doses are counted as occurrences of `<label> [HH:MM]` anywhere
    /// in the text.
    Contains,
}

impl FromStr for MatchPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(MatchPolicy::Exact),
            "contains" => Ok(MatchPolicy::Contains),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown match policy '{}' (expected 'exact' or 'contains')",
                other
            ))),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Exact => f.write_str("exact"),
            MatchPolicy::Contains => f.write_str("contains"),
        }
    }
}

/// Label and time of a tagged line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogTag {
    pub label: String,
    pub time: String,
}

impl LogTag {
    /// True when the time has the `DD:DD` shape counted as a dose timestamp.
    pub fn has_clock_time(&self) -> bool {
        let b = self.time.as_bytes();
        b.len() == 5
            && b[2] == b':'
            && [b[0], b[1], b[3], b[4]].iter().all(u8::is_ascii_digit)
    }
}

/// One line of the treatment log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    raw: String,
    tag: Option<LogTag>,
}

static TAGGED_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<label>.*\S) \[(?P<time>[^\[\]]*)\]$").expect("tagged line pattern is valid")
});

impl LogEntry {
    /// Classifies a single line of log text. Trailing whitespace (including the `\r` of a
    /// CRLF ending) is ignored for classification but kept in the raw text.
    pub fn parse(line: &str) -> Self {
        let tag = TAGGED_LINE_REGEX.captures(line.trim_end()).map(|caps| LogTag {
            label: caps["label"].to_string(),
            time: caps["time"].to_string(),
        });
        Self {
            raw: line.to_string(),
            tag,
        }
    }

    /// Builds the tagged line `"<label> [<time>]"`.
    pub fn tagged(label: &ActionLabel, time: &str) -> Self {
        Self {
            raw: format!("{} [{}]", label, time),
            tag: Some(LogTag {
                label: label.as_str().to_string(),
                time: time.to_string(),
            }),
        }
    }

    /// The line exactly as it appears in the log.
    pub fn text(&self) -> &str {
        &self.raw
    }

    pub fn tag(&self) -> Option<&LogTag> {
        self.tag.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.tag.as_ref().map(|t| t.label.as_str())
    }

    pub fn time(&self) -> Option<&str> {
        self.tag.as_ref().map(|t| t.time.as_str())
    }

    pub fn is_note(&self) -> bool {
        self.tag.is_none()
    }

    fn matches(&self, target: &str, policy: MatchPolicy) -> bool {
        match policy {
            MatchPolicy::Exact => match &self.tag {
                Some(tag) => tag.label == target,
                None => self.raw.trim_end() == target,
            },
            MatchPolicy::Contains => self.raw.contains(target),
        }
    }

    fn is_dose_of(&self, label: &str) -> bool {
        self.tag
            .as_ref()
            .is_some_and(|tag| tag.label == label && tag.has_clock_time())
    }
}

/// Outcome of a toggle or dose step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogChange {
    /// This line was appended.
    Appended(String),
    /// This line was removed.
    Removed(String),
    Unchanged,
}

/// Parsed treatment log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreatmentLog {
    entries: Vec<LogEntry>,
    policy: MatchPolicy,
}

impl TreatmentLog {
    /// Parses log text using [`MatchPolicy::Exact`].
    pub fn parse(text: &str) -> Self {
        Self::parse_with(text, MatchPolicy::default())
    }

    /// Parses log text with an explicit match policy.
    ///
    /// Empty text is a log with no lines. Otherwise every `\n`-separated line becomes an entry,
    /// including blank ones, so rendering reproduces the input.
    pub fn parse_with(text: &str, policy: MatchPolicy) -> Self {
        let entries = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(LogEntry::parse).collect()
        };
        Self { entries, policy }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Tagged entries only, in log order.
    pub fn tagged(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| !e.is_note())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Serializes the entries back into log text.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(LogEntry::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Appends `"<label> [<time>]"` as the newest line and returns that line.
    pub fn append(&mut self, label: &ActionLabel, time: &str) -> String {
        let entry = LogEntry::tagged(label, time);
        let line = entry.text().to_string();
        tracing::debug!("treatment log append: {}", line);
        self.entries.push(entry);
        line
    }

    /// Removes the most recently appended line matching `target`.
    ///
    /// Scans from the end, removes the first match and stops. Earlier duplicates and every
    /// other line are preserved in order. Returns the removed line, or `None` when nothing
    /// matched, in which case the log is untouched.
    pub fn remove_last(&mut self, target: &str) -> Option<String> {
        let position = self
            .entries
            .iter()
            .rposition(|e| e.matches(target, self.policy));

        match position {
            Some(index) => {
                let removed = self.entries.remove(index);
                tracing::debug!("treatment log remove: {}", removed.text());
                Some(removed.raw)
            }
            None => {
                tracing::debug!("treatment log remove: no line matches '{}'", target);
                None
            }
        }
    }

    /// Whether a toggle action is currently applied.
    pub fn is_applied(&self, label: &str) -> bool {
        self.entries.iter().any(|e| e.matches(label, self.policy))
    }

    /// Number of doses of `label` recorded anywhere in the log.
    pub fn count(&self, label: &str) -> usize {
        match self.policy {
            MatchPolicy::Exact => self.entries.iter().filter(|e| e.is_dose_of(label)).count(),
            MatchPolicy::Contains => count_occurrences(&self.render(), label),
        }
    }

    /// Doses of `label` given during the current session: the count in this log minus the
    /// count already present in `baseline`, floored at zero.
    pub fn session_count(&self, label: &str, baseline: &TreatmentLog) -> usize {
        self.count(label).saturating_sub(baseline.count(label))
    }

    /// Toggles a binary action: removes the latest matching line if the action is applied,
    /// otherwise appends a new tagged line.
    pub fn toggle(&mut self, label: &ActionLabel, time: &str) -> LogChange {
        if self.is_applied(label.as_str()) {
            self.remove_last(label.as_str())
                .map_or(LogChange::Unchanged, LogChange::Removed)
        } else {
            LogChange::Appended(self.append(label, time))
        }
    }

    /// Dose button behaviour: undoes this session's latest dose if one exists, otherwise
    /// records a new dose.
    pub fn step_dose(
        &mut self,
        label: &ActionLabel,
        baseline: &TreatmentLog,
        time: &str,
    ) -> LogChange {
        if self.session_count(label.as_str(), baseline) > 0 {
            self.undo_dose(label, baseline)
        } else {
            self.add_dose(label, time)
        }
    }

    /// Records another dose unconditionally.
    pub fn add_dose(&mut self, label: &ActionLabel, time: &str) -> LogChange {
        LogChange::Appended(self.append(label, time))
    }

    /// Removes the latest dose of `label`, but only while the session delta is positive, so
    /// doses documented before the session began are never undone from here.
    pub fn undo_dose(&mut self, label: &ActionLabel, baseline: &TreatmentLog) -> LogChange {
        if self.session_count(label.as_str(), baseline) == 0 {
            return LogChange::Unchanged;
        }
        self.remove_last(label.as_str())
            .map_or(LogChange::Unchanged, LogChange::Removed)
    }
}

impl fmt::Display for TreatmentLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Counts `<label> [DD:DD]` occurrences anywhere in `text`, with the label escaped so that
/// regex metacharacters in drug names match literally.
fn count_occurrences(text: &str, label: &str) -> usize {
    let pattern = format!(r"{} \[\d{{2}}:\d{{2}}\]", regex::escape(label));
    match Regex::new(&pattern) {
        Ok(re) => re.find_iter(text).count(),
        Err(e) => {
            tracing::warn!("cannot build dose pattern for '{}': {}", label, e);
            0
        }
    }
}

/// Appends a tagged line to raw log text.
pub fn append_entry(log: &str, label: &ActionLabel, time: &str) -> String {
    let mut parsed = TreatmentLog::parse(log);
    parsed.append(label, time);
    parsed.render()
}

/// Removes the most recent line matching `target` from raw log text. Unchanged if none does.
pub fn remove_last_matching(log: &str, target: &str, policy: MatchPolicy) -> String {
    let mut parsed = TreatmentLog::parse_with(log, policy);
    match parsed.remove_last(target) {
        Some(_) => parsed.render(),
        None => log.to_string(),
    }
}

/// Doses of `label` in `current` that were not already in `baseline`.
pub fn dose_count_since(
    label: &str,
    current: &str,
    baseline: &str,
    policy: MatchPolicy,
) -> usize {
    TreatmentLog::parse_with(current, policy)
        .session_count(label, &TreatmentLog::parse_with(baseline, policy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> ActionLabel {
        ActionLabel::new(s).unwrap()
    }

    #[test]
    fn test_parse_render_is_lossless() {
        for text in [
            "",
            "note",
            "TQ RA [14:02]\nfree text\n",
            "\n\nTXA 2g IV [10:00]\n\n",
            "weird [line\nA  [10:00]",
        ] {
            assert_eq!(TreatmentLog::parse(text).render(), text);
        }
    }

    #[test]
    fn test_parse_classifies_lines() {
        let log = TreatmentLog::parse("Found prone\nTQ RA [14:02]\nTXA 2g IV (x) [9999]");
        let entries = log.entries();
        assert!(entries[0].is_note());
        assert_eq!(entries[1].label(), Some("TQ RA"));
        assert_eq!(entries[1].time(), Some("14:02"));
        assert_eq!(entries[2].label(), Some("TXA 2g IV (x)"));
        assert!(!entries[2].tag().unwrap().has_clock_time());
        assert_eq!(log.tagged().count(), 2);
    }

    #[test]
    fn test_append_separator() {
        let mut log = TreatmentLog::parse("");
        log.append(&label("TQ RA"), "10:00");
        assert_eq!(log.render(), "TQ RA [10:00]");

        log.append(&label("TQ LA"), "10:05");
        assert_eq!(log.render(), "TQ RA [10:00]\nTQ LA [10:05]");
    }

    #[test]
    fn test_toggle_round_trip_restores_log() {
        for original in ["", "Found prone", "Found prone\n", "A [09:00]\nB [09:01]"] {
            let mut log = TreatmentLog::parse(original);
            let on = log.toggle(&label("Chest seal R"), "10:00");
            assert!(matches!(on, LogChange::Appended(_)));
            assert!(log.is_applied("Chest seal R"));

            let off = log.toggle(&label("Chest seal R"), "10:30");
            assert_eq!(off, LogChange::Removed("Chest seal R [10:00]".into()));
            assert_eq!(log.render(), original);
        }
    }

    #[test]
    fn test_trailing_whitespace_keeps_line_tagged() {
        let mut log = TreatmentLog::parse("TQ RA [10:00]\r\nnote");
        assert_eq!(log.entries()[0].label(), Some("TQ RA"));
        assert!(log.is_applied("TQ RA"));
        assert_eq!(
            log.toggle(&label("TQ RA"), "11:00"),
            LogChange::Removed("TQ RA [10:00]\r".into())
        );
        assert_eq!(log.render(), "note");

        for text in ["TQ RA [10:00] ", "TQ RA [10:00]\t"] {
            let mut log = TreatmentLog::parse(text);
            assert_eq!(log.entries()[0].time(), Some("10:00"));
            assert_eq!(log.render(), text);
            assert!(matches!(log.toggle(&label("TQ RA"), "11:00"), LogChange::Removed(_)));
            assert!(log.is_empty());
        }

        let mut log = TreatmentLog::parse("Airway secured \nB [10:00]");
        assert_eq!(log.remove_last("Airway secured"), Some("Airway secured ".into()));
    }

    #[test]
    fn test_remove_last_is_lifo() {
        let mut log = TreatmentLog::parse("A\nB\nA");
        assert_eq!(log.remove_last("A"), Some("A".into()));
        assert_eq!(log.render(), "A\nB");

        let mut log = TreatmentLog::parse("TQ RA [10:00]\nTQ LA [10:01]\nTQ RA [10:02]");
        log.remove_last("TQ RA");
        assert_eq!(log.render(), "TQ RA [10:00]\nTQ LA [10:01]");
    }

    #[test]
    fn test_remove_last_no_match_is_noop() {
        let mut log = TreatmentLog::parse("A [10:00]\nnote");
        assert_eq!(log.remove_last("B"), None);
        assert_eq!(log.render(), "A [10:00]\nnote");

        assert_eq!(
            remove_last_matching("A [10:00]", "B", MatchPolicy::Contains),
            "A [10:00]"
        );
    }

    #[test]
    fn test_exact_policy_keeps_prefixed_labels_apart() {
        let log = TreatmentLog::parse("Chest seal R [10:00]\nIV/IO access R Arm [10:01]");
        assert!(!log.is_applied("Chest seal"));
        assert!(!log.is_applied("R Arm"));
        assert!(log.is_applied("IV/IO access R Arm"));
    }

    #[test]
    fn test_contains_policy_matches_substrings() {
        let log = TreatmentLog::parse_with(
            "Chest seal R [10:00]\nIV/IO access R Arm [10:01]",
            MatchPolicy::Contains,
        );
        assert!(log.is_applied("Chest seal"));
        assert!(log.is_applied("R Arm"));

        let mut log = log;
        log.remove_last("R Arm");
        assert_eq!(log.render(), "Chest seal R [10:00]");
    }

    #[test]
    fn test_session_count_against_baseline() {
        let baseline = "Morphine 10mg IM/IV [09:00]";
        let current = format!("{}\nMorphine 10mg IM/IV [10:00]", baseline);

        for policy in [MatchPolicy::Exact, MatchPolicy::Contains] {
            assert_eq!(dose_count_since("Morphine 10mg IM/IV", &current, baseline, policy), 1);
            assert_eq!(dose_count_since("Morphine 10mg IM/IV", baseline, baseline, policy), 0);
        }
    }

    #[test]
    fn test_session_count_never_negative() {
        let baseline = "X [09:00]\nX [09:10]";
        assert_eq!(dose_count_since("X", "X [09:00]", baseline, MatchPolicy::Exact), 0);
    }

    #[test]
    fn test_count_escapes_metacharacters() {
        let text = "TXA 2g IV (not after 3h) [10:00]\nTXA 2g IV (not after 3h) [10:20]\nTXA 2g IVX [10:30]";
        for policy in [MatchPolicy::Exact, MatchPolicy::Contains] {
            let log = TreatmentLog::parse_with(text, policy);
            assert_eq!(log.count("TXA 2g IV (not after 3h)"), 2);
            assert_eq!(log.count("TXA 2g IV."), 0);
        }
    }

    #[test]
    fn test_count_requires_clock_time() {
        let log = TreatmentLog::parse("Fluid 250ml [10:00]\nFluid 250ml [9999]\nFluid 250ml");
        assert_eq!(log.count("Fluid 250ml"), 1);
    }

    #[test]
    fn test_step_dose_toggles_within_session() {
        let baseline = TreatmentLog::parse("Ondansetron 4mg IV [08:00]");
        let mut log = baseline.clone();
        let drug = label("Ondansetron 4mg IV");

        assert_eq!(log.session_count(drug.as_str(), &baseline), 0);
        let change = log.step_dose(&drug, &baseline, "09:00");
        assert_eq!(change, LogChange::Appended("Ondansetron 4mg IV [09:00]".into()));
        assert_eq!(log.session_count(drug.as_str(), &baseline), 1);
        assert_eq!(log.count(drug.as_str()), 2);

        let change = log.step_dose(&drug, &baseline, "09:05");
        assert_eq!(change, LogChange::Removed("Ondansetron 4mg IV [09:00]".into()));
        assert_eq!(log, baseline);
    }

    #[test]
    fn test_undo_dose_spares_history() {
        let baseline = TreatmentLog::parse("Fluid 250ml [08:00]");
        let mut log = baseline.clone();
        assert_eq!(
            log.undo_dose(&label("Fluid 250ml"), &baseline),
            LogChange::Unchanged
        );
        assert_eq!(log.render(), "Fluid 250ml [08:00]");

        log.add_dose(&label("Fluid 250ml"), "08:30");
        log.add_dose(&label("Fluid 250ml"), "08:45");
        assert_eq!(log.session_count("Fluid 250ml", &baseline), 2);
        log.undo_dose(&label("Fluid 250ml"), &baseline);
        assert_eq!(log.render(), "Fluid 250ml [08:00]\nFluid 250ml [08:30]");
    }

    #[test]
    fn test_append_entry_on_raw_text() {
        assert_eq!(append_entry("", &label("Airway secured"), "10:00"), "Airway secured [10:00]");
        assert_eq!(
            append_entry("note", &label("Airway secured"), "10:00"),
            "note\nAirway secured [10:00]"
        );
    }

    #[test]
    fn test_match_policy_from_str() {
        assert_eq!("Exact".parse::<MatchPolicy>().unwrap(), MatchPolicy::Exact);
        assert_eq!(" contains ".parse::<MatchPolicy>().unwrap(), MatchPolicy::Contains);
        assert!("prefix".parse::<MatchPolicy>().is_err());
    }
}
