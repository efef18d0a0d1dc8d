//! Triage rule engine.
//!
//! Recommendations follow the TCCC treatment order. The order is data: [`RULES`] is evaluated
//! top to bottom and every rule that applies contributes one block, so bleeding guidance always
//! precedes airway, breathing, circulation and temperature guidance. The standard interventions
//! block is the last entry and always applies once there is any patient data.
//!
//! Threshold checks read the first numeric token of each field. A field without a number is
//! absent and never satisfies a threshold.

use crate::constants::NO_DATA_PLACEHOLDER;
use crate::patient::PatientSnapshot;
use crate::vitals::{Consciousness, VitalReading};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Clinical priority of a rule. Variants are declared in treatment order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Bleeding,
    Airway,
    Breathing,
    Circulation,
    Temperature,
    Standard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    LimbHaemorrhage,
    ChestInjury,
    AbdominalPelvicInjury,
    AirwayUnconscious,
    AirwayReducedConsciousness,
    RespiratoryRateExtreme,
    RespiratoryRateHigh,
    RespiratoryRateLow,
    HypovolemicShock,
    CompensatedShock,
    Bradycardia,
    SevereHypothermia,
    ModerateHypothermia,
    MildHypothermia,
    StandardInterventions,
}

/// Values the rules read, extracted once per evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Findings {
    /// Lowercased injury description.
    pub injuries: String,
    pub consciousness: Option<Consciousness>,
    pub respiration: Option<f64>,
    pub spo2: Option<f64>,
    pub pulse: Option<f64>,
    pub systolic: Option<f64>,
    pub temperature: Option<f64>,
}

impl Findings {
    pub fn new(injuries: &str, vitals: &VitalReading) -> Self {
        Self {
            injuries: injuries.to_lowercase(),
            consciousness: vitals.consciousness_level(),
            respiration: vitals.respiration_rate(),
            spo2: vitals.spo2_value(),
            pulse: vitals.pulse_rate(),
            systolic: vitals.blood_pressure_value().systolic,
            temperature: vitals.temperature_value(),
        }
    }

    fn mentions(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.injuries.contains(k))
    }

    fn mentions_limb(&self) -> bool {
        LIMB_REGEX.is_match(&self.injuries)
    }
}

fn above(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v > threshold)
}

fn below(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v < threshold)
}

// ============================================================================
// Keyword sets (English and Swedish field terms)
// ============================================================================

// Short limb words only match as whole words ("arm" must not fire on "warm" or "alarming").
static LIMB_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"extremit|limb|thigh|foot|feet|lår|\b(?:arms?|armen|legs?|hands?|handen|ben|benet|fot|foten)\b",
    )
    .expect("limb pattern is valid")
});

const BLEEDING_KEYWORDS: &[&str] = &[
    "bleed", "blood", "haemorrhag", "hemorrhag", "injur", "wound", "blöd", "skada",
];
const CHEST_KEYWORDS: &[&str] = &["thorax", "chest", "bröst"];
const OPEN_WOUND_KEYWORDS: &[&str] = &["open", "penetrat", "gunshot", "öppen", "genom"];
const ABDOMINAL_KEYWORDS: &[&str] = &["abdom", "pelvi", "stomach", "bäcken", "magskad"];
const PELVIC_KEYWORDS: &[&str] = &["pelvi", "bäcken"];

// ============================================================================
// Rule table
// ============================================================================

/// Block contents: either fixed, or chosen from the findings.
#[derive(Clone, Copy)]
pub enum Items {
    Fixed(&'static [&'static str]),
    Conditional(fn(&Findings) -> Vec<&'static str>),
}

impl Items {
    fn render(&self, findings: &Findings) -> Vec<&'static str> {
        match self {
            Items::Fixed(items) => items.to_vec(),
            Items::Conditional(f) => f(findings),
        }
    }
}

/// One predicate → block entry.
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: RuleId,
    pub priority: Priority,
    pub header: &'static str,
    pub applies: fn(&Findings) -> bool,
    pub items: Items,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}

/// The ordered rule table.
pub static RULES: &[Rule] = &[
    // Catastrophic bleeding
    Rule {
        id: RuleId::LimbHaemorrhage,
        priority: Priority::Bleeding,
        header: "EXTREMITY INJURY WITH BLEEDING:",
        applies: |f| f.mentions_limb() && f.mentions(BLEEDING_KEYWORDS),
        items: Items::Fixed(&[
            "Apply a tourniquet above the wound (2-3 cm proximal)",
            "Mark the time on the tourniquet and on the skin",
            "High tourniquet (groin/upper arm) for massive bleeding",
        ]),
    },
    Rule {
        id: RuleId::ChestInjury,
        priority: Priority::Bleeding,
        header: "CHEST INJURY:",
        applies: |f| f.mentions(CHEST_KEYWORDS),
        items: Items::Conditional(chest_items),
    },
    Rule {
        id: RuleId::AbdominalPelvicInjury,
        priority: Priority::Bleeding,
        header: "ABDOMINAL/PELVIC INJURY:",
        applies: |f| f.mentions(ABDOMINAL_KEYWORDS),
        items: Items::Conditional(abdominal_items),
    },
    // Airway
    Rule {
        id: RuleId::AirwayUnconscious,
        priority: Priority::Airway,
        header: "AIRWAY - UNCONSCIOUS PATIENT:",
        applies: |f| f.consciousness == Some(Consciousness::U),
        items: Items::Fixed(&[
            "Place in the recovery position",
            "Secure an open airway - clear any foreign material",
            "Consider a nasopharyngeal airway (NPA, 6-8mm)",
            "Intubate if trained and possible",
        ]),
    },
    Rule {
        id: RuleId::AirwayReducedConsciousness,
        priority: Priority::Airway,
        header: "AIRWAY - REDUCED CONSCIOUSNESS:",
        applies: |f| matches!(f.consciousness, Some(Consciousness::V | Consciousness::P)),
        items: Items::Fixed(&[
            "Monitor the airway continuously - risk of deterioration",
            "Have airway equipment ready (NPA, OPA, intubation kit)",
        ]),
    },
    // Breathing
    Rule {
        id: RuleId::RespiratoryRateExtreme,
        priority: Priority::Breathing,
        header: "BREATHING - EXTREMELY HIGH RESPIRATORY RATE:",
        applies: |f| above(f.respiration, 35.0),
        items: Items::Fixed(&[
            "Suspect tension pneumothorax - see chest injury above",
            "Or massive bleeding/shock - see circulation below",
        ]),
    },
    Rule {
        id: RuleId::RespiratoryRateHigh,
        priority: Priority::Breathing,
        header: "BREATHING - HIGH RESPIRATORY RATE (>30):",
        applies: |f| above(f.respiration, 30.0) && !above(f.respiration, 35.0),
        items: Items::Fixed(&[
            "May indicate tension pneumothorax or shock",
            "Tactical breathing: 4-4-4-4 (in-hold-out-hold) to calm",
        ]),
    },
    Rule {
        id: RuleId::RespiratoryRateLow,
        priority: Priority::Breathing,
        header: "BREATHING - LOW RESPIRATORY RATE (<10) - CRITICAL:",
        applies: |f| below(f.respiration, 10.0),
        items: Items::Fixed(&[
            "Manual ventilation: BVM (bag-valve-mask) 12-20 breaths/min",
            "Consider airway intervention",
        ]),
    },
    // Circulation
    Rule {
        id: RuleId::HypovolemicShock,
        priority: Priority::Circulation,
        header: "CIRCULATION - HYPOVOLEMIC SHOCK:",
        applies: hypovolemic,
        items: Items::Conditional(hypovolemic_items),
    },
    Rule {
        id: RuleId::CompensatedShock,
        priority: Priority::Circulation,
        header: "CIRCULATION - COMPENSATED SHOCK:",
        applies: |f| !hypovolemic(f) && (below(f.systolic, 100.0) || above(f.pulse, 100.0)),
        items: Items::Fixed(&[
            "One IV cannula, start fluid resuscitation",
            "Monitor the bleeding source",
        ]),
    },
    Rule {
        id: RuleId::Bradycardia,
        priority: Priority::Circulation,
        header: "CIRCULATION - BRADYCARDIA:",
        applies: |f| above(f.pulse, 0.0) && below(f.pulse, 60.0),
        items: Items::Fixed(&[
            "Risk of tension pneumothorax or cardiac arrhythmia",
            "Check for chest injury and airway",
        ]),
    },
    // Temperature
    Rule {
        id: RuleId::SevereHypothermia,
        priority: Priority::Temperature,
        header: "SEVERE HYPOTHERMIA (<32°C):",
        applies: |f| below(f.temperature, 32.0),
        items: Items::Fixed(&[
            "Slow passive rewarming - avoid afterdrop",
            "Minimal movement - risk of cardiac arrest",
            "ECMO rewarming in hospital if possible",
        ]),
    },
    Rule {
        id: RuleId::ModerateHypothermia,
        priority: Priority::Temperature,
        header: "MODERATE HYPOTHERMIA (32-35°C):",
        applies: |f| below(f.temperature, 35.0) && !below(f.temperature, 32.0),
        items: Items::Fixed(&["Active external rewarming (heating blanket, warmed fluids)"]),
    },
    Rule {
        id: RuleId::MildHypothermia,
        priority: Priority::Temperature,
        header: "MILD HYPOTHERMIA (<36°C):",
        applies: |f| below(f.temperature, 36.0) && !below(f.temperature, 35.0),
        items: Items::Fixed(&["Passive rewarming - cover and shelter from the environment"]),
    },
    // Always last
    Rule {
        id: RuleId::StandardInterventions,
        priority: Priority::Standard,
        header: "STANDARD INTERVENTIONS:",
        applies: |_| true,
        items: Items::Fixed(&[
            "Tranexamic acid (TXA): 1g IV over 10 min within 3 hours of injury",
            "Morphine: 0.1 mg/kg IV/IM or Ketamine: 1-2 mg/kg IV",
            "Combat Gauze/QuikClot for arterial bleeding",
            "Tetanus prophylaxis: Tdap or dT depending on history",
            "Consider antibiotic prophylaxis for open wounds (amoxicillin-clavulanic acid)",
        ]),
    },
];

fn hypovolemic(f: &Findings) -> bool {
    below(f.systolic, 90.0) || above(f.pulse, 120.0)
}

fn chest_items(f: &Findings) -> Vec<&'static str> {
    let mut items = Vec::new();
    if f.mentions(OPEN_WOUND_KEYWORDS) {
        items.push("OPEN CHEST: cover immediately with an occlusive dressing (3-sided)");
        items.push("Listen for sounds from the wound - they indicate an air leak");
    }
    if above(f.respiration, 30.0) || below(f.spo2, 90.0) || above(f.pulse, 120.0) {
        items.push("SUSPECTED TENSION PNEUMOTHORAX:");
        items.push("Needle decompression: 2nd ICS, mid-axillary line (14G cannula)");
        items.push("Followed by chest drain (28-32F chest tube)");
    }
    items
}

fn abdominal_items(f: &Findings) -> Vec<&'static str> {
    let mut items = Vec::new();
    if f.mentions(PELVIC_KEYWORDS) {
        items.push("Apply a pelvic binder (SAM Pelvic Sling) for stabilisation");
        items.push("Prevents further bleeding from fractured pelvic bones");
    }
    items.push("Risk of massive intra-abdominal bleeding");
    items.push("PRIORITISE EVACUATION to an operating theatre");
    items
}

fn hypovolemic_items(f: &Findings) -> Vec<&'static str> {
    let mut items = vec![
        "Two IV cannulas (18G or larger)",
        "Fluids: Normal Saline or Ringer's Lactate",
        "TCCC protocol: restrictive fluids until surgical haemostasis",
    ];
    if below(f.systolic, 70.0) {
        items.push("CRITICAL HYPOTENSION (<70): minimal fluids, PRIORITISE EVACUATION");
    }
    items
}

// ============================================================================
// Output
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecommendationBlock {
    pub rule: RuleId,
    pub priority: Priority,
    pub header: &'static str,
    pub items: Vec<&'static str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Header,
    Item,
    Blank,
}

/// A classified output line for a renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecommendationLine {
    pub kind: LineKind,
    pub text: &'static str,
}

impl RecommendationLine {
    fn new(kind: LineKind, text: &'static str) -> Self {
        Self { kind, text }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "blocks")]
pub enum Recommendations {
    /// Neither injuries nor any current vital were recorded.
    NoData,
    Blocks(Vec<RecommendationBlock>),
}

impl Recommendations {
    pub fn blocks(&self) -> &[RecommendationBlock] {
        match self {
            Recommendations::NoData => &[],
            Recommendations::Blocks(blocks) => blocks,
        }
    }

    pub fn fired(&self, rule: RuleId) -> bool {
        self.blocks().iter().any(|b| b.rule == rule)
    }

    /// Flattens the blocks into renderable lines. A blank line separates the standard
    /// interventions from the patient-specific blocks.
    pub fn lines(&self) -> Vec<RecommendationLine> {
        let blocks = match self {
            Recommendations::NoData => {
                return vec![RecommendationLine::new(LineKind::Item, NO_DATA_PLACEHOLDER)];
            }
            Recommendations::Blocks(blocks) => blocks,
        };

        let mut lines = Vec::new();
        for block in blocks {
            if block.priority == Priority::Standard {
                lines.push(RecommendationLine::new(LineKind::Blank, ""));
            }
            lines.push(RecommendationLine::new(LineKind::Header, block.header));
            lines.extend(
                block
                    .items
                    .iter()
                    .map(|item| RecommendationLine::new(LineKind::Item, item)),
            );
        }
        lines
    }
}

impl std::fmt::Display for Recommendations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in self.lines() {
            match line.kind {
                LineKind::Header => writeln!(f, "{}", line.text)?,
                LineKind::Item => writeln!(f, "  - {}", line.text)?,
                LineKind::Blank => writeln!(f)?,
            }
        }
        Ok(())
    }
}

/// Evaluates the rule table against injuries and the current vitals.
pub fn recommend(snapshot: &PatientSnapshot) -> Recommendations {
    evaluate(&snapshot.injuries, &snapshot.vitals)
}

/// Like [`recommend`], for callers that hold the inputs separately (an edit session evaluates
/// its pending reading this way).
pub fn evaluate(injuries: &str, vitals: &VitalReading) -> Recommendations {
    if injuries.trim().is_empty() && !vitals.has_any_value() {
        return Recommendations::NoData;
    }

    let findings = Findings::new(injuries, vitals);
    let blocks: Vec<RecommendationBlock> = RULES
        .iter()
        .filter(|rule| (rule.applies)(&findings))
        .map(|rule| RecommendationBlock {
            rule: rule.id,
            priority: rule.priority,
            header: rule.header,
            items: rule.items.render(&findings),
        })
        .collect();

    tracing::debug!(
        "rules fired: {:?}",
        blocks.iter().map(|b| b.rule).collect::<Vec<_>>()
    );

    Recommendations::Blocks(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitals::VitalField;

    fn vitals(fields: &[(VitalField, &str)]) -> VitalReading {
        fields
            .iter()
            .fold(VitalReading::default(), |r, (f, v)| r.with(*f, *v))
    }

    fn fired(recs: &Recommendations) -> Vec<RuleId> {
        recs.blocks().iter().map(|b| b.rule).collect()
    }

    #[test]
    fn test_rule_table_is_in_priority_order() {
        assert!(RULES.windows(2).all(|w| w[0].priority <= w[1].priority));
        assert_eq!(
            RULES.last().map(|r| r.id),
            Some(RuleId::StandardInterventions)
        );
    }

    #[test]
    fn test_empty_snapshot_gives_placeholder_only() {
        let recs = evaluate("   ", &VitalReading::default());
        assert_eq!(recs, Recommendations::NoData);
        let lines = recs.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, NO_DATA_PLACEHOLDER);
        assert!(!recs.fired(RuleId::StandardInterventions));
    }

    #[test]
    fn test_high_respiration_without_injuries() {
        let recs = evaluate("", &vitals(&[(VitalField::Respiration, "40")]));
        assert_eq!(
            fired(&recs),
            vec![
                RuleId::RespiratoryRateExtreme,
                RuleId::StandardInterventions
            ]
        );
        assert!(recs.lines()[0]
            .text
            .starts_with("BREATHING - EXTREMELY HIGH"));
    }

    #[test]
    fn test_bleeding_precedes_breathing() {
        let recs = evaluate(
            "extremity bleeding",
            &vitals(&[(VitalField::Respiration, "40")]),
        );
        assert_eq!(
            fired(&recs),
            vec![
                RuleId::LimbHaemorrhage,
                RuleId::RespiratoryRateExtreme,
                RuleId::StandardInterventions
            ]
        );
    }

    #[test]
    fn test_swedish_injury_keywords() {
        let recs = evaluate("Blödning höger ben, öppen bröstkorg", &VitalReading::default());
        assert!(recs.fired(RuleId::LimbHaemorrhage));
        assert!(recs.fired(RuleId::ChestInjury));
        let chest = &recs.blocks()[1];
        assert!(chest.items[0].starts_with("OPEN CHEST"));
        assert!(!chest.items.contains(&"SUSPECTED TENSION PNEUMOTHORAX:"));
    }

    #[test]
    fn test_limb_words_need_word_boundaries() {
        for injuries in [
            "chest wound, skin warm",
            "scalp wound, alarming bleeding",
            "head injury, patient legible",
            "shrapnel wound to the benign mass",
        ] {
            let recs = evaluate(injuries, &VitalReading::default());
            assert!(!recs.fired(RuleId::LimbHaemorrhage), "{}", injuries);
        }
        for injuries in [
            "GSW left arm, bleeding",
            "both legs bleeding",
            "blödning i armen",
            "amputated foot, wound",
        ] {
            let recs = evaluate(injuries, &VitalReading::default());
            assert!(recs.fired(RuleId::LimbHaemorrhage), "{}", injuries);
        }
    }

    #[test]
    fn test_chest_tension_pneumothorax_gate() {
        let recs = evaluate("chest trauma", &vitals(&[(VitalField::Spo2, "85")]));
        let chest = &recs.blocks()[0];
        assert_eq!(chest.rule, RuleId::ChestInjury);
        assert_eq!(chest.items[0], "SUSPECTED TENSION PNEUMOTHORAX:");
    }

    #[test]
    fn test_pelvic_binder_nested_in_abdominal_block() {
        let recs = evaluate("pelvic fracture", &VitalReading::default());
        let block = &recs.blocks()[0];
        assert_eq!(block.rule, RuleId::AbdominalPelvicInjury);
        assert_eq!(block.items.len(), 4);

        let recs = evaluate("abdominal wound", &VitalReading::default());
        assert_eq!(recs.blocks()[0].items.len(), 2);
    }

    #[test]
    fn test_airway_gates() {
        let u = evaluate("", &vitals(&[(VitalField::Consciousness, "u")]));
        assert!(u.fired(RuleId::AirwayUnconscious));
        let p = evaluate("", &vitals(&[(VitalField::Consciousness, "P")]));
        assert!(p.fired(RuleId::AirwayReducedConsciousness));
        let a = evaluate("", &vitals(&[(VitalField::Consciousness, "A")]));
        assert_eq!(fired(&a), vec![RuleId::StandardInterventions]);
    }

    #[test]
    fn test_breathing_bands_are_exclusive() {
        let high = evaluate("", &vitals(&[(VitalField::Respiration, "32")]));
        assert_eq!(
            fired(&high),
            vec![RuleId::RespiratoryRateHigh, RuleId::StandardInterventions]
        );
        let low = evaluate("", &vitals(&[(VitalField::Respiration, "8")]));
        assert!(low.fired(RuleId::RespiratoryRateLow));
        let normal = evaluate("", &vitals(&[(VitalField::Respiration, "16")]));
        assert_eq!(fired(&normal), vec![RuleId::StandardInterventions]);
    }

    #[test]
    fn test_hypovolemic_without_bradycardia() {
        let recs = evaluate(
            "",
            &vitals(&[(VitalField::Pulse, "130"), (VitalField::BloodPressure, "85/50")]),
        );
        assert!(recs.fired(RuleId::HypovolemicShock));
        assert!(!recs.fired(RuleId::CompensatedShock));
        assert!(!recs.fired(RuleId::Bradycardia));
    }

    #[test]
    fn test_critical_hypotension_sub_case() {
        let recs = evaluate("", &vitals(&[(VitalField::BloodPressure, "65/40")]));
        let block = &recs.blocks()[0];
        assert_eq!(block.rule, RuleId::HypovolemicShock);
        assert!(block.items.last().unwrap().starts_with("CRITICAL HYPOTENSION"));
    }

    #[test]
    fn test_compensated_shock_and_bradycardia_together() {
        let recs = evaluate(
            "",
            &vitals(&[(VitalField::Pulse, "55"), (VitalField::BloodPressure, "95/60")]),
        );
        assert_eq!(
            fired(&recs),
            vec![
                RuleId::CompensatedShock,
                RuleId::Bradycardia,
                RuleId::StandardInterventions
            ]
        );
    }

    #[test]
    fn test_absent_values_skip_circulation() {
        let recs = evaluate("", &vitals(&[(VitalField::BloodPressure, "unknown")]));
        assert_eq!(fired(&recs), vec![RuleId::StandardInterventions]);
    }

    #[test]
    fn test_hypothermia_bands() {
        for (temp, rule) in [
            ("31.5", RuleId::SevereHypothermia),
            ("33", RuleId::ModerateHypothermia),
            ("35.5", RuleId::MildHypothermia),
        ] {
            let recs = evaluate("", &vitals(&[(VitalField::Temperature, temp)]));
            assert_eq!(fired(&recs), vec![rule, RuleId::StandardInterventions]);
        }
        let normal = evaluate("", &vitals(&[(VitalField::Temperature, "37")]));
        assert_eq!(fired(&normal), vec![RuleId::StandardInterventions]);
    }

    #[test]
    fn test_lines_separate_standard_block() {
        let recs = evaluate("", &vitals(&[(VitalField::Respiration, "8")]));
        let lines = recs.lines();
        let blank = lines
            .iter()
            .position(|l| l.kind == LineKind::Blank)
            .unwrap();
        assert_eq!(lines[blank + 1].text, "STANDARD INTERVENTIONS:");
        assert_eq!(lines[blank + 1].kind, LineKind::Header);
        assert_eq!(lines.len(), 1 + 2 + 1 + 1 + 5);
    }
}
