//! Controlled vocabulary of treatment actions.
//!
//! Site-specific variants of the same action (left/right, arm/leg) are distinguished by baking
//! the site into the label itself. The log matches on label text, so the vocabulary must never
//! contain one label inside another; [`ActionCatalog::validate`] enforces that.

use crate::constants::VASCULAR_ACCESS_PREFIX;
use crate::error::{EngineError, EngineResult};
use casualty_types::ActionLabel;
use serde::{Deserialize, Serialize};

/// How an action behaves in the treatment log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Binary state: applied or not.
    Toggle,
    /// Repeatable, counted per edit session.
    Dose,
}

/// Grouping used to lay out the action buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionGroup {
    Medication,
    Antibiotic,
    Tourniquet,
    Procedure,
    VascularAccess,
}

impl ActionGroup {
    pub fn title(self) -> &'static str {
        match self {
            ActionGroup::Medication => "TCCC medications",
            ActionGroup::Antibiotic => "Antibiotics",
            ActionGroup::Tourniquet => "Tourniquets",
            ActionGroup::Procedure => "Procedures",
            ActionGroup::VascularAccess => "IV/IO access",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub label: ActionLabel,
    pub kind: ActionKind,
    pub group: ActionGroup,
    /// Clinical indication shown next to the button, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
}

/// An ordered set of action labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionCatalog {
    entries: Vec<CatalogEntry>,
}

const MEDICATIONS: [&str; 6] = [
    "TXA 2g IV (not after 3h from injury)",
    "Morphine 10mg IM/IV",
    "Fentanyl lozenge 800mcg",
    "Esketamine 25mg IM",
    "Ondansetron 4mg IV",
    "Fluid 250ml",
];

const ANTIBIOTICS: [(&str, &str); 3] = [
    (
        "Cloxacillin 2g x3",
        "Open fracture, extensive soft tissue injury, amputation",
    ),
    (
        "Cefotaxime 2g x3",
        "Extremity wound >10cm, thoracic, abdominal, facial or skull injury",
    ),
    (
        "Metronidazole 1g x1",
        "Add-on for abdominal, intracranial or skull injury",
    ),
];

const TOURNIQUETS: [&str; 4] = ["TQ RA", "TQ RL", "TQ LA", "TQ LL"];

const SIDED_PROCEDURES: [&str; 3] = ["Needle decompression", "Chest seal", "Wound packing"];

const SIDES: [&str; 2] = ["R", "L"];

const ACCESS_SITES: [&str; 4] = ["R Arm", "L Arm", "R Leg", "L Leg"];

impl ActionCatalog {
    /// Builds a catalog, rejecting duplicate or nested labels.
    ///
    /// # Errors
    ///
    /// See [`ActionCatalog::validate`].
    pub fn new(entries: Vec<CatalogEntry>) -> EngineResult<Self> {
        let catalog = Self { entries };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The standard TCCC vocabulary used at the point of injury.
    ///
    /// # Errors
    ///
    /// Only if the built-in labels were edited into an invalid state.
    pub fn tccc() -> EngineResult<Self> {
        let mut entries = Vec::new();

        for med in MEDICATIONS {
            entries.push(entry(med, ActionKind::Dose, ActionGroup::Medication, None)?);
        }
        for (label, indication) in ANTIBIOTICS {
            entries.push(entry(
                label,
                ActionKind::Dose,
                ActionGroup::Antibiotic,
                Some(indication),
            )?);
        }
        for tq in TOURNIQUETS {
            entries.push(entry(tq, ActionKind::Toggle, ActionGroup::Tourniquet, None)?);
        }
        entries.push(entry(
            "Airway secured",
            ActionKind::Toggle,
            ActionGroup::Procedure,
            None,
        )?);
        for procedure in SIDED_PROCEDURES {
            for side in SIDES {
                entries.push(entry(
                    &format!("{} {}", procedure, side),
                    ActionKind::Toggle,
                    ActionGroup::Procedure,
                    None,
                )?);
            }
        }
        for site in ACCESS_SITES {
            entries.push(entry(
                &format!("{} {}", VASCULAR_ACCESS_PREFIX, site),
                ActionKind::Toggle,
                ActionGroup::VascularAccess,
                None,
            )?);
        }

        Self::new(entries)
    }

    /// Checks that no label equals or is contained in another.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateLabel`] or [`EngineError::LabelConflict`].
    pub fn validate(&self) -> EngineResult<()> {
        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                let (a, b) = (a.label.as_str(), b.label.as_str());
                if a == b {
                    return Err(EngineError::DuplicateLabel(a.to_string()));
                }
                let conflict = if b.contains(a) {
                    Some((a, b))
                } else if a.contains(b) {
                    Some((b, a))
                } else {
                    None
                };
                if let Some((shorter, longer)) = conflict {
                    tracing::warn!("action label '{}' is contained in '{}'", shorter, longer);
                    return Err(EngineError::LabelConflict {
                        shorter: shorter.to_string(),
                        longer: longer.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn group(&self, group: ActionGroup) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |e| e.group == group)
    }

    pub fn get(&self, label: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.label.as_str() == label)
    }

    /// Like [`ActionCatalog::get`] but an error for unknown labels.
    pub fn require(&self, label: &str) -> EngineResult<&CatalogEntry> {
        self.get(label)
            .ok_or_else(|| EngineError::UnknownAction(label.to_string()))
    }
}

fn entry(
    label: &str,
    kind: ActionKind,
    group: ActionGroup,
    indication: Option<&str>,
) -> EngineResult<CatalogEntry> {
    Ok(CatalogEntry {
        label: ActionLabel::new(label)?,
        kind,
        group,
        indication: indication.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tccc_catalog_is_valid() {
        let catalog = ActionCatalog::tccc().unwrap();
        assert_eq!(catalog.entries().len(), 6 + 3 + 4 + 1 + 6 + 4);
        assert_eq!(catalog.group(ActionGroup::Medication).count(), 6);
        assert_eq!(catalog.group(ActionGroup::VascularAccess).count(), 4);
    }

    #[test]
    fn test_tccc_kinds() {
        let catalog = ActionCatalog::tccc().unwrap();
        assert_eq!(catalog.require("Fluid 250ml").unwrap().kind, ActionKind::Dose);
        assert_eq!(catalog.require("TQ RA").unwrap().kind, ActionKind::Toggle);
        assert_eq!(
            catalog.require("IV/IO access L Leg").unwrap().group,
            ActionGroup::VascularAccess
        );
        assert!(catalog
            .require("Cefotaxime 2g x3")
            .unwrap()
            .indication
            .is_some());
    }

    #[test]
    fn test_unknown_action() {
        let catalog = ActionCatalog::tccc().unwrap();
        assert!(matches!(
            catalog.require("TQ neck"),
            Err(EngineError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_nested_labels_are_rejected() {
        let entries = vec![
            entry("Chest seal", ActionKind::Toggle, ActionGroup::Procedure, None).unwrap(),
            entry("Chest seal R", ActionKind::Toggle, ActionGroup::Procedure, None).unwrap(),
        ];
        match ActionCatalog::new(entries) {
            Err(EngineError::LabelConflict { shorter, longer }) => {
                assert_eq!(shorter, "Chest seal");
                assert_eq!(longer, "Chest seal R");
            }
            other => panic!("expected LabelConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_labels_are_rejected() {
        let entries = vec![
            entry("TQ RA", ActionKind::Toggle, ActionGroup::Tourniquet, None).unwrap(),
            entry("TQ RA", ActionKind::Toggle, ActionGroup::Tourniquet, None).unwrap(),
        ];
        assert!(matches!(
            ActionCatalog::new(entries),
            Err(EngineError::DuplicateLabel(_))
        ));
    }
}
