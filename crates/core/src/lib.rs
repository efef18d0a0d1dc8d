//! # Casualty Core
//!
//! Clinical event and decision engine for point-of-injury casualty documentation.
//!
//! This crate is pure and synchronous:
//! - [`time`]: keypad time normalization (`0130` → `01:30`)
//! - [`treatment_log`]: the textual treatment ledger with toggle, LIFO undo and per-session
//!   dose counting
//! - [`chart`]: projection of vital readings onto a shared chart axis
//! - [`rules`]: the ordered TCCC recommendation table
//! - [`session`]: an explicit edit session tying the above together
//!
//! **No storage concerns**: loading, saving and listing snapshots belong to the caller. The engine
//! receives a [`PatientSnapshot`] to read and hands back a complete replacement.

pub mod catalog;
pub mod chart;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod handover;
pub mod identity;
pub mod patient;
pub mod rules;
pub mod session;
pub mod time;
pub mod treatment_log;
pub mod vitals;

pub use catalog::{ActionCatalog, ActionGroup, ActionKind, CatalogEntry};
pub use chart::{ChartParameter, ChartPoint, VitalChart};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ChartGeometry, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use handover::AtMist;
pub use identity::{PatientId, PatientNumber};
pub use patient::{PatientSnapshot, TriageCategory};
pub use rules::{recommend, LineKind, Recommendations, RuleId};
pub use session::EditSession;
pub use treatment_log::{LogChange, MatchPolicy, TreatmentLog};
pub use vitals::{VitalField, VitalReading};

pub use casualty_types::{ActionLabel, NonEmptyText, TextError};
