//! Constants used throughout the casualty core crate.
//!
//! Chart geometry defaults mirror the journal view of the field application so that
//! coordinates produced here can be drawn without rescaling.

/// Time label of the synthetic reading built from unsaved form values.
pub const CURRENT_READING_LABEL: &str = "CURRENT";

/// Padding around the plot area, in pixels.
pub const CHART_PADDING: f64 = 40.0;

/// Horizontal distance between consecutive readings, in pixels.
pub const CHART_POINT_SPACING: f64 = 25.0;

/// Total chart height, in pixels.
pub const CHART_HEIGHT: f64 = 400.0;

/// Minimum total chart width, in pixels.
pub const CHART_MIN_WIDTH: f64 = 400.0;

/// Lower bound of the shared value axis.
pub const CHART_VALUE_MIN: f64 = 0.0;

/// Upper bound of the shared value axis.
pub const CHART_VALUE_MAX: f64 = 200.0;

/// Up to this many readings every axis tick carries a time label.
pub const CHART_LABEL_EVERY_INDEX_MAX: usize = 5;

/// Distance between horizontal gridlines, in value units.
pub const CHART_GRID_STEP: f64 = 10.0;

/// Gridlines at multiples of this value are drawn as major lines with a label.
pub const CHART_GRID_MAJOR_STEP: f64 = 50.0;

/// Prefix of the sequential patient display number.
pub const PATIENT_NUMBER_PREFIX: &str = "P-";

/// Text shown instead of recommendations when there is nothing to evaluate.
pub const NO_DATA_PLACEHOLDER: &str =
    "Record injuries and vital signs to receive recommendations according to the TCCC protocol";

/// Label prefix used for vascular access entries in the treatment log.
pub const VASCULAR_ACCESS_PREFIX: &str = "IV/IO access";
