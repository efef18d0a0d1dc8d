//! Engine runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the engine explicitly.
//! Nothing in the engine reads environment variables while handling a patient.

use crate::constants::{
    CHART_HEIGHT, CHART_LABEL_EVERY_INDEX_MAX, CHART_MIN_WIDTH, CHART_PADDING,
    CHART_POINT_SPACING, CHART_VALUE_MAX, CHART_VALUE_MIN, CURRENT_READING_LABEL,
};
use crate::error::{EngineError, EngineResult};
use crate::treatment_log::MatchPolicy;

/// Chart geometry, in pixels and value units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartGeometry {
    pub padding: f64,
    pub point_spacing: f64,
    pub height: f64,
    pub min_width: f64,
    pub value_min: f64,
    pub value_max: f64,
    /// Up to this many readings, every axis tick is labelled; above it only even indices are.
    pub label_every_index_max: usize,
}

impl Default for ChartGeometry {
    fn default() -> Self {
        Self {
            padding: CHART_PADDING,
            point_spacing: CHART_POINT_SPACING,
            height: CHART_HEIGHT,
            min_width: CHART_MIN_WIDTH,
            value_min: CHART_VALUE_MIN,
            value_max: CHART_VALUE_MAX,
            label_every_index_max: CHART_LABEL_EVERY_INDEX_MAX,
        }
    }
}

impl ChartGeometry {
    /// Height of the drawable area between top and bottom padding.
    pub fn plot_height(&self) -> f64 {
        self.height - self.padding * 2.0
    }

    fn validate(&self) -> EngineResult<()> {
        let finite = [
            self.padding,
            self.point_spacing,
            self.height,
            self.min_width,
            self.value_min,
            self.value_max,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(EngineError::InvalidConfig(
                "chart geometry must be finite".into(),
            ));
        }
        if self.padding < 0.0 {
            return Err(EngineError::InvalidConfig(
                "chart padding cannot be negative".into(),
            ));
        }
        if self.point_spacing <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "chart point spacing must be positive".into(),
            ));
        }
        if self.plot_height() <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "chart height must exceed twice the padding".into(),
            ));
        }
        if self.value_max <= self.value_min {
            return Err(EngineError::InvalidConfig(
                "chart value domain must be non-empty (max > min)".into(),
            ));
        }
        Ok(())
    }
}

/// Engine configuration resolved at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    chart: ChartGeometry,
    current_reading_label: String,
    match_policy: MatchPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chart: ChartGeometry::default(),
            current_reading_label: CURRENT_READING_LABEL.to_string(),
            match_policy: MatchPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new `EngineConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the chart geometry is degenerate or the
    /// current-reading label is blank.
    pub fn new(
        chart: ChartGeometry,
        current_reading_label: String,
        match_policy: MatchPolicy,
    ) -> EngineResult<Self> {
        chart.validate()?;

        if current_reading_label.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "current reading label cannot be empty".into(),
            ));
        }

        Ok(Self {
            chart,
            current_reading_label,
            match_policy,
        })
    }

    /// Build a configuration from optional raw values, typically read from the environment
    /// by a binary at startup. Missing or blank values fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if a value is present but cannot be parsed, or if
    /// the resulting configuration is invalid.
    pub fn from_env_values(
        match_policy: Option<String>,
        chart_height: Option<String>,
    ) -> EngineResult<Self> {
        let match_policy = match_policy_from_env_value(match_policy)?;

        let mut chart = ChartGeometry::default();
        if let Some(height) = non_blank(chart_height) {
            chart.height = height.parse::<f64>().map_err(|e| {
                EngineError::InvalidConfig(format!("invalid chart height '{}': {}", height, e))
            })?;
        }

        Self::new(chart, CURRENT_READING_LABEL.to_string(), match_policy)
    }

    pub fn chart(&self) -> &ChartGeometry {
        &self.chart
    }

    pub fn current_reading_label(&self) -> &str {
        &self.current_reading_label
    }

    pub fn match_policy(&self) -> MatchPolicy {
        self.match_policy
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the label match policy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`MatchPolicy::Exact`].
pub fn match_policy_from_env_value(value: Option<String>) -> EngineResult<MatchPolicy> {
    non_blank(value)
        .map(|v| v.parse::<MatchPolicy>())
        .transpose()
        .map(Option::unwrap_or_default)
}
