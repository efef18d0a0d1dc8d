//! Vital series projection.
//!
//! Turns a patient's reading history (plus the unsaved reading while a form is open) into pixel
//! coordinates on one shared chart. Readings are an ordered categorical sequence: the x axis
//! advances a fixed spacing per reading regardless of the time between them, and every
//! parameter shares the same value axis.
//!
//! The projector emits coordinates and values only; drawing is left to the renderer. Points
//! are omitted wherever a reading has no value for a parameter, and renderers connect only the
//! points that are present.

use crate::config::{ChartGeometry, EngineConfig};
use crate::constants::{CHART_GRID_MAJOR_STEP, CHART_GRID_STEP};
use crate::vitals::VitalReading;
use serde::Serialize;

/// A plotted parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartParameter {
    Respiration,
    Spo2,
    Pulse,
    Systolic,
    Consciousness,
    Temperature,
    /// Secondary series fed by the second half of the blood pressure.
    Diastolic,
}

impl ChartParameter {
    pub const ALL: [ChartParameter; 7] = [
        ChartParameter::Respiration,
        ChartParameter::Spo2,
        ChartParameter::Pulse,
        ChartParameter::Systolic,
        ChartParameter::Consciousness,
        ChartParameter::Temperature,
        ChartParameter::Diastolic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartParameter::Respiration => "RR",
            ChartParameter::Spo2 => "SpO2",
            ChartParameter::Pulse => "Pulse",
            ChartParameter::Systolic => "BP sys",
            ChartParameter::Consciousness => "ACVPU",
            ChartParameter::Temperature => "Temp",
            ChartParameter::Diastolic => "BP dia",
        }
    }

    /// Value on the shared axis, or `None` when the reading has nothing to plot.
    pub fn value(self, reading: &VitalReading) -> Option<f64> {
        match self {
            ChartParameter::Respiration => reading.respiration_rate(),
            ChartParameter::Spo2 => reading.spo2_value(),
            ChartParameter::Pulse => reading.pulse_rate(),
            ChartParameter::Systolic => reading.blood_pressure_value().systolic,
            ChartParameter::Consciousness => {
                reading.consciousness_level().map(|c| c.chart_value())
            }
            ChartParameter::Temperature => reading.temperature_value(),
            ChartParameter::Diastolic => reading.blood_pressure_value().diastolic,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Position of the source reading in the projected sequence.
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub value: f64,
    pub reading: VitalReading,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSeries {
    pub parameter: ChartParameter,
    /// Ordered by index; indices without a value are skipped.
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Coordinates of the present points, for a polyline.
    pub fn polyline(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.x, p.y)).collect()
    }
}

/// Vertical gridline and time label position for one reading.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisTick {
    pub index: usize,
    pub x: f64,
    pub label: Option<String>,
}

/// Horizontal gridline on the value axis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GridLine {
    pub value: f64,
    pub y: f64,
    pub major: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VitalChart {
    pub width: f64,
    pub height: f64,
    /// The readings that made it onto the chart, in index order.
    pub readings: Vec<VitalReading>,
    pub series: Vec<ChartSeries>,
    pub ticks: Vec<AxisTick>,
    pub gridlines: Vec<GridLine>,
}

impl VitalChart {
    /// Projects `history`, followed by `pending` when `editing` and it holds any value.
    ///
    /// Readings without any vital value are dropped before indexing. Returns `None` when no
    /// reading remains.
    pub fn project(
        history: &[VitalReading],
        pending: Option<&VitalReading>,
        editing: bool,
        config: &EngineConfig,
    ) -> Option<Self> {
        let geometry = config.chart();

        let current = pending
            .filter(|p| editing && p.has_any_value())
            .map(|p| p.stamped(config.current_reading_label()));

        let readings: Vec<VitalReading> = history
            .iter()
            .cloned()
            .chain(current)
            .filter(VitalReading::has_any_value)
            .collect();

        if readings.is_empty() {
            return None;
        }

        let series = ChartParameter::ALL
            .iter()
            .map(|&parameter| ChartSeries {
                parameter,
                points: readings
                    .iter()
                    .enumerate()
                    .filter_map(|(index, reading)| {
                        parameter.value(reading).map(|value| ChartPoint {
                            index,
                            x: x_for(geometry, index),
                            y: y_for(geometry, value),
                            value,
                            reading: reading.clone(),
                        })
                    })
                    .collect(),
            })
            .collect();

        let count = readings.len();
        let ticks = (0..count)
            .map(|index| AxisTick {
                index,
                x: x_for(geometry, index),
                label: (count <= geometry.label_every_index_max || index % 2 == 0)
                    .then(|| readings[index].time.clone()),
            })
            .collect();

        let width =
            (count as f64 * geometry.point_spacing + geometry.padding * 2.0).max(geometry.min_width);

        tracing::debug!("projected {} readings onto a {}px wide chart", count, width);

        Some(Self {
            width,
            height: geometry.height,
            readings,
            series,
            ticks,
            gridlines: gridlines(geometry),
        })
    }

    pub fn series(&self, parameter: ChartParameter) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.parameter == parameter)
    }
}

/// Pixel x of the reading at `index`.
pub fn x_for(geometry: &ChartGeometry, index: usize) -> f64 {
    geometry.padding + index as f64 * geometry.point_spacing
}

/// Pixel y of `value` on the shared value axis. Values outside the domain are not clamped.
pub fn y_for(geometry: &ChartGeometry, value: f64) -> f64 {
    let plot = geometry.plot_height();
    let fraction = (value - geometry.value_min) / (geometry.value_max - geometry.value_min);
    geometry.padding + plot - fraction * plot
}

fn gridlines(geometry: &ChartGeometry) -> Vec<GridLine> {
    let steps = ((geometry.value_max - geometry.value_min) / CHART_GRID_STEP).floor() as usize;
    (0..=steps)
        .map(|i| {
            let value = geometry.value_min + i as f64 * CHART_GRID_STEP;
            GridLine {
                value,
                y: y_for(geometry, value),
                major: (value % CHART_GRID_MAJOR_STEP).abs() < f64::EPSILON,
            }
        })
        .collect()
}
