//! Chart rendering - series derivation and the backend seam
//!
//! The renderer turns (dataset, selection) into one chart per tracked
//! exercise. Drawing is left to a [`ChartBackend`]; the renderer only decides
//! what goes on each chart and makes sure the previous pass is disposed.

pub mod retained;

pub use retained::{ChartSnapshot, RetainedCharts};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::dataset::ExerciseDataset;

/// X-axis key of every data point
pub const X_AXIS_KEY: &str = "timestamp";

/// One plotted point
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    /// Raw timestamp, as served
    pub timestamp: String,
    /// `None` when the timestamp could not be parsed
    pub time: Option<DateTime<Utc>>,
    /// `None` when the point lacks the selected metric
    pub value: Option<f64>,
}

impl SeriesPoint {
    /// (epoch seconds, value) when both sides are known
    pub fn xy(&self) -> Option<(f64, f64)> {
        Some((self.time?.timestamp() as f64, self.value?))
    }
}

/// One line on a chart, labelled by user
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    Time,
    Linear,
}

/// Axis and decoration settings handed to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfig {
    pub title: String,
    pub x_key: String,
    pub x_scale: ScaleKind,
    pub y_key: String,
    pub legend: bool,
}

impl AxisConfig {
    pub fn for_exercise(exercise: &str, metric: &str) -> Self {
        Self {
            title: exercise.to_string(),
            x_key: X_AXIS_KEY.to_string(),
            x_scale: ScaleKind::Time,
            y_key: metric.to_string(),
            legend: true,
        }
    }
}

/// Minimal capability a drawing library has to offer
pub trait ChartBackend {
    /// Handle to a live chart
    type Instance;

    fn render(
        &mut self,
        container_id: &str,
        series: &[Series],
        axis: &AxisConfig,
    ) -> Self::Instance;

    /// Release a chart created by [`ChartBackend::render`]
    fn dispose(&mut self, instance: Self::Instance);
}

/// Series for one exercise: one entry per user, empty when the user has no
/// data for the exercise under the current grouping.
pub fn derive_series(
    dataset: &ExerciseDataset,
    exercise: &str,
    metric: &str,
    grouping: Option<&str>,
) -> Vec<Series> {
    dataset
        .users()
        .map(|(user, record)| Series {
            label: user.to_string(),
            points: record
                .series(exercise, grouping)
                .iter()
                .map(|p| SeriesPoint {
                    timestamp: p.timestamp.clone(),
                    time: p.time(),
                    value: p.metric(metric),
                })
                .collect(),
        })
        .collect()
}

/// Container id for the chart at position `index`
pub fn container_id(index: usize) -> String {
    format!("chart-{}", index)
}

/// Owns a backend and the charts it currently has live
pub struct ChartRenderer<B: ChartBackend> {
    backend: B,
    live: Vec<B::Instance>,
}

impl<B: ChartBackend> ChartRenderer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            live: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Dispose everything from the previous pass
    pub fn clear(&mut self) {
        for instance in self.live.drain(..) {
            self.backend.dispose(instance);
        }
    }

    /// Replace all charts: one per exercise, in the given order
    pub fn render_pass(
        &mut self,
        dataset: &ExerciseDataset,
        exercises: &[String],
        metric: &str,
        grouping: Option<&str>,
    ) -> usize {
        self.clear();

        for (index, exercise) in exercises.iter().enumerate() {
            let series = derive_series(dataset, exercise, metric, grouping);
            let axis = AxisConfig::for_exercise(exercise, metric);
            let instance = self.backend.render(&container_id(index), &series, &axis);
            self.live.push(instance);
        }

        debug!(
            "Rendered {} charts (metric: {}, grouping: {})",
            self.live.len(),
            metric,
            grouping.unwrap_or("none")
        );
        self.live.len()
    }
}
