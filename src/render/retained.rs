//! Retained chart backend - keeps rendered charts until disposed
//!
//! Frontends (terminal UI, `show` command) read the live snapshots and draw
//! them however they like.

use std::collections::BTreeMap;

use super::{AxisConfig, ChartBackend, Series};

/// Handle returned for every rendered chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChartHandle(u64);

/// Everything needed to draw one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub container_id: String,
    pub axis: AxisConfig,
    pub series: Vec<Series>,
}

impl ChartSnapshot {
    /// Plottable (x, y) pairs per series, in series order
    pub fn plot_data(&self) -> Vec<(String, Vec<(f64, f64)>)> {
        self.series
            .iter()
            .map(|s| (s.label.clone(), s.points.iter().filter_map(|p| p.xy()).collect()))
            .collect()
    }

    /// (x_min, x_max, y_min, y_max) over all plottable points
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().filter_map(|p| p.xy()));
        let (x, y) = points.next()?;
        let init = (x, x, y, y);
        Some(points.fold(init, |(x0, x1, y0, y1), (x, y)| {
            (x0.min(x), x1.max(x), y0.min(y), y1.max(y))
        }))
    }

    /// Plain text description, used by the `show` command
    pub fn describe(&self) -> String {
        let mut lines = vec![format!("{} [{}]", self.axis.title, self.axis.y_key)];
        for series in &self.series {
            let last = series
                .points
                .iter()
                .rev()
                .find_map(|p| p.value.map(|v| (p.timestamp.as_str(), v)));
            let line = match last {
                Some((ts, value)) => format!(
                    "  {:12} {:>4} pts, last {:.1} @ {}",
                    series.label,
                    series.points.len(),
                    value,
                    ts
                ),
                None => format!("  {:12}    - no data", series.label),
            };
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// In-memory chart store
#[derive(Debug, Default)]
pub struct RetainedCharts {
    next_id: u64,
    slots: BTreeMap<ChartHandle, ChartSnapshot>,
}

impl RetainedCharts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live charts in render order
    pub fn live(&self) -> impl Iterator<Item = &ChartSnapshot> {
        self.slots.values()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, container_id: &str) -> Option<&ChartSnapshot> {
        self.slots.values().find(|c| c.container_id == container_id)
    }
}

impl ChartBackend for RetainedCharts {
    type Instance = ChartHandle;

    fn render(&mut self, container_id: &str, series: &[Series], axis: &AxisConfig) -> ChartHandle {
        self.next_id += 1;
        let handle = ChartHandle(self.next_id);
        self.slots.insert(
            handle,
            ChartSnapshot {
                container_id: container_id.to_string(),
                axis: axis.clone(),
                series: series.to_vec(),
            },
        );
        handle
    }

    fn dispose(&mut self, instance: ChartHandle) {
        self.slots.remove(&instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::SeriesPoint;
    use chrono::{TimeZone, Utc};

    fn point(day: u32, value: Option<f64>) -> SeriesPoint {
        SeriesPoint {
            timestamp: format!("2024-01-{:02}", day),
            time: Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()),
            value,
        }
    }

    fn snapshot() -> ChartSnapshot {
        ChartSnapshot {
            container_id: "chart-0".to_string(),
            axis: AxisConfig::for_exercise("Squat (Barbell)", "maxOneRepMax"),
            series: vec![
                Series {
                    label: "alice".to_string(),
                    points: vec![point(1, Some(100.0)), point(3, Some(105.0))],
                },
                Series {
                    label: "bob".to_string(),
                    points: vec![point(2, Some(90.0)), point(4, None)],
                },
                Series { label: "vinko".to_string(), points: vec![] },
            ],
        }
    }

    #[test]
    fn test_render_and_dispose() {
        let mut charts = RetainedCharts::new();
        let axis = AxisConfig::for_exercise("Squat (Barbell)", "maxWeight");

        let a = charts.render("chart-0", &[], &axis);
        let b = charts.render("chart-1", &[], &axis);
        assert_eq!(charts.len(), 2);
        assert!(charts.get("chart-1").is_some());

        charts.dispose(a);
        assert_eq!(charts.len(), 1);
        assert!(charts.get("chart-0").is_none());

        charts.dispose(b);
        assert!(charts.is_empty());
    }

    #[test]
    fn test_live_in_render_order() {
        let mut charts = RetainedCharts::new();
        let axis = AxisConfig::for_exercise("Squat (Barbell)", "maxWeight");
        for i in 0..3 {
            charts.render(&format!("chart-{}", i), &[], &axis);
        }
        let ids: Vec<_> = charts.live().map(|c| c.container_id.as_str()).collect();
        assert_eq!(ids, vec!["chart-0", "chart-1", "chart-2"]);
    }

    #[test]
    fn test_bounds() {
        let (x0, x1, y0, y1) = snapshot().bounds().unwrap();
        assert_eq!(x0, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp() as f64);
        assert_eq!(x1, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap().timestamp() as f64);
        assert_eq!(y0, 90.0);
        assert_eq!(y1, 105.0);
    }

    #[test]
    fn test_bounds_empty() {
        let mut empty = snapshot();
        empty.series.truncate(0);
        assert!(empty.bounds().is_none());
    }

    #[test]
    fn test_describe() {
        let text = snapshot().describe();
        assert!(text.starts_with("Squat (Barbell) [maxOneRepMax]"), "{}", text);
        assert!(text.contains("last 105.0 @ 2024-01-03"), "{}", text);
        assert!(text.contains("last 90.0 @ 2024-01-02"), "{}", text);
        assert!(text.contains("vinko") && text.contains("no data"), "{}", text);
    }
}
