//! Dashboard configuration - tracked exercises, selection controls, server

use std::time::Duration;

/// Default dashboard server
pub const DEFAULT_SERVER: &str = "http://localhost:8080";

/// Client-side upload timeout (seconds)
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 5;

/// Exercises charted by default, in display order
pub const DEFAULT_EXERCISES: &[&str] = &[
    "Squat (Barbell)",
    "Deadlift (Barbell)",
    "Bench Press (Barbell)",
    "Overhead Press (Barbell)",
    "Bent Over Row (Barbell)",
];

/// A selectable control: what the user sees and the value it declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub value: String,
}

impl Control {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// Metric controls. Values are field names of the server's aggregated points.
pub fn default_metric_controls() -> Vec<Control> {
    vec![
        Control::new("1RM", "maxOneRepMax"),
        Control::new("Max weight", "maxWeight"),
        Control::new("Volume", "totalVolume"),
    ]
}

/// Grouping controls. Values index the server's per-user grouping array:
/// raw sets, then day, week and month buckets.
pub fn default_grouping_controls() -> Vec<Control> {
    vec![
        Control::new("Set", "0"),
        Control::new("Day", "1"),
        Control::new("Week", "2"),
        Control::new("Month", "3"),
    ]
}

/// Everything the dashboard needs to know before the first fetch
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL, e.g. `http://localhost:8080`
    pub server: String,
    /// Tracked exercises, one chart each, in this order
    pub exercises: Vec<String>,
    pub metrics: Vec<Control>,
    /// Empty for a flat (ungrouped) dashboard
    pub groupings: Vec<Control>,
    pub upload_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            exercises: DEFAULT_EXERCISES.iter().map(|e| e.to_string()).collect(),
            metrics: default_metric_controls(),
            groupings: default_grouping_controls(),
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
        }
    }
}

impl DashboardConfig {
    pub fn with_server(mut self, server: &str) -> Self {
        self.server = server.trim_end_matches('/').to_string();
        self
    }

    /// Replace the tracked exercise list. Blank names are dropped; an empty
    /// list keeps the defaults.
    pub fn with_exercises<I, S>(mut self, exercises: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exercises: Vec<String> = exercises
            .into_iter()
            .map(|e| e.as_ref().trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        if !exercises.is_empty() {
            self.exercises = exercises;
        }
        self
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Drop the grouping controls (flat dataset variant)
    pub fn without_groupings(mut self) -> Self {
        self.groupings.clear();
        self
    }

    pub fn data_url(&self) -> String {
        format!("{}/api/data", self.server)
    }

    pub fn upload_url(&self) -> String {
        format!("{}/api/upload", self.server)
    }
}
