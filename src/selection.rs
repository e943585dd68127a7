//! Selection state - which metric and grouping the charts show
//!
//! Each control group has exactly one active control at all times. Selecting
//! a control activates it and deactivates all of its siblings.

use thiserror::Error;

use crate::config::{Control, DashboardConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no {group} control declares value '{value}'")]
    UnknownValue { group: &'static str, value: String },
    #[error("dashboard has no grouping controls")]
    NoGroupings,
}

/// An ordered set of mutually exclusive controls
#[derive(Debug, Clone)]
pub struct ControlGroup {
    name: &'static str,
    controls: Vec<Control>,
    active: usize,
}

impl ControlGroup {
    /// Returns `None` for an empty control list
    pub fn new(name: &'static str, controls: Vec<Control>, initial: usize) -> Option<Self> {
        if controls.is_empty() {
            return None;
        }
        let active = initial.min(controls.len() - 1);
        Some(Self { name, controls, active })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn active(&self) -> &Control {
        &self.controls[self.active]
    }

    pub fn is_active(&self, index: usize) -> bool {
        index == self.active
    }

    /// Activate the control declaring `value`
    pub fn select(&mut self, value: &str) -> Result<(), SelectionError> {
        let index = self
            .controls
            .iter()
            .position(|c| c.value == value)
            .ok_or_else(|| SelectionError::UnknownValue {
                group: self.name,
                value: value.to_string(),
            })?;
        self.active = index;
        Ok(())
    }

    pub fn select_next(&mut self) {
        self.active = (self.active + 1) % self.controls.len();
    }

    pub fn select_previous(&mut self) {
        self.active = (self.active + self.controls.len() - 1) % self.controls.len();
    }
}

/// Metric x optional grouping
#[derive(Debug, Clone)]
pub struct SelectionState {
    metric: ControlGroup,
    grouping: Option<ControlGroup>,
}

impl SelectionState {
    /// Initial state: first metric, second grouping.
    ///
    /// Falls back to a single placeholder metric when the config declares none.
    pub fn new(config: &DashboardConfig) -> Self {
        let metric = ControlGroup::new("metric", config.metrics.clone(), 0).unwrap_or_else(|| {
            ControlGroup {
                name: "metric",
                controls: vec![Control::new("1RM", "maxOneRepMax")],
                active: 0,
            }
        });
        let grouping = ControlGroup::new("grouping", config.groupings.clone(), 1);
        Self { metric, grouping }
    }

    pub fn metric(&self) -> &str {
        &self.metric.active().value
    }

    pub fn grouping(&self) -> Option<&str> {
        self.grouping.as_ref().map(|g| g.active().value.as_str())
    }

    pub fn metric_group(&self) -> &ControlGroup {
        &self.metric
    }

    pub fn grouping_group(&self) -> Option<&ControlGroup> {
        self.grouping.as_ref()
    }

    pub fn select_metric(&mut self, value: &str) -> Result<(), SelectionError> {
        self.metric.select(value)
    }

    pub fn select_grouping(&mut self, value: &str) -> Result<(), SelectionError> {
        self.grouping
            .as_mut()
            .ok_or(SelectionError::NoGroupings)?
            .select(value)
    }

    pub fn metric_group_mut(&mut self) -> &mut ControlGroup {
        &mut self.metric
    }

    pub fn grouping_group_mut(&mut self) -> Option<&mut ControlGroup> {
        self.grouping.as_mut()
    }
}
