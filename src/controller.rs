//! Dashboard controller - owns selection, dataset and rendered charts
//!
//! All state lives here and every change goes through a method that ends in a
//! render pass. Nothing is captured from the outside.

use tracing::{error, warn};

use crate::client::FetchError;
use crate::config::DashboardConfig;
use crate::dataset::ExerciseDataset;
use crate::render::{ChartBackend, ChartRenderer};
use crate::selection::{SelectionError, SelectionState};

/// Where the dataset for the current session stands
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Loaded(ExerciseDataset),
    Failed(String),
}

/// Result of a render request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    /// No dataset yet (or the fetch failed), nothing drawn
    Skipped,
    /// Number of charts now live
    Rendered(usize),
}

pub struct DashboardController<B: ChartBackend> {
    config: DashboardConfig,
    selection: SelectionState,
    load: LoadState,
    renderer: ChartRenderer<B>,
}

impl<B: ChartBackend> DashboardController<B> {
    pub fn new(config: DashboardConfig, backend: B) -> Self {
        let selection = SelectionState::new(&config);
        Self {
            config,
            selection,
            load: LoadState::Loading,
            renderer: ChartRenderer::new(backend),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn dataset(&self) -> Option<&ExerciseDataset> {
        match &self.load {
            LoadState::Loaded(dataset) => Some(dataset),
            _ => None,
        }
    }

    /// The chart backend, for frontends that draw its contents
    pub fn charts(&self) -> &B {
        self.renderer.backend()
    }

    pub fn live_charts(&self) -> usize {
        self.renderer.live_count()
    }

    /// Start a new session: forget the dataset, drop all charts.
    /// Selection survives.
    pub fn begin_load(&mut self) {
        self.load = LoadState::Loading;
        self.renderer.clear();
    }

    /// Store the fetch result and render once
    pub fn finish_load(&mut self, result: Result<ExerciseDataset, FetchError>) -> RenderPass {
        match result {
            Ok(dataset) => self.load = LoadState::Loaded(dataset),
            Err(e) => {
                error!("Failed to load dataset: {}", e);
                self.load = LoadState::Failed(e.to_string());
            }
        }
        self.render()
    }

    /// Re-render every tracked exercise with the current selection
    pub fn render(&mut self) -> RenderPass {
        let LoadState::Loaded(dataset) = &self.load else {
            self.renderer.clear();
            return RenderPass::Skipped;
        };

        let count = self.renderer.render_pass(
            dataset,
            &self.config.exercises,
            self.selection.metric(),
            self.selection.grouping(),
        );
        RenderPass::Rendered(count)
    }

    pub fn select_metric(&mut self, value: &str) -> Result<RenderPass, SelectionError> {
        self.selection.select_metric(value).inspect_err(|e| warn!("{}", e))?;
        Ok(self.render())
    }

    pub fn select_grouping(&mut self, value: &str) -> Result<RenderPass, SelectionError> {
        self.selection.select_grouping(value).inspect_err(|e| warn!("{}", e))?;
        Ok(self.render())
    }

    pub fn cycle_metric(&mut self, forward: bool) -> RenderPass {
        let group = self.selection.metric_group_mut();
        if forward {
            group.select_next();
        } else {
            group.select_previous();
        }
        self.render()
    }

    /// No-op render for dashboards without grouping controls
    pub fn cycle_grouping(&mut self, forward: bool) -> RenderPass {
        if let Some(group) = self.selection.grouping_group_mut() {
            if forward {
                group.select_next();
            } else {
                group.select_previous();
            }
        }
        self.render()
    }
}
