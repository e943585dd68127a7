//! liftboard - Strength training progress dashboard
//!
//! Fetches per-user lift history from the dashboard server and charts one
//! exercise per panel, one line per user.

pub mod client;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod render;
pub mod selection;
pub mod tui;

pub use controller::DashboardController;
pub use dataset::ExerciseDataset;
