pub mod alerts;
pub mod config;
pub mod entities;
pub mod farm;
pub mod forms;
pub mod grid;
pub mod layout;
pub mod risk;
pub mod web;

pub use config::AppConfig;
pub use farm::{Farm, FarmError};
pub use grid::{FarmGrid, FarmStats};
pub use risk::{RiskAssessment, RiskLevel, RiskScorer};
