//! Climate risk scoring for crop records
//!
//! Two models share the [`RiskModel`] seam: `seasonal` weighs categorical form
//! choices and planting season, `site` weighs agronomic, geographic and
//! logistics factors. Both return an integer in `0..=100`.

mod seasonal;
mod site;
pub mod tables;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::entities::CropForm;

pub use seasonal::SeasonalRiskModel;
pub use site::SiteRiskModel;

/// Scores above this raise the critical climate risk flag.
pub const CRITICAL_ABOVE: u8 = 70;

pub trait RiskModel: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, form: &CropForm) -> u8;
}

pub(crate) fn clamp_score(points: i32) -> u8 {
    points.clamp(0, 100) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskModelKind {
    #[default]
    Seasonal,
    Site,
}

impl RiskModelKind {
    pub fn build(self) -> Box<dyn RiskModel> {
        match self {
            RiskModelKind::Seasonal => Box::new(SeasonalRiskModel::new()),
            RiskModelKind::Site => Box::new(SiteRiskModel::new()),
        }
    }
}

impl FromStr for RiskModelKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "seasonal" => Ok(RiskModelKind::Seasonal),
            "site" => Ok(RiskModelKind::Site),
            other => Err(format!("unknown risk model '{other}' (expected seasonal or site)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskThresholds {
    pub low_below: u8,
    pub medium_below: u8,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_below: 30,
            medium_below: 60,
        }
    }
}

impl RiskThresholds {
    pub fn level(&self, score: u8) -> RiskLevel {
        if score < self.low_below {
            RiskLevel::Low
        } else if score < self.medium_below {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
    pub model: String,
    pub critical: bool,
}

/// A risk model paired with the thresholds used to bucket its scores.
pub struct RiskScorer {
    model: Box<dyn RiskModel>,
    thresholds: RiskThresholds,
}

impl RiskScorer {
    pub fn new(model: Box<dyn RiskModel>, thresholds: RiskThresholds) -> Self {
        Self { model, thresholds }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(
            config.model.build(),
            RiskThresholds {
                low_below: config.low_below,
                medium_below: config.medium_below,
            },
        )
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn thresholds(&self) -> RiskThresholds {
        self.thresholds
    }

    pub fn assess(&self, form: &CropForm) -> RiskAssessment {
        let score = self.model.score(form);
        RiskAssessment {
            score,
            level: self.thresholds.level(score),
            model: self.model.name().to_string(),
            critical: score > CRITICAL_ABOVE,
        }
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(RiskModelKind::default().build(), RiskThresholds::default())
    }
}

impl fmt::Debug for RiskScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskScorer")
            .field("model", &self.model.name())
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_bucket_scores() {
        let thresholds = RiskThresholds::default();
        assert_eq!(thresholds.level(0), RiskLevel::Low);
        assert_eq!(thresholds.level(29), RiskLevel::Low);
        assert_eq!(thresholds.level(30), RiskLevel::Medium);
        assert_eq!(thresholds.level(59), RiskLevel::Medium);
        assert_eq!(thresholds.level(60), RiskLevel::High);
        assert_eq!(thresholds.level(100), RiskLevel::High);
    }

    #[test]
    fn model_kind_parses_case_insensitively() {
        assert_eq!("Site".parse::<RiskModelKind>(), Ok(RiskModelKind::Site));
        assert_eq!(
            " seasonal ".parse::<RiskModelKind>(),
            Ok(RiskModelKind::Seasonal)
        );
        assert!("neural".parse::<RiskModelKind>().is_err());
    }

    #[test]
    fn assessment_flags_critical_scores() {
        let scorer = RiskScorer::default();
        let form = CropForm {
            crop_type: "papa".into(),
            water_source: "Lluvia".into(),
            irrigation_method: "Solo lluvia".into(),
            soil_type: "Pedregoso".into(),
            ..CropForm::default()
        };
        let assessment = scorer.assess(&form);
        assert_eq!(assessment.score, 80);
        assert_eq!(assessment.level, RiskLevel::High);
        assert!(assessment.critical);
        assert_eq!(assessment.model, "seasonal");
    }

    #[test]
    fn custom_thresholds_change_the_level_only() {
        let scorer = RiskScorer::new(
            Box::new(SeasonalRiskModel::new()),
            RiskThresholds {
                low_below: 10,
                medium_below: 20,
            },
        );
        let form = CropForm {
            crop_type: "quinua".into(),
            water_source: "Reservorio".into(),
            ..CropForm::default()
        };
        let assessment = scorer.assess(&form);
        assert_eq!(assessment.score, 10);
        assert_eq!(assessment.level, RiskLevel::Medium);
    }
}
