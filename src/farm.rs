//! The farm service: a grid plus the risk scorer used when crops are saved

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::entities::{Crop, CropForm, Customer, Reservoir, Supplier, Warehouse, Worker};
use crate::forms::{FieldError, Validate};
use crate::grid::{CellContent, CellPos, FarmCell, FarmGrid, FarmStats, GridError};
use crate::risk::{RiskAssessment, RiskScorer};

#[derive(Debug, Error)]
pub enum FarmError {
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(Vec<FieldError>),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// A record submitted for a cell, before validation and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CellInput {
    Empty,
    Crop(CropForm),
    Supplier(Supplier),
    Customer(Customer),
    Worker(Worker),
    Warehouse(Warehouse),
    Reservoir(Reservoir),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarmAction {
    Placed,
    Reset,
}

/// Change notification sent to event stream subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmEvent {
    pub action: FarmAction,
    pub cell: FarmCell,
}

fn checked<T: Validate>(record: &T) -> Result<(), FarmError> {
    let errors = record.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(FarmError::Invalid(errors))
    }
}

#[derive(Debug)]
pub struct Farm {
    grid: FarmGrid,
    scorer: RiskScorer,
}

impl Farm {
    pub fn new(grid: FarmGrid, scorer: RiskScorer) -> Self {
        Self { grid, scorer }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, FarmError> {
        Ok(Self::new(
            FarmGrid::new(config.farm.rows, config.farm.cols)?,
            RiskScorer::from_config(&config.risk),
        ))
    }

    pub fn grid(&self) -> &FarmGrid {
        &self.grid
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    pub fn stats(&self) -> FarmStats {
        self.grid.stats()
    }

    pub fn assess(&self, form: &CropForm) -> RiskAssessment {
        self.scorer.assess(form)
    }

    /// Validate the full form, score it and plant the crop at `pos`.
    pub fn save_crop(&mut self, pos: CellPos, form: CropForm) -> Result<FarmEvent, FarmError> {
        self.grid.index_of(pos)?;
        checked(&form)?;
        let assessment = self.scorer.assess(&form);
        if assessment.critical {
            warn!(
                cell = %pos.id(),
                crop = %form.name,
                score = assessment.score,
                "critical climate risk"
            );
        }
        let crop = Crop::planted(form, &assessment);
        self.place(pos, CellContent::Crop(Box::new(crop)))
    }

    /// Validate and store any record, scoring crops on the way.
    pub fn save(&mut self, pos: CellPos, input: CellInput) -> Result<FarmEvent, FarmError> {
        let content = match input {
            CellInput::Empty => return self.reset(pos),
            CellInput::Crop(form) => return self.save_crop(pos, form),
            CellInput::Supplier(supplier) => {
                checked(&supplier)?;
                CellContent::Supplier(Box::new(supplier))
            }
            CellInput::Customer(customer) => {
                checked(&customer)?;
                CellContent::Customer(Box::new(customer))
            }
            CellInput::Worker(worker) => {
                checked(&worker)?;
                CellContent::Worker(Box::new(worker))
            }
            CellInput::Warehouse(warehouse) => {
                checked(&warehouse)?;
                CellContent::Warehouse(Box::new(warehouse))
            }
            CellInput::Reservoir(reservoir) => {
                checked(&reservoir)?;
                CellContent::Reservoir(Box::new(reservoir))
            }
        };
        self.place(pos, content)
    }

    fn place(&mut self, pos: CellPos, content: CellContent) -> Result<FarmEvent, FarmError> {
        let kind = content.kind();
        let name = content.name().unwrap_or_default();
        let previous = self.grid.place(pos, content)?;
        if !previous.is_empty() {
            debug!(cell = %pos.id(), replaced = %previous.kind(), "cell overwritten");
        }
        info!(cell = %pos.id(), kind = %kind, name = %name, "cell saved");
        Ok(FarmEvent {
            action: FarmAction::Placed,
            cell: self.grid.cell(pos)?.clone(),
        })
    }

    pub fn reset(&mut self, pos: CellPos) -> Result<FarmEvent, FarmError> {
        let previous = self.grid.reset(pos)?;
        info!(cell = %pos.id(), removed = %previous.kind(), "cell reset");
        Ok(FarmEvent {
            action: FarmAction::Reset,
            cell: self.grid.cell(pos)?.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::grid::CellKind;
    use crate::risk::RiskLevel;

    fn farm() -> Farm {
        Farm::from_config(&AppConfig::default()).unwrap()
    }

    fn valid_form() -> CropForm {
        CropForm {
            name: "Papa nativa".into(),
            crop_type: "papa".into(),
            variety: "Peruanita".into(),
            planting_date: NaiveDate::from_ymd_opt(2024, 10, 15),
            expected_harvest_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            area_ha: 0.8,
            irrigation_method: "Riego por goteo".into(),
            irrigation_frequency: "Semanal".into(),
            irrigation_time: "Tarde".into(),
            irrigation_times_per_week: 2,
            fertilizer_type: "Organico".into(),
            fertilizer_brand: "Guano de isla".into(),
            fertilizer_frequency: "Mensual".into(),
            plot_location: "Valle".into(),
            sun_exposure: "Pleno sol".into(),
            water_source: "Pozo".into(),
            soil_type: "Franco".into(),
            ..CropForm::default()
        }
    }

    #[test]
    fn saving_a_crop_scores_and_plants_it() {
        let mut farm = farm();
        let event = farm.save_crop(CellPos::new(1, 2), valid_form()).unwrap();

        assert_eq!(event.action, FarmAction::Placed);
        assert_eq!(event.cell.id, "1-2");
        match &event.cell.content {
            CellContent::Crop(crop) => {
                assert_eq!(crop.climate_risk, 10);
                assert_eq!(crop.risk_level, RiskLevel::Low);
                assert_eq!(crop.health, 100);
                assert!(!crop.critical_risk);
            }
            other => panic!("expected a crop, got {:?}", other.kind()),
        }
        assert_eq!(farm.stats().counts.crops, 1);
    }

    #[test]
    fn invalid_crop_leaves_the_cell_empty() {
        let mut farm = farm();
        let mut form = valid_form();
        form.area_ha = 0.0;

        let err = farm.save_crop(CellPos::new(0, 0), form).unwrap_err();
        match err {
            FarmError::Invalid(errors) => assert_eq!(errors[0].field, "area_ha"),
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(
            farm.grid().cell(CellPos::new(0, 0)).unwrap().kind(),
            CellKind::Empty
        );
    }

    #[test]
    fn out_of_bounds_is_reported_before_validation() {
        let mut farm = farm();
        let err = farm
            .save_crop(CellPos::new(9, 9), CropForm::default())
            .unwrap_err();
        assert!(matches!(err, FarmError::Grid(GridError::OutOfBounds { .. })));
    }

    #[test]
    fn oversized_config_is_an_error() {
        let mut config = AppConfig::default();
        config.farm.rows = 70_000;
        config.farm.cols = 70_000;
        assert!(matches!(
            Farm::from_config(&config),
            Err(FarmError::Grid(GridError::InvalidSize { rows: 70_000, .. }))
        ));
    }

    #[test]
    fn tagged_input_saves_other_records() {
        let mut farm = farm();
        let input: CellInput = serde_json::from_value(serde_json::json!({
            "type": "warehouse",
            "data": { "name": "Troje", "total_capacity": 20.0, "used_capacity": 5.0 }
        }))
        .unwrap();

        farm.save(CellPos::new(4, 4), input).unwrap();
        let stats = farm.stats();
        assert_eq!(stats.counts.warehouses, 1);
        assert_eq!(stats.storage_capacity, 20.0);

        let event = farm.save(CellPos::new(4, 4), CellInput::Empty).unwrap();
        assert_eq!(event.action, FarmAction::Reset);
        assert_eq!(farm.stats().occupied, 0);
    }
}
