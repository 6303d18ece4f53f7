use chrono::Datelike;

use super::tables::WeightTable;
use super::{clamp_score, RiskModel};
use crate::entities::CropForm;

const CROP_BASE: WeightTable = WeightTable {
    entries: &[
        ("papa", 10),
        ("quinua", 5),
        ("maiz", 8),
        ("habas", 7),
        ("oca", 6),
        ("ulluco", 6),
        ("cebada", 7),
        ("trigo", 7),
    ],
    fallback: 8,
};

const WATER_SOURCE: WeightTable = WeightTable {
    entries: &[
        ("lluvia", 25),
        ("pozo", 10),
        ("rio", 15),
        ("reservorio", 5),
        ("sistema de riego", 3),
    ],
    fallback: 20,
};

const IRRIGATION: WeightTable = WeightTable {
    entries: &[
        ("goteo", -10),
        ("aspersion", -5),
        ("inundacion", 10),
        ("manual", 15),
        ("solo lluvia", 25),
    ],
    fallback: 0,
};

const SOIL: WeightTable = WeightTable {
    entries: &[
        ("arcilloso", 5),
        ("arenoso", 15),
        ("franco", -5),
        ("humifero", -10),
        ("pedregoso", 20),
    ],
    fallback: 0,
};

const SUN: WeightTable = WeightTable {
    entries: &[("pleno sol", 5), ("media sombra", -5), ("sombra", 10)],
    fallback: 0,
};

const FERTILIZER: WeightTable = WeightTable {
    entries: &[("organico", -5), ("quimico", 3)],
    fallback: 0,
};

/// Andean dry season, May through September (zero-based months).
const DRY_SEASON_MONTHS: [u32; 5] = [4, 5, 6, 7, 8];
const DRY_SEASON_PLANTING: i32 = 15;
const DRY_SEASON_HARVEST: i32 = 10;

/// Planting-month constant, January first.
const MONTHLY_PLANTING_RISK: [i32; 12] = [15, 10, 5, 3, 8, 12, 15, 18, 12, 5, 3, 10];

pub const TECHNIQUE_CREDIT: i32 = 2;

/// Weighted-sum model over crop, water, soil, sun, fertilizer and planting season.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeasonalRiskModel;

impl SeasonalRiskModel {
    pub fn new() -> Self {
        Self
    }

    fn seasonal_points(form: &CropForm) -> i32 {
        let mut points = 0;
        if let Some(planted) = form.planting_date {
            let month = planted.month0();
            if DRY_SEASON_MONTHS.contains(&month) {
                points += DRY_SEASON_PLANTING;
            }
            points += MONTHLY_PLANTING_RISK[month as usize];
        }
        if let Some(harvest) = form.expected_harvest_date {
            if DRY_SEASON_MONTHS.contains(&harvest.month0()) {
                points += DRY_SEASON_HARVEST;
            }
        }
        points
    }
}

impl RiskModel for SeasonalRiskModel {
    fn name(&self) -> &str {
        "seasonal"
    }

    fn score(&self, form: &CropForm) -> u8 {
        let mut points = Self::seasonal_points(form);
        points += CROP_BASE.weight(&form.crop_type);
        points += WATER_SOURCE.weight(&form.water_source);
        points += IRRIGATION.weight(&form.irrigation_method);
        points += SOIL.weight(&form.soil_type);
        points += SUN.weight(&form.sun_exposure);
        points += FERTILIZER.weight(&form.fertilizer_type);
        points -= form.sustainable_techniques.len() as i32 * TECHNIQUE_CREDIT;
        clamp_score(points)
    }
}
