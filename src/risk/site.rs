use super::seasonal::TECHNIQUE_CREDIT;
use super::tables::{is_category, WeightTable};
use super::{clamp_score, RiskModel};
use crate::entities::{Accessibility, CropForm, TransportFrequency, TransportMode};

const CROP_BASE: WeightTable = WeightTable {
    entries: &[
        ("papa", 30),
        ("quinua", 10),
        ("maiz", 20),
        ("habas", 20),
        ("oca", 40),
        ("ulluco", 30),
        ("cebada", 20),
        ("trigo", 20),
    ],
    fallback: 30,
};

const PARTIAL_SUN: WeightTable = WeightTable {
    entries: &[("parcial", 10), ("media sombra", 10)],
    fallback: 0,
};

const FAR_CAPITAL_KM: f64 = 200.0;
const HIGH_ALTITUDE_M: f64 = 4_000.0;

/// Agronomic, geographic and logistics checklist on the 0-100 scale.
#[derive(Debug, Default, Clone, Copy)]
pub struct SiteRiskModel;

impl SiteRiskModel {
    pub fn new() -> Self {
        Self
    }

    fn agronomic_points(form: &CropForm) -> i32 {
        let mut points = CROP_BASE.weight(&form.crop_type);
        if is_category(&form.soil_type, "arcilloso") {
            points += 20;
        }
        points += PARTIAL_SUN.weight(&form.sun_exposure);
        if is_category(&form.water_source, "lejos") {
            points += 30;
        }
        if is_category(&form.plot_location, "ladera") {
            points += 20;
        }
        if is_category(&form.irrigation_method, "manual") {
            points += 10;
        }
        if is_category(&form.fertilizer_type, "quimico") {
            points += 10;
        }
        points
    }

    fn geographic_points(form: &CropForm) -> i32 {
        let location = &form.location;
        let mut points = 0;
        if location.accessibility == Accessibility::Difficult {
            points += 30;
        }
        if location.distance_to_capital_km > FAR_CAPITAL_KM {
            points += 20;
        }
        if location.altitude_m.map_or(false, |alt| alt > HIGH_ALTITUDE_M) {
            points += 20;
        }
        points
    }

    fn logistics_points(form: &CropForm) -> i32 {
        let logistics = &form.logistics;
        let mut points = 0;
        if logistics.main_transport == TransportMode::Public {
            points += 20;
        }
        // a single critical route means no alternative when it closes
        if logistics.critical_routes.len() == 1 {
            points += 30;
        }
        if logistics.frequency == TransportFrequency::Monthly {
            points += 20;
        }
        points
    }
}

impl RiskModel for SiteRiskModel {
    fn name(&self) -> &str {
        "site"
    }

    fn score(&self, form: &CropForm) -> u8 {
        let points = Self::agronomic_points(form)
            + Self::geographic_points(form)
            + Self::logistics_points(form)
            - form.sustainable_techniques.len() as i32 * TECHNIQUE_CREDIT;
        clamp_score(points)
    }
}
