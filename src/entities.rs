//! Records that can occupy a farm cell

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::risk::{RiskAssessment, RiskLevel};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    #[serde(alias = "excelente")]
    Excellent,
    #[default]
    #[serde(alias = "buena")]
    Good,
    #[serde(alias = "regular")]
    Fair,
    #[serde(alias = "dificil")]
    Difficult,
}

/// Geographic placement shared by every farm record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub department: String,
    pub province: String,
    pub district: String,
    pub coordinates: Option<Coordinates>,
    pub altitude_m: Option<f64>,
    pub geographic_features: Vec<String>,
    pub accessibility: Accessibility,
    pub main_roads: Vec<String>,
    pub distance_to_capital_km: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    #[default]
    #[serde(alias = "vehiculo_propio")]
    OwnVehicle,
    #[serde(alias = "contratado")]
    Hired,
    #[serde(alias = "cooperativa")]
    Cooperative,
    #[serde(alias = "publico")]
    Public,
    #[serde(alias = "mixto")]
    Mixed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFrequency {
    #[serde(alias = "diario")]
    Daily,
    #[default]
    #[serde(alias = "semanal")]
    Weekly,
    #[serde(alias = "quincenal")]
    Biweekly,
    #[serde(alias = "mensual")]
    Monthly,
    #[serde(alias = "por_demanda")]
    OnDemand,
}

/// How goods move in and out of a record's location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logistics {
    pub main_transport: TransportMode,
    pub vehicles: Vec<String>,
    pub load_capacity_kg: f64,
    pub frequency: TransportFrequency,
    /// Roads whose closure stops the operation.
    pub critical_routes: Vec<String>,
    pub backup_transport: String,
    pub monthly_transport_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// Everything the multi-step crop form collects.
///
/// Categorical fields stay free text: the form offers fixed choices plus
/// "otro", and scoring falls back to default weights for values it doesn't know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropForm {
    pub name: String,
    pub crop_type: String,
    pub variety: String,
    pub planting_date: Option<NaiveDate>,
    pub expected_harvest_date: Option<NaiveDate>,
    pub area_ha: f64,
    pub plot_location: String,
    pub plot_location_other: String,
    pub irrigation_method: String,
    pub irrigation_other: String,
    pub irrigation_frequency: String,
    pub irrigation_time: String,
    pub irrigation_times_per_week: u32,
    pub fertilizer_type: String,
    pub fertilizer_brand: String,
    pub fertilizer_frequency: String,
    pub sustainable_techniques: Vec<String>,
    pub sun_exposure: String,
    pub water_source: String,
    pub soil_type: String,
    pub notes: String,
    pub location: Location,
    pub logistics: Logistics,
    pub target_markets: Vec<String>,
    pub critical_dependencies: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    #[default]
    Seed,
    Germination,
    Growing,
    Flowering,
    Fruiting,
    Harvest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    #[serde(flatten)]
    pub form: CropForm,
    pub growth_stage: GrowthStage,
    pub health: u8,
    pub climate_risk: u8,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub critical_risk: bool,
}

impl Crop {
    /// A freshly planted crop: seed stage, full health.
    pub fn planted(form: CropForm, assessment: &RiskAssessment) -> Self {
        Self {
            form,
            growth_stage: GrowthStage::Seed,
            health: 100,
            climate_risk: assessment.score,
            risk_level: assessment.level,
            critical_risk: assessment.critical,
        }
    }

    /// Share of the planting-to-harvest window elapsed at `today`, 0-100.
    pub fn growth_progress(&self, today: NaiveDate) -> Option<u8> {
        let planted = self.form.planting_date?;
        let harvest = self.form.expected_harvest_date?;
        let total_days = (harvest - planted).num_days();
        if total_days <= 0 {
            return None;
        }
        let elapsed = (today - planted).num_days();
        let pct = (elapsed as f64 / total_days as f64 * 100.0).clamp(0.0, 100.0);
        Some(pct.round() as u8)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierKind {
    #[default]
    #[serde(alias = "semillas")]
    Seeds,
    #[serde(alias = "fertilizantes")]
    Fertilizers,
    #[serde(alias = "pesticidas")]
    Pesticides,
    #[serde(alias = "herramientas")]
    Tools,
    #[serde(alias = "maquinaria")]
    Machinery,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierProduct {
    pub name: String,
    pub price: f64,
    pub unit: String,
    /// 1-5 stars
    pub quality: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Supplier {
    pub name: String,
    pub kind: SupplierKind,
    pub contact: Contact,
    pub products: Vec<SupplierProduct>,
    /// 1-5 stars
    pub reliability: u8,
    pub delivery_time: String,
    pub location: Location,
    pub logistics: Logistics,
    pub coverage_zones: Vec<String>,
    pub backup_suppliers: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerKind {
    #[serde(alias = "mayorista")]
    Wholesaler,
    #[serde(alias = "minorista")]
    Retailer,
    Restaurant,
    #[default]
    #[serde(alias = "mercado_local")]
    LocalMarket,
    #[serde(alias = "exportacion")]
    Export,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseLine {
    pub name: String,
    pub quantity_kg: f64,
    pub price_per_kg: f64,
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub name: String,
    pub kind: CustomerKind,
    pub contact: Contact,
    pub products_of_interest: Vec<String>,
    pub purchases: Vec<PurchaseLine>,
    pub frequency: String,
    /// 1-5 stars
    pub rating: u8,
    pub location: Location,
    pub logistics: Logistics,
    pub distribution_channels: Vec<String>,
    pub alternative_customers: Vec<String>,
}

impl Customer {
    pub fn purchase_volume_kg(&self) -> f64 {
        self.purchases.iter().map(|line| line.quantity_kg).sum()
    }

    pub fn purchase_value(&self) -> f64 {
        self.purchases
            .iter()
            .map(|line| line.quantity_kg * line.price_per_kg)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    #[default]
    #[serde(alias = "agricultor")]
    Farmer,
    #[serde(alias = "operador_maquinaria")]
    MachineryOperator,
    Supervisor,
    #[serde(alias = "veterinario")]
    Veterinarian,
    #[serde(alias = "administrador")]
    Administrator,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    #[serde(alias = "tiempo_completo")]
    FullTime,
    #[serde(alias = "medio_tiempo")]
    PartTime,
    #[serde(alias = "temporal")]
    Seasonal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Worker {
    pub first_name: String,
    pub last_names: String,
    pub role: WorkerRole,
    pub specialty: String,
    pub experience_years: u32,
    pub salary: f64,
    pub contact: Contact,
    pub skills: Vec<String>,
    pub availability: Availability,
    /// 1-5 stars
    pub rating: u8,
    pub location: Location,
    pub logistics: Logistics,
    pub coverage_areas: Vec<String>,
    pub backup_workers: Vec<String>,
}

impl Worker {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_names.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseKind {
    #[default]
    #[serde(alias = "productos_agricolas")]
    Produce,
    #[serde(alias = "semillas")]
    Seeds,
    #[serde(alias = "fertilizantes")]
    Fertilizers,
    #[serde(alias = "herramientas")]
    Tools,
    #[serde(alias = "maquinaria")]
    Machinery,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub received_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub value: f64,
    pub hectares: f64,
    pub origin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Warehouse {
    pub name: String,
    pub kind: WarehouseKind,
    pub total_capacity: f64,
    pub used_capacity: f64,
    pub location: Location,
    pub temperature_control: bool,
    pub humidity_control: bool,
    pub items: Vec<StoredItem>,
    pub logistics: Logistics,
    pub backup_warehouses: Vec<String>,
    pub distribution_routes: Vec<String>,
}

impl Warehouse {
    /// Used share of capacity, rounded and capped at 100.
    pub fn usage_percent(&self) -> u8 {
        if self.total_capacity <= 0.0 {
            return 0;
        }
        let pct = (self.used_capacity / self.total_capacity * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservoirKind {
    Natural,
    #[default]
    Artificial,
    #[serde(alias = "pozo")]
    Well,
    #[serde(alias = "rio")]
    River,
    #[serde(alias = "lago")]
    Lake,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterQuality {
    #[serde(alias = "excelente")]
    Excellent,
    #[default]
    #[serde(alias = "buena")]
    Good,
    #[serde(alias = "regular")]
    Fair,
    #[serde(alias = "mala")]
    Poor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conveyance {
    #[default]
    #[serde(alias = "gravedad")]
    Gravity,
    #[serde(alias = "bombeo")]
    Pumped,
    #[serde(alias = "mixto")]
    Mixed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reservoir {
    pub name: String,
    pub kind: ReservoirKind,
    pub capacity_liters: f64,
    /// Percent of capacity currently held.
    pub current_level_pct: f64,
    pub water_quality: WaterQuality,
    pub irrigation_systems: Vec<String>,
    pub maintenance_cost: f64,
    pub location: Location,
    /// Plots this reservoir irrigates.
    pub distribution_network: Vec<String>,
    pub backup_sources: Vec<String>,
    pub conveyance: Conveyance,
}

impl Reservoir {
    /// Water currently held, from capacity and fill level.
    pub fn stored_liters(&self) -> f64 {
        self.capacity_liters * self.current_level_pct.clamp(0.0, 100.0) / 100.0
    }
}
