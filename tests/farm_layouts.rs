use granja::{
    config::AppConfig,
    grid::{CellKind, CellPos},
    layout::LayoutLoader,
    risk::{RiskLevel, RiskModelKind},
};
use tempfile::tempdir;

fn layout_loader() -> LayoutLoader {
    LayoutLoader::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn bundled_layout_builds_a_scored_farm() {
    let layout = layout_loader()
        .load("layouts/valle_mantaro.yaml")
        .expect("layout should load");
    let farm = layout
        .build_farm(&AppConfig::default())
        .expect("layout should be valid");

    let stats = farm.stats();
    assert_eq!(stats.counts.crops, 2);
    assert_eq!(stats.counts.warehouses, 1);
    assert_eq!(stats.counts.reservoirs, 1);
    assert_eq!(stats.counts.customers, 1);
    assert_eq!(stats.occupied, 5);
    assert_eq!(stats.empty, 20);
    assert_eq!(stats.occupancy_pct, 20);
    assert!((stats.cultivated_area_ha - 1.8).abs() < 1e-9);
    assert_eq!(stats.purchase_volume_kg, 2_500.0);
    assert_eq!(stats.storage_capacity, 8.0);
    assert_eq!(stats.water_capacity_liters, 120_000.0);
    assert_eq!(stats.mean_climate_risk, Some(56.5));
    assert_eq!(stats.critical_crops, 1);

    let crops: Vec<_> = farm.grid().crops().collect();
    assert_eq!(crops[0].climate_risk, 16);
    assert_eq!(crops[0].risk_level, RiskLevel::Low);
    assert_eq!(crops[1].climate_risk, 97);
    assert!(crops[1].critical_risk);
}

#[test]
fn layout_crops_follow_the_configured_model() {
    let layout = layout_loader().load("layouts/valle_mantaro.yaml").unwrap();
    let mut config = AppConfig::default();
    config.risk.model = RiskModelKind::Site;

    let farm = layout.build_farm(&config).unwrap();
    assert_eq!(farm.scorer().model_name(), "site");
    // papa 30, more than 200 km from the capital 20, two techniques -4
    let cell = farm.grid().cell(CellPos::new(0, 0)).unwrap();
    assert_eq!(cell.kind(), CellKind::Crop);
    let crops: Vec<_> = farm.grid().crops().collect();
    assert_eq!(crops[0].climate_risk, 46);
}

#[test]
fn config_file_round_trips_through_disk() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("granja.yaml");

    let mut config = AppConfig::default();
    config.farm.rows = 3;
    config.farm.cols = 4;
    config.risk.model = RiskModelKind::Site;
    config.to_yaml(&path).unwrap();

    let loaded = AppConfig::from_yaml(&path).unwrap();
    assert_eq!(loaded.farm.rows, 3);
    assert_eq!(loaded.risk.model, RiskModelKind::Site);

    let farm = granja::Farm::from_config(&loaded).unwrap();
    assert_eq!(farm.grid().cell_count(), 12);
}

#[test]
fn bundled_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/granja.yaml");
    let config = AppConfig::from_yaml(path).expect("bundled config should load");
    assert_eq!(config.farm.rows, 5);
    assert_eq!(config.risk.model, RiskModelKind::Seasonal);
}
