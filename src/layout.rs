use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::config::AppConfig;
use crate::farm::{CellInput, Farm, FarmError};
use crate::grid::{CellPos, FarmGrid};
use crate::risk::RiskScorer;

/// A saved farm arrangement: grid size plus the records to place.
#[derive(Debug, Clone, Deserialize)]
pub struct Layout {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub rows: Option<u32>,
    #[serde(default)]
    pub cols: Option<u32>,
    #[serde(default)]
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Placement {
    pub row: u32,
    pub col: u32,
    #[serde(flatten)]
    pub input: CellInput,
}

pub struct LayoutLoader {
    base_dir: PathBuf,
}

impl LayoutLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Layout> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read layout file {}", path.display()))?;
        let layout: Layout = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(layout)
    }

    /// YAML files in the base directory, sorted by name.
    pub fn available(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.base_dir).with_context(|| {
            format!("Failed to list layouts in {}", self.base_dir.display())
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext == "yaml" || ext == "yml");
            if is_yaml {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Layout {
    /// Build a farm from this layout. Crops are validated and scored on load;
    /// a bad grid size or the first invalid placement aborts the build.
    pub fn build_farm(&self, config: &AppConfig) -> Result<Farm, FarmError> {
        let grid = FarmGrid::new(
            self.rows.unwrap_or(config.farm.rows),
            self.cols.unwrap_or(config.farm.cols),
        )?;
        let mut farm = Farm::new(grid, RiskScorer::from_config(&config.risk));
        for placement in &self.placements {
            farm.save(
                CellPos::new(placement.row, placement.col),
                placement.input.clone(),
            )?;
        }
        info!(
            layout = %self.name,
            placements = self.placements.len(),
            "layout loaded"
        );
        Ok(farm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridError;

    const SMALL_LAYOUT: &str = r#"
name: Chacra de prueba
rows: 2
cols: 3
placements:
  - row: 0
    col: 2
    type: reservoir
    data:
      name: Qocha
      capacity_liters: 50000
      current_level_pct: 40
  - row: 1
    col: 0
    type: worker
    data:
      first_name: Rosa
      last_names: Quispe Mamani
"#;

    #[test]
    fn layout_places_records_on_a_sized_grid() {
        let layout: Layout = serde_yaml::from_str(SMALL_LAYOUT).unwrap();
        let farm = layout.build_farm(&AppConfig::default()).unwrap();

        assert_eq!(farm.grid().rows(), 2);
        assert_eq!(farm.grid().cols(), 3);
        let stats = farm.stats();
        assert_eq!(stats.counts.reservoirs, 1);
        assert_eq!(stats.counts.workers, 1);
        assert_eq!(stats.water_capacity_liters, 50_000.0);
        assert_eq!(stats.stored_water_liters, 20_000.0);
    }

    #[test]
    fn placement_outside_the_grid_fails() {
        let mut layout: Layout = serde_yaml::from_str(SMALL_LAYOUT).unwrap();
        layout.placements[0].row = 5;
        assert!(matches!(
            layout.build_farm(&AppConfig::default()),
            Err(FarmError::Grid(_))
        ));
    }

    #[test]
    fn layout_grid_size_is_checked() {
        let mut layout: Layout = serde_yaml::from_str(SMALL_LAYOUT).unwrap();
        layout.rows = Some(70_000);
        layout.cols = Some(70_000);
        assert!(matches!(
            layout.build_farm(&AppConfig::default()),
            Err(FarmError::Grid(GridError::InvalidSize { .. }))
        ));

        layout.rows = Some(0);
        layout.cols = None;
        assert!(matches!(
            layout.build_farm(&AppConfig::default()),
            Err(FarmError::Grid(GridError::InvalidSize { rows: 0, cols: 5 }))
        ));
    }

    #[test]
    fn loader_reads_and_lists_layout_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("chacra.yaml"), SMALL_LAYOUT).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loader = LayoutLoader::new(dir.path());
        let files = loader.available().unwrap();
        assert_eq!(files.len(), 1);

        let layout = loader.load("chacra.yaml").unwrap();
        assert_eq!(layout.name, "Chacra de prueba");
        assert!(loader.load("missing.yaml").is_err());
    }
}
