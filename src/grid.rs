//! Farm layout grid: one cell per position, each holding at most one record

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{Crop, Customer, Reservoir, Supplier, Warehouse, Worker};

/// Largest number of rows or columns a farm may have.
pub const MAX_SIDE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} farm")]
    OutOfBounds {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },
    #[error("unknown cell id '{0}'")]
    UnknownCell(String),
    #[error("a {rows}x{cols} farm is not allowed: each side must be between 1 and {}", MAX_SIDE)]
    InvalidSize { rows: u32, cols: u32 },
}

/// Grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub row: u32,
    pub col: u32,
}

impl CellPos {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    pub fn id(&self) -> String {
        format!("{}-{}", self.row, self.col)
    }
}

impl FromStr for CellPos {
    type Err = GridError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let unknown = || GridError::UnknownCell(id.to_string());
        let (row, col) = id.split_once('-').ok_or_else(unknown)?;
        Ok(Self {
            row: row.trim().parse().map_err(|_| unknown())?,
            col: col.trim().parse().map_err(|_| unknown())?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Crop,
    Supplier,
    Customer,
    Worker,
    Warehouse,
    Reservoir,
    Empty,
}

impl CellKind {
    pub fn label(self) -> &'static str {
        match self {
            CellKind::Crop => "crop",
            CellKind::Supplier => "supplier",
            CellKind::Customer => "customer",
            CellKind::Worker => "worker",
            CellKind::Warehouse => "warehouse",
            CellKind::Reservoir => "reservoir",
            CellKind::Empty => "empty",
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a cell holds. Serializes as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CellContent {
    #[default]
    Empty,
    Crop(Box<Crop>),
    Supplier(Box<Supplier>),
    Customer(Box<Customer>),
    Worker(Box<Worker>),
    Warehouse(Box<Warehouse>),
    Reservoir(Box<Reservoir>),
}

impl CellContent {
    pub fn kind(&self) -> CellKind {
        match self {
            CellContent::Empty => CellKind::Empty,
            CellContent::Crop(_) => CellKind::Crop,
            CellContent::Supplier(_) => CellKind::Supplier,
            CellContent::Customer(_) => CellKind::Customer,
            CellContent::Worker(_) => CellKind::Worker,
            CellContent::Warehouse(_) => CellKind::Warehouse,
            CellContent::Reservoir(_) => CellKind::Reservoir,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }

    /// Display name of the record, if any.
    pub fn name(&self) -> Option<String> {
        match self {
            CellContent::Empty => None,
            CellContent::Crop(crop) => Some(crop.form.name.clone()),
            CellContent::Supplier(supplier) => Some(supplier.name.clone()),
            CellContent::Customer(customer) => Some(customer.name.clone()),
            CellContent::Worker(worker) => Some(worker.full_name()),
            CellContent::Warehouse(warehouse) => Some(warehouse.name.clone()),
            CellContent::Reservoir(reservoir) => Some(reservoir.name.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmCell {
    pub id: String,
    pub row: u32,
    pub col: u32,
    #[serde(flatten)]
    pub content: CellContent,
}

impl FarmCell {
    fn empty(pos: CellPos) -> Self {
        Self {
            id: pos.id(),
            row: pos.row,
            col: pos.col,
            content: CellContent::Empty,
        }
    }

    pub fn pos(&self) -> CellPos {
        CellPos::new(self.row, self.col)
    }

    pub fn kind(&self) -> CellKind {
        self.content.kind()
    }
}

/// Row-major list of cells. Cells are never removed, only reset to empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmGrid {
    rows: u32,
    cols: u32,
    cells: Vec<FarmCell>,
}

impl FarmGrid {
    pub fn new(rows: u32, cols: u32) -> Result<Self, GridError> {
        Self::check_size(rows, cols)?;
        let mut cells = Vec::with_capacity(rows as usize * cols as usize);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(FarmCell::empty(CellPos::new(row, col)));
            }
        }
        Ok(Self { rows, cols, cells })
    }

    /// Both sides must be within `1..=MAX_SIDE`.
    pub fn check_size(rows: u32, cols: u32) -> Result<(), GridError> {
        let side = 1..=MAX_SIDE;
        if side.contains(&rows) && side.contains(&cols) {
            Ok(())
        } else {
            Err(GridError::InvalidSize { rows, cols })
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn cell_count(&self) -> u32 {
        self.cells.len() as u32
    }

    /// Convert a position to its index in the row-major cell list
    pub fn index_of(&self, pos: CellPos) -> Result<usize, GridError> {
        if pos.row < self.rows && pos.col < self.cols {
            Ok(pos.row as usize * self.cols as usize + pos.col as usize)
        } else {
            Err(GridError::OutOfBounds {
                row: pos.row,
                col: pos.col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Convert an index back to its position
    pub fn pos_of(&self, index: usize) -> Option<CellPos> {
        if index < self.cells.len() {
            let index = index as u32;
            Some(CellPos::new(index / self.cols, index % self.cols))
        } else {
            None
        }
    }

    pub fn cell(&self, pos: CellPos) -> Result<&FarmCell, GridError> {
        let index = self.index_of(pos)?;
        Ok(&self.cells[index])
    }

    pub fn cell_by_id(&self, id: &str) -> Result<&FarmCell, GridError> {
        let pos: CellPos = id.parse()?;
        self.cell(pos)
            .map_err(|_| GridError::UnknownCell(id.to_string()))
    }

    pub fn cells(&self) -> &[FarmCell] {
        &self.cells
    }

    /// Replace the type and data of one cell, returning what it held before.
    pub fn place(&mut self, pos: CellPos, content: CellContent) -> Result<CellContent, GridError> {
        let index = self.index_of(pos)?;
        Ok(std::mem::replace(&mut self.cells[index].content, content))
    }

    /// Reset a cell to empty, returning what it held before.
    pub fn reset(&mut self, pos: CellPos) -> Result<CellContent, GridError> {
        self.place(pos, CellContent::Empty)
    }

    pub fn cells_of(&self, kind: CellKind) -> impl Iterator<Item = &FarmCell> {
        self.cells.iter().filter(move |cell| cell.kind() == kind)
    }

    pub fn occupied(&self) -> impl Iterator<Item = &FarmCell> {
        self.cells.iter().filter(|cell| !cell.content.is_empty())
    }

    pub fn crops(&self) -> impl Iterator<Item = &Crop> {
        self.cells.iter().filter_map(|cell| match &cell.content {
            CellContent::Crop(crop) => Some(crop.as_ref()),
            _ => None,
        })
    }

    pub fn stats(&self) -> FarmStats {
        FarmStats::from_grid(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KindCounts {
    pub crops: u32,
    pub suppliers: u32,
    pub customers: u32,
    pub workers: u32,
    pub warehouses: u32,
    pub reservoirs: u32,
}

impl KindCounts {
    fn bump(&mut self, kind: CellKind) {
        match kind {
            CellKind::Crop => self.crops += 1,
            CellKind::Supplier => self.suppliers += 1,
            CellKind::Customer => self.customers += 1,
            CellKind::Worker => self.workers += 1,
            CellKind::Warehouse => self.warehouses += 1,
            CellKind::Reservoir => self.reservoirs += 1,
            CellKind::Empty => {}
        }
    }
}

/// Dashboard totals for the farm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmStats {
    pub counts: KindCounts,
    pub cultivated_area_ha: f64,
    pub purchase_volume_kg: f64,
    pub purchase_value: f64,
    pub storage_capacity: f64,
    pub water_capacity_liters: f64,
    pub stored_water_liters: f64,
    pub occupied: u32,
    pub empty: u32,
    pub occupancy_pct: u8,
    pub mean_climate_risk: Option<f64>,
    pub critical_crops: u32,
}

impl FarmStats {
    pub fn from_grid(grid: &FarmGrid) -> Self {
        let mut stats = FarmStats::default();
        let mut risk_total = 0.0;
        for cell in grid.cells() {
            stats.counts.bump(cell.kind());
            match &cell.content {
                CellContent::Empty => stats.empty += 1,
                CellContent::Crop(crop) => {
                    stats.cultivated_area_ha += crop.form.area_ha;
                    risk_total += f64::from(crop.climate_risk);
                    if crop.critical_risk {
                        stats.critical_crops += 1;
                    }
                }
                CellContent::Customer(customer) => {
                    stats.purchase_volume_kg += customer.purchase_volume_kg();
                    stats.purchase_value += customer.purchase_value();
                }
                CellContent::Warehouse(warehouse) => {
                    stats.storage_capacity += warehouse.total_capacity;
                }
                CellContent::Reservoir(reservoir) => {
                    stats.water_capacity_liters += reservoir.capacity_liters;
                    stats.stored_water_liters += reservoir.stored_liters();
                }
                CellContent::Supplier(_) | CellContent::Worker(_) => {}
            }
        }
        let total = grid.cell_count();
        stats.occupied = total - stats.empty;
        stats.occupancy_pct = if total == 0 {
            0
        } else {
            (f64::from(stats.occupied) / f64::from(total) * 100.0).round() as u8
        };
        if stats.counts.crops > 0 {
            stats.mean_climate_risk = Some(risk_total / f64::from(stats.counts.crops));
        }
        stats
    }
}
