//! Spatial Cell Grid
//!
//! Deterministic mapping from a normalised (x, y) position to integer
//! (col, row) cells. Several grid resolutions are typically registered at
//! once; every emitted event carries the cell under each of them.

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Named grid resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridResolution {
    Coarse,
    Medium,
    Fine,
    Custom(String),
}

impl GridResolution {
    pub fn name(&self) -> String {
        match self {
            GridResolution::Coarse => "coarse".to_string(),
            GridResolution::Medium => "medium".to_string(),
            GridResolution::Fine => "fine".to_string(),
            GridResolution::Custom(name) => name.clone(),
        }
    }
}

/// One registered grid: a resolution tag plus its dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub resolution: GridResolution,
    pub cols: u32,
    pub rows: u32,
}

impl GridSpec {
    pub fn new(resolution: GridResolution, cols: u32, rows: u32) -> Self {
        Self { resolution, cols, rows }
    }

    /// Cell containing the given position. Coordinates outside [0,1] clamp
    /// to the border cells; `as` casts send NaN to cell 0.
    pub fn cell_of(&self, position: &Vec3) -> GridCell {
        let col = ((position.x * self.cols as f32).floor() as i64)
            .clamp(0, self.cols as i64 - 1) as u32;
        let row = ((position.y * self.rows as f32).floor() as i64)
            .clamp(0, self.rows as i64 - 1) as u32;
        GridCell {
            resolution: self.resolution.clone(),
            col,
            row,
        }
    }
}

/// Integer cell index under one grid resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub resolution: GridResolution,
    pub col: u32,
    pub row: u32,
}

/// The three grids registered by default
pub fn default_grids() -> Vec<GridSpec> {
    vec![
        GridSpec::new(GridResolution::Coarse, 4, 3),
        GridSpec::new(GridResolution::Medium, 8, 6),
        GridSpec::new(GridResolution::Fine, 16, 12),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_mapping() {
        let grid = GridSpec::new(GridResolution::Coarse, 4, 3);
        let cell = grid.cell_of(&Vec3::new(0.5, 0.5, 0.0));
        assert_eq!(cell.col, 2);
        assert_eq!(cell.row, 1);
    }

    #[test]
    fn test_border_clamping() {
        let grid = GridSpec::new(GridResolution::Fine, 16, 12);
        // x = 1.0 would floor to col 16; clamps to the last cell
        let cell = grid.cell_of(&Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(cell.col, 15);
        assert_eq!(cell.row, 11);

        let cell = grid.cell_of(&Vec3::new(-0.2, 2.5, 0.0));
        assert_eq!(cell.col, 0);
        assert_eq!(cell.row, 11);
    }

    #[test]
    fn test_resolution_names() {
        assert_eq!(GridResolution::Coarse.name(), "coarse");
        assert_eq!(GridResolution::Custom("tiles".into()).name(), "tiles");
    }

    #[test]
    fn test_default_grids() {
        let grids = default_grids();
        assert_eq!(grids.len(), 3);
        assert_eq!(grids[0].resolution, GridResolution::Coarse);
    }
}
