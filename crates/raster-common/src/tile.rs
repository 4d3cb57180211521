//! Tiling of a union extent into a regular grid.

use serde::{Deserialize, Serialize};

use crate::extent::Extent;

/// One cell of a regular grid partitioning a union extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Identifier "row-col", 1-based, zero-padded.
    pub id: String,
    /// Grid row (1-based, counted from the union origin corner).
    pub row: usize,
    /// Grid column (1-based).
    pub col: usize,
    /// Tile bounds, clipped to the union extent at the upper edges.
    pub extent: Extent,
}

/// An ordered, row-major sequence of tiles covering a union extent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    pub union: Extent,
    pub tiles: Vec<Tile>,
}

#[derive(Debug, thiserror::Error)]
pub enum TileGridError {
    #[error("extent and resolution do not produce an integral grid: {0}")]
    NonIntegralGrid(String),
}

impl TileGrid {
    /// Partition `union` into tiles of nominal size `tile_w` x `tile_h`
    /// (CRS units).
    ///
    /// Fails when the union width or height is not a whole number of pixels
    /// at `resolution`. Tiles are laid out row-major from the union origin
    /// corner; the final row and column may be partial.
    pub fn build(
        union: &Extent,
        tile_w: f64,
        tile_h: f64,
        resolution: f64,
    ) -> Result<TileGrid, TileGridError> {
        let w = union.width() / resolution;
        let h = union.height() / resolution;
        if w.fract() != 0.0 || h.fract() != 0.0 {
            return Err(TileGridError::NonIntegralGrid(format!(
                "{:.3} x {:.3} pixels at resolution {}",
                w, h, resolution
            )));
        }

        let ncols = (union.width() / tile_w).ceil() as usize;
        let nrows = (union.height() / tile_h).ceil() as usize;

        let mut tiles = Vec::with_capacity(nrows * ncols);
        for j in 0..nrows {
            let ymin = union.ymin + j as f64 * tile_h;
            let ymax = (ymin + tile_h).min(union.ymax);
            for i in 0..ncols {
                let xmin = union.xmin + i as f64 * tile_w;
                let xmax = (xmin + tile_w).min(union.xmax);

                tiles.push(Tile {
                    id: format!("{:02}-{:02}", j + 1, i + 1),
                    row: j + 1,
                    col: i + 1,
                    extent: Extent::new(xmin, ymin, xmax, ymax),
                });
            }
        }

        Ok(TileGrid {
            union: *union,
            tiles,
        })
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tile> {
        self.tiles.iter()
    }

    /// JSON manifest of the grid, for downstream batch tooling.
    pub fn manifest_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_ids_and_order() {
        let union = Extent::new(0.0, 0.0, 120.0, 60.0);
        let grid = TileGrid::build(&union, 60.0, 30.0, 30.0).unwrap();

        assert_eq!(grid.len(), 4);
        let ids: Vec<&str> = grid.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["01-01", "01-02", "02-01", "02-02"]);
    }

    #[test]
    fn test_partial_edge_tiles_are_clipped() {
        let union = Extent::new(0.0, 0.0, 100.0, 70.0);
        let grid = TileGrid::build(&union, 60.0, 60.0, 10.0).unwrap();

        assert_eq!(grid.len(), 4);
        // last column clipped at xmax, last row at ymax
        assert_eq!(grid.tiles[1].extent.xmax, 100.0);
        assert_eq!(grid.tiles[3].extent.ymax, 70.0);
        assert_eq!(grid.tiles[3].extent, Extent::new(60.0, 60.0, 100.0, 70.0));
    }

    #[test]
    fn test_non_integral_grid_rejected() {
        // width fails: 100 / 30 is not whole
        let union = Extent::new(0.0, 0.0, 100.0, 60.0);
        assert!(TileGrid::build(&union, 50.0, 30.0, 30.0).is_err());

        // height alone failing is also an error
        let union = Extent::new(0.0, 0.0, 90.0, 70.0);
        assert!(TileGrid::build(&union, 30.0, 30.0, 30.0).is_err());
    }
}
