// SPDX-License-Identifier: AGPL-3.0-or-later
//! [`RegularSurface`]: a rotated, translated, strided 2-D height map over
//! the cube with a fill sentinel, used as the input to horizon sampling
//! and attribute queries.

use crate::error::{EngineError, Result};

#[derive(Debug, Clone)]
pub struct RegularSurface {
    nrows: usize,
    ncols: usize,
    values: Vec<f32>,
    pub xori: f64,
    pub yori: f64,
    pub xinc: f64,
    pub yinc: f64,
    pub rotation_deg: f64,
    pub fill_value: f32,
}

impl RegularSurface {
    pub fn new(
        values: Vec<Vec<f32>>,
        xori: f64,
        yori: f64,
        xinc: f64,
        yinc: f64,
        rotation_deg: f64,
        fill_value: f32,
    ) -> Result<Self> {
        let nrows = values.len();
        if nrows == 0 {
            return Err(EngineError::bad_request("surface has zero rows"));
        }
        let ncols = values[0].len();
        if values.iter().any(|row| row.len() != ncols) {
            return Err(EngineError::bad_request(
                "surface rows must all have equal length",
            ));
        }
        let flat = values.into_iter().flatten().collect();
        Ok(Self {
            nrows,
            ncols,
            values: flat,
            xori,
            yori,
            xinc,
            yinc,
            rotation_deg,
            fill_value,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn len(&self) -> usize {
        self.nrows * self.ncols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.ncols + col]
    }

    #[inline]
    pub fn get_flat(&self, k: usize) -> f32 {
        self.values[k]
    }

    pub fn is_fill(&self, value: f32) -> bool {
        value == self.fill_value || value.is_nan() && self.fill_value.is_nan()
    }

    /// World `(x, y)` for the center of cell `(row, col)`:
    /// `origin + col*(xinc*cos, xinc*sin) + row*(-yinc*sin, yinc*cos)`.
    pub fn row_col_to_world(&self, row: usize, col: usize) -> (f64, f64) {
        let theta = self.rotation_deg.to_radians();
        let (sin_t, cos_t) = theta.sin_cos();
        let i = row as f64;
        let j = col as f64;
        let x = self.xori + j * self.xinc * cos_t - i * self.yinc * sin_t;
        let y = self.yori + j * self.xinc * sin_t + i * self.yinc * cos_t;
        (x, y)
    }

    /// A new surface with every non-fill cell shifted by `delta`
    /// (vertical-axis units); fill cells stay fill.
    pub fn shifted_by(&self, delta: f64) -> Self {
        let values = self
            .values
            .iter()
            .map(|&v| {
                if self.is_fill(v) {
                    self.fill_value
                } else {
                    (v as f64 + delta) as f32
                }
            })
            .collect();
        Self {
            values,
            ..self.clone()
        }
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.nrows).flat_map(move |row| {
            (0..self.ncols).map(move |col| (row, col, self.get(row, col)))
        })
    }

    /// Whether `other` shares this surface's exact grid geometry (used to
    /// decide whether a between-surfaces secondary needs resampling).
    pub fn same_grid_as(&self, other: &Self) -> bool {
        self.nrows == other.nrows
            && self.ncols == other.ncols
            && (self.xori - other.xori).abs() < 1e-9
            && (self.yori - other.yori).abs() < 1e-9
            && (self.xinc - other.xinc).abs() < 1e-9
            && (self.yinc - other.yinc).abs() < 1e-9
            && (self.rotation_deg - other.rotation_deg).abs() < 1e-9
    }

    /// Resample `other` onto this surface's grid by nearest-neighbour
    /// lookup in world space (the documented, implementer-chosen policy
    /// for mismatched between-surfaces grids — see DESIGN.md).
    pub fn resample_nearest(&self, other: &Self) -> Self {
        let mut values = Vec::with_capacity(self.len());
        for row in 0..self.nrows {
            for col in 0..self.ncols {
                let (x, y) = self.row_col_to_world(row, col);
                values.push(other.nearest_value_at(x, y));
            }
        }
        Self {
            nrows: self.nrows,
            ncols: self.ncols,
            values,
            xori: self.xori,
            yori: self.yori,
            xinc: self.xinc,
            yinc: self.yinc,
            rotation_deg: self.rotation_deg,
            fill_value: self.fill_value,
        }
    }

    fn nearest_value_at(&self, x: f64, y: f64) -> f32 {
        let theta = self.rotation_deg.to_radians();
        let (sin_t, cos_t) = theta.sin_cos();
        let dx = x - self.xori;
        let dy = y - self.yori;
        let a = self.xinc * cos_t;
        let b = -self.yinc * sin_t;
        let c = self.xinc * sin_t;
        let d = self.yinc * cos_t;
        let det = a * d - b * c;
        if det.abs() < 1e-12 {
            return self.fill_value;
        }
        let j = (d * dx - b * dy) / det;
        let i = (a * dy - c * dx) / det;
        let row = i.round();
        let col = j.round();
        if row < 0.0 || col < 0.0 || row as usize >= self.nrows || col as usize >= self.ncols {
            return self.fill_value;
        }
        self.get(row as usize, col as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let values = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(RegularSurface::new(values, 0.0, 0.0, 1.0, 1.0, 0.0, -999.25).is_err());
    }

    #[test]
    fn shift_preserves_fill_cells() {
        let values = vec![vec![1.0, -999.25], vec![3.0, 4.0]];
        let surface = RegularSurface::new(values, 0.0, 0.0, 1.0, 1.0, 0.0, -999.25).unwrap();
        let shifted = surface.shifted_by(10.0);
        assert_eq!(shifted.get(0, 1), -999.25);
        assert_eq!(shifted.get(0, 0), 11.0);
    }

    #[test]
    fn world_corners_match_known_fixture() {
        let values = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        let surface =
            RegularSurface::new(values, 2.0, 0.0, 7.2111, 3.6056, 33.69, -999.25).unwrap();
        let (x, y) = surface.row_col_to_world(1, 0);
        assert!((x - 8.0).abs() < 1e-2, "x={x}");
        assert!((y - 4.0).abs() < 1e-2, "y={y}");
    }
}
