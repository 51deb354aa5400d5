// SPDX-License-Identifier: AGPL-3.0-or-later
//! The two-axis conversions: annotation (inline/crossline) <-> voxel index
//! <-> world CDP. Per-axis conversions live on [`crate::axis::Axis`]
//! itself; this module only holds the affine that mixes both horizontal
//! axes together.

use crate::axis::Axis;
use crate::error::{EngineError, Result};

/// The affine bin grid relating (inline index, crossline index) to CDP
/// (x, y), in the same rotated-strided form as [`crate::surface::RegularSurface`]:
/// `(x, y) = origin + i*(xinc*cos, xinc*sin) + j*(-yinc*sin, yinc*cos)`.
#[derive(Debug, Clone, Copy)]
pub struct BinGrid {
    pub xori: f64,
    pub yori: f64,
    pub xinc: f64,
    pub yinc: f64,
    pub rotation_deg: f64,
}

/// Converts between voxel index, annotation, and world CDP space for the
/// two horizontal axes of a cube.
#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    bingrid: BinGrid,
    inline: Axis,
    crossline: Axis,
}

impl CoordinateTransformer {
    pub fn new(bingrid: BinGrid, inline: Axis, crossline: Axis) -> Self {
        Self {
            bingrid,
            inline,
            crossline,
        }
    }

    pub fn inline_axis(&self) -> &Axis {
        &self.inline
    }

    pub fn crossline_axis(&self) -> &Axis {
        &self.crossline
    }

    /// (inline annotation, crossline annotation) -> (voxel-corner i, voxel-corner j).
    pub fn ilxl_to_ij(&self, inline: f64, crossline: f64) -> (f64, f64) {
        (
            self.inline.index_of_annotation(inline),
            self.crossline.index_of_annotation(crossline),
        )
    }

    /// (voxel-corner i, voxel-corner j) -> (inline annotation, crossline annotation).
    pub fn ij_to_ilxl(&self, i: f64, j: f64) -> (f64, f64) {
        (
            self.inline.annotation_of_voxel(i),
            self.crossline.annotation_of_voxel(j),
        )
    }

    /// (voxel-corner i, voxel-corner j) -> world (x, y).
    pub fn ij_to_cdp(&self, i: f64, j: f64) -> (f64, f64) {
        let theta = self.bingrid.rotation_deg.to_radians();
        let (sin_t, cos_t) = theta.sin_cos();
        let x = self.bingrid.xori + i * self.bingrid.xinc * cos_t - j * self.bingrid.yinc * sin_t;
        let y = self.bingrid.yori + i * self.bingrid.xinc * sin_t + j * self.bingrid.yinc * cos_t;
        (x, y)
    }

    /// World (x, y) -> (voxel-corner i, voxel-corner j); the inverse of
    /// [`Self::ij_to_cdp`], by solving the 2x2 linear system.
    pub fn cdp_to_ij(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let theta = self.bingrid.rotation_deg.to_radians();
        let (sin_t, cos_t) = theta.sin_cos();
        let dx = x - self.bingrid.xori;
        let dy = y - self.bingrid.yori;
        // [ xinc*cos  -yinc*sin ] [i]   [dx]
        // [ xinc*sin   yinc*cos ] [j] = [dy]
        let a = self.bingrid.xinc * cos_t;
        let b = -self.bingrid.yinc * sin_t;
        let c = self.bingrid.xinc * sin_t;
        let d = self.bingrid.yinc * cos_t;
        let det = a * d - b * c;
        if det.abs() < 1e-12 {
            return Err(EngineError::nullptr("bin grid affine is singular"));
        }
        let i = (d * dx - b * dy) / det;
        let j = (a * dy - c * dx) / det;
        Ok((i, j))
    }

    /// (annotation inline, annotation crossline) -> world (x, y), skipping
    /// the intermediate voxel representation.
    pub fn ilxl_to_cdp(&self, inline: f64, crossline: f64) -> (f64, f64) {
        let (i, j) = self.ilxl_to_ij(inline, crossline);
        self.ij_to_cdp(i, j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{AxisAnnotation, Unit};

    fn well_known_transformer() -> CoordinateTransformer {
        let inline = Axis::new(AxisAnnotation::Inline, 1.0, 5.0, 2.0, 3, Unit::Unitless, 2).unwrap();
        let crossline =
            Axis::new(AxisAnnotation::Crossline, 10.0, 11.0, 1.0, 2, Unit::Unitless, 1).unwrap();
        let bingrid = BinGrid {
            xori: 2.0,
            yori: 0.0,
            xinc: 7.2111,
            yinc: 3.6056,
            rotation_deg: 33.69,
        };
        CoordinateTransformer::new(bingrid, inline, crossline)
    }

    #[test]
    fn ij_to_cdp_matches_known_fixture() {
        let t = well_known_transformer();
        let (x, y) = t.ij_to_cdp(1.0, 0.0);
        assert!((x - 8.0).abs() < 1e-2, "x={x}");
        assert!((y - 4.0).abs() < 1e-2, "y={y}");
        let (x, y) = t.ij_to_cdp(1.0, 1.0);
        assert!((x - 6.0).abs() < 1e-2, "x={x}");
        assert!((y - 7.0).abs() < 1e-2, "y={y}");
    }

    #[test]
    fn cdp_round_trips_through_ij() {
        let t = well_known_transformer();
        for (i, j) in [(0.0, 0.0), (1.0, 1.0), (2.0, 0.5), (0.3, 1.7)] {
            let (x, y) = t.ij_to_cdp(i, j);
            let (i2, j2) = t.cdp_to_ij(x, y).unwrap();
            assert!((i - i2).abs() < 1e-9);
            assert!((j - j2).abs() < 1e-9);
        }
    }
}
