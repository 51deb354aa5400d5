// SPDX-License-Identifier: AGPL-3.0-or-later
//! An in-memory, row-major `f32` cube implementing [`VolumeDataSource`]
//! directly, used by this crate's own tests and doctests so the engine
//! never special-cases its own test fixture. Not part of the public
//! surface a production caller is expected to depend on for real data —
//! a real backing implementation talks to an object store.

use crate::axis::{AxisAnnotation, Unit};
use crate::datasource::{AxisLayout, CubeLayout, Interpolation, VolumeDataSource, VoxelBox};
use crate::error::DataSourceError;
use crate::transformer::BinGrid;

/// Installs `env_logger` once so a test can opt into seeing the engine's
/// `log::debug!` request-lifecycle output by setting `RUST_LOG=debug`.
/// Safe to call from every test; later calls are no-ops.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `values[i][j][k]`, flattened row-major with `i` (inline) slowest and
/// `k` (vertical) fastest — the opposite nesting from [`VoxelBox`]'s
/// `[vertical, crossline, inline]` dimension order, so reads transpose on
/// the way out.
pub struct MemoryCube {
    pub vertical: AxisLayout,
    pub crossline: AxisLayout,
    pub inline: AxisLayout,
    pub bingrid: BinGrid,
    pub crs: String,
    pub input_file_name: String,
    pub import_time_stamp: String,
    values: Vec<f32>,
}

impl MemoryCube {
    pub fn new(
        vertical: AxisLayout,
        crossline: AxisLayout,
        inline: AxisLayout,
        bingrid: BinGrid,
        crs: impl Into<String>,
        input_file_name: impl Into<String>,
        import_time_stamp: impl Into<String>,
        values: Vec<f32>,
    ) -> Self {
        assert_eq!(values.len(), inline.nsamples * crossline.nsamples * vertical.nsamples);
        Self {
            vertical,
            crossline,
            inline,
            bingrid,
            crs: crs.into(),
            input_file_name: input_file_name.into(),
            import_time_stamp: import_time_stamp.into(),
            values,
        }
    }

    /// The 3x2x4 fixture cube from the design's end-to-end scenarios:
    /// `values[i][j][k] = 100 + 8*i + 4*j + k`, inline {1,3,5}, crossline
    /// {10,11}, sample {4,8,12,16}, bingrid xori=2 yori=0 xinc=7.2111
    /// yinc=3.6056 rot=33.69deg.
    pub fn well_known() -> Self {
        let inline = AxisLayout {
            annotation: AxisAnnotation::Inline,
            min: 1.0,
            max: 5.0,
            stepsize: 2.0,
            nsamples: 3,
            unit: Unit::Unitless,
        };
        let crossline = AxisLayout {
            annotation: AxisAnnotation::Crossline,
            min: 10.0,
            max: 11.0,
            stepsize: 1.0,
            nsamples: 2,
            unit: Unit::Unitless,
        };
        let vertical = AxisLayout {
            annotation: AxisAnnotation::Sample,
            min: 4.0,
            max: 16.0,
            stepsize: 4.0,
            nsamples: 4,
            unit: Unit::Unitless,
        };
        let mut values = Vec::with_capacity(3 * 2 * 4);
        for i in 0..3 {
            for j in 0..2 {
                for k in 0..4 {
                    values.push(100.0 + 8.0 * i as f32 + 4.0 * j as f32 + k as f32);
                }
            }
        }
        let bingrid = BinGrid {
            xori: 2.0,
            yori: 0.0,
            xinc: 7.2111,
            yinc: 3.6056,
            rotation_deg: 33.69,
        };
        Self::new(
            vertical,
            crossline,
            inline,
            bingrid,
            "well_known_crs",
            "well_known",
            "2020-01-01T00:00:00Z",
            values,
        )
    }

    /// A cube with ten Depth samples (meters), stepsize 4, over a small
    /// 2x2x2 horizontal grid and an identity (unrotated, unit-increment,
    /// origin-zero) bin grid so annotation and CDP coincide — used by the
    /// attribute-query tests.
    pub fn ten_samples() -> Self {
        let inline = AxisLayout {
            annotation: AxisAnnotation::Inline,
            min: 1.0,
            max: 2.0,
            stepsize: 1.0,
            nsamples: 2,
            unit: Unit::Unitless,
        };
        let crossline = AxisLayout {
            annotation: AxisAnnotation::Crossline,
            min: 1.0,
            max: 2.0,
            stepsize: 1.0,
            nsamples: 2,
            unit: Unit::Unitless,
        };
        let vertical = AxisLayout {
            annotation: AxisAnnotation::Depth,
            min: 0.0,
            max: 36.0,
            stepsize: 4.0,
            nsamples: 10,
            unit: Unit::Meter,
        };
        let mut values = Vec::with_capacity(2 * 2 * 10);
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..10 {
                    values.push(1.0 + 100.0 * i as f32 + 10.0 * j as f32 + k as f32);
                }
            }
        }
        let bingrid = BinGrid {
            xori: 0.0,
            yori: 0.0,
            xinc: 1.0,
            yinc: 1.0,
            rotation_deg: 0.0,
        };
        Self::new(
            vertical,
            crossline,
            inline,
            bingrid,
            "ten_samples_crs",
            "10_samples",
            "2020-01-01T00:00:00Z",
            values,
        )
    }

    #[inline]
    fn at(&self, i: usize, j: usize, k: usize) -> f32 {
        self.values[(i * self.crossline.nsamples + j) * self.vertical.nsamples + k]
    }

    fn nearest_index(center: f64, nsamples: usize) -> usize {
        let corner = center - 0.5;
        corner.round().clamp(0.0, (nsamples - 1) as f64) as usize
    }

    fn floor_weight(center: f64, nsamples: usize) -> (usize, usize, f64) {
        let corner = (center - 0.5).clamp(0.0, (nsamples - 1) as f64);
        let lo = corner.floor() as usize;
        let hi = (lo + 1).min(nsamples - 1);
        let frac = corner - lo as f64;
        (lo, hi, frac)
    }

    fn sample_trilinear(&self, i: f64, j: f64, k: f64) -> f32 {
        let (i0, i1, fi) = Self::floor_weight(i, self.inline.nsamples);
        let (j0, j1, fj) = Self::floor_weight(j, self.crossline.nsamples);
        let (k0, k1, fk) = Self::floor_weight(k, self.vertical.nsamples);
        let c000 = self.at(i0, j0, k0) as f64;
        let c100 = self.at(i1, j0, k0) as f64;
        let c010 = self.at(i0, j1, k0) as f64;
        let c110 = self.at(i1, j1, k0) as f64;
        let c001 = self.at(i0, j0, k1) as f64;
        let c101 = self.at(i1, j0, k1) as f64;
        let c011 = self.at(i0, j1, k1) as f64;
        let c111 = self.at(i1, j1, k1) as f64;
        let c00 = c000 * (1.0 - fi) + c100 * fi;
        let c10 = c010 * (1.0 - fi) + c110 * fi;
        let c01 = c001 * (1.0 - fi) + c101 * fi;
        let c11 = c011 * (1.0 - fi) + c111 * fi;
        let c0 = c00 * (1.0 - fj) + c10 * fj;
        let c1 = c01 * (1.0 - fj) + c11 * fj;
        (c0 * (1.0 - fk) + c1 * fk) as f32
    }

    fn sample_bilinear_column(&self, i: f64, j: f64, k: usize) -> f32 {
        let (i0, i1, fi) = Self::floor_weight(i, self.inline.nsamples);
        let (j0, j1, fj) = Self::floor_weight(j, self.crossline.nsamples);
        let c00 = self.at(i0, j0, k) as f64;
        let c10 = self.at(i1, j0, k) as f64;
        let c01 = self.at(i0, j1, k) as f64;
        let c11 = self.at(i1, j1, k) as f64;
        let c0 = c00 * (1.0 - fi) + c10 * fi;
        let c1 = c01 * (1.0 - fi) + c11 * fi;
        (c0 * (1.0 - fj) + c1 * fj) as f32
    }
}

impl VolumeDataSource for MemoryCube {
    fn layout(&self) -> Result<CubeLayout, DataSourceError> {
        Ok(CubeLayout {
            vertical: self.vertical.clone(),
            crossline: self.crossline.clone(),
            inline: self.inline.clone(),
            bingrid: self.bingrid,
            crs: self.crs.clone(),
            input_file_name: self.input_file_name.clone(),
            import_time_stamp: self.import_time_stamp.clone(),
        })
    }

    fn read_subvolume(&self, buf: &mut [f32], region: &VoxelBox) -> Result<(), DataSourceError> {
        let mut idx = 0;
        for vert in region.lower[0]..region.upper[0] {
            for cross in region.lower[1]..region.upper[1] {
                for inline in region.lower[2]..region.upper[2] {
                    buf[idx] = self.at(inline as usize, cross as usize, vert as usize);
                    idx += 1;
                }
            }
        }
        Ok(())
    }

    fn read_traces(
        &self,
        buf: &mut [f32],
        coords: &[[f64; 2]],
        interpolation: Interpolation,
    ) -> Result<(), DataSourceError> {
        let nsamples = self.vertical.nsamples;
        for (point_idx, &[i, j]) in coords.iter().enumerate() {
            for k in 0..nsamples {
                let value = match interpolation {
                    Interpolation::Nearest | Interpolation::Angular => {
                        let i0 = Self::nearest_index(i, self.inline.nsamples);
                        let j0 = Self::nearest_index(j, self.crossline.nsamples);
                        self.at(i0, j0, k)
                    }
                    _ => self.sample_bilinear_column(i, j, k),
                };
                buf[point_idx * nsamples + k] = value;
            }
        }
        Ok(())
    }

    fn read_samples(
        &self,
        buf: &mut [f32],
        coords: &[[f64; 3]],
        interpolation: Interpolation,
    ) -> Result<(), DataSourceError> {
        for (idx, &[i, j, k]) in coords.iter().enumerate() {
            buf[idx] = match interpolation {
                Interpolation::Nearest | Interpolation::Angular => {
                    let i0 = Self::nearest_index(i, self.inline.nsamples);
                    let j0 = Self::nearest_index(j, self.crossline.nsamples);
                    let k0 = Self::nearest_index(k, self.vertical.nsamples);
                    self.at(i0, j0, k0)
                }
                _ => self.sample_trilinear(i, j, k),
            };
        }
        Ok(())
    }
}
