// SPDX-License-Identifier: AGPL-3.0-or-later
//! [`QueryEngine`]: orchestrates slice/fence/horizon/attribute queries,
//! chunks work across worker threads, and manages buffer allocation and
//! error propagation. This is the one module every request passes
//! through.

use crate::axis::AxisName;
use crate::config::EngineConfig;
use crate::datahandle::DataHandle;
use crate::datasource::{Interpolation, VoxelBox};
use crate::error::{EngineError, Result};
use crate::horizon::Horizon;
use crate::kernels::Attribute;
use crate::metadata::MetadataHandle;
use crate::response::{AttributeMetadata, AxisMeta, FenceMetadata, SliceMetadata};
use crate::subvolume::{build_subvolume, Bound, Direction};
use crate::surface::RegularSurface;
use crate::window::VerticalWindow;
use rayon::prelude::*;
use std::str::FromStr;

/// The caller-facing coordinate-system token grammar for fence queries:
/// `ij|ilxl|cdp` (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    Index,
    Annotation,
    Cdp,
}

impl FromStr for CoordinateSystem {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ij" => Ok(Self::Index),
            "ilxl" => Ok(Self::Annotation),
            "cdp" => Ok(Self::Cdp),
            other => Err(EngineError::bad_request(format!(
                "unknown coordinate system: {other}"
            ))),
        }
    }
}

pub struct QueryEngine {
    config: EngineConfig,
}

impl QueryEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---------------------------------------------------------------- slice

    pub fn slice(
        &self,
        handle: &DataHandle,
        direction: Direction,
        lineno: f64,
        bounds: &[Bound],
    ) -> Result<(SliceMetadata, Vec<u8>)> {
        let start = std::time::Instant::now();
        let metadata = handle.metadata();
        metadata.validate_vertical_domain(direction)?;

        let axis = metadata.resolve_axis(direction)?;
        let is_index_axis = matches!(direction, AxisName::I | AxisName::J | AxisName::K);
        let lineno_voxel = axis.accept_lineno(lineno, is_index_axis)?;

        let subvol = build_subvolume(metadata, direction, lineno_voxel, bounds)?;
        let size = handle.subvolume_buffer_size(&subvol);
        let mut raw = vec![0f32; size];
        handle.read_subvolume(&mut raw, &subvol)?;

        let (y_dim, x_dim) = plane_dims(direction);
        let extents = subvol.nsamples();
        let data = reorder_2d(&raw, extents, y_dim, x_dim);

        let x_axis = dim_axis(metadata, x_dim);
        let y_axis = dim_axis(metadata, y_dim);
        let geospatial = rectangle_footprint(metadata, &subvol);

        log::debug!(
            "slice direction={direction:?} lineno={lineno} shape=[{},{}] elapsed={:?}",
            extents[y_dim],
            extents[x_dim],
            start.elapsed()
        );

        Ok((
            SliceMetadata {
                format: "<f4",
                shape: [extents[y_dim], extents[x_dim]],
                x: AxisMeta::from(x_axis),
                y: AxisMeta::from(y_axis),
                geospatial,
            },
            crate::response::floats_to_bytes(&data),
        ))
    }

    // ---------------------------------------------------------------- fence

    pub fn fence(
        &self,
        handle: &DataHandle,
        coordinate_system: CoordinateSystem,
        points: &[Vec<f64>],
        interpolation: Interpolation,
        fill_value: Option<f32>,
    ) -> Result<(FenceMetadata, Vec<u8>)> {
        let start = std::time::Instant::now();
        let metadata = handle.metadata();
        let inline_axis = metadata.inline();
        let crossline_axis = metadata.crossline();
        let nsamples = metadata.vertical.nsamples;
        let npoints = points.len();

        let mut corners = Vec::with_capacity(npoints);
        let mut out_of_bounds = vec![false; npoints];

        for (idx, p) in points.iter().enumerate() {
            if p.len() != 2 {
                return Err(EngineError::bad_request(format!(
                    "invalid coordinate {p:?} at position {idx}, expected [x y] pair"
                )));
            }
            let (i, j) = match coordinate_system {
                CoordinateSystem::Index => (p[0], p[1]),
                CoordinateSystem::Annotation => metadata.transformer.ilxl_to_ij(p[0], p[1]),
                CoordinateSystem::Cdp => metadata.transformer.cdp_to_ij(p[0], p[1])?,
            };
            let in_bounds = inline_axis.in_range(i) && crossline_axis.in_range(j);
            if in_bounds {
                corners.push([i, j]);
            } else if let Some(_fv) = fill_value {
                out_of_bounds[idx] = true;
                corners.push([0.0, 0.0]);
            } else {
                let dim = if !inline_axis.in_range(i) { 0 } else { 1 };
                return Err(EngineError::bad_request(format!(
                    "Coordinate ({}, {}) is out of boundaries in dimension {dim}.",
                    p[0], p[1]
                )));
            }
        }

        let mut buf = vec![0f32; npoints * nsamples];
        handle.read_traces(&mut buf, &corners, interpolation)?;

        if let Some(fv) = fill_value {
            for (idx, &oob) in out_of_bounds.iter().enumerate() {
                if oob {
                    buf[idx * nsamples..(idx + 1) * nsamples].fill(fv);
                }
            }
        }

        log::debug!(
            "fence coordinate_system={coordinate_system:?} shape=[{npoints},{nsamples}] elapsed={:?}",
            start.elapsed()
        );

        Ok((
            FenceMetadata {
                format: "<f4",
                shape: [npoints, nsamples],
            },
            crate::response::floats_to_bytes(&buf),
        ))
    }

    // ------------------------------------------------------- horizon sampling

    /// §4.5: dense per-cell traces over a surface's vertical window. Every
    /// cell occupies `window.size()` output positions, fill or not — unlike
    /// the attribute pass (§4.6), which compacts fill cells out of its
    /// working buffer via `Horizon`'s offsets.
    pub fn sample_horizon(
        &self,
        handle: &DataHandle,
        surface: &RegularSurface,
        above: f64,
        below: f64,
        interpolation: Interpolation,
        fill_value: f32,
    ) -> Result<([usize; 3], Vec<u8>)> {
        let start = std::time::Instant::now();
        let metadata = handle.metadata();
        let window = VerticalWindow::squeeze(above, below, metadata.vertical.stepsize);
        let wsize = window.size();
        let hsize = surface.len();

        let mut coords = Vec::with_capacity(hsize * wsize);
        let mut populated = vec![false; hsize];

        for (k, (row, col, value)) in surface.iter_cells().enumerate() {
            let (x, y) = surface.row_col_to_world(row, col);
            let (i, j) = metadata.transformer.cdp_to_ij(x, y)?;
            let inline_axis = metadata.inline();
            let crossline_axis = metadata.crossline();
            if surface.is_fill(value) || !inline_axis.in_range(i) || !crossline_axis.in_range(j) {
                for _ in 0..wsize {
                    coords.push([0.0, 0.0, 0.0]);
                }
                continue;
            }
            populated[k] = true;
            let vertical_corner = metadata.vertical.index_of_annotation(value as f64);
            for slot in 0..wsize {
                let delta_units = window.offset_of_slot(slot);
                let delta_voxels = delta_units / metadata.vertical.stepsize;
                let k_corner = vertical_corner + delta_voxels;
                if !metadata.vertical.in_range(k_corner) {
                    return Err(EngineError::bad_request(format!(
                        "row {row} col {col}: vertical window slot at {k_corner} is out of range [0, {})",
                        metadata.vertical.nsamples
                    )));
                }
                coords.push([i, j, k_corner]);
            }
        }

        let mut buf = vec![0f32; hsize * wsize];
        handle.read_samples(&mut buf, &coords, interpolation)?;

        for (k, &is_populated) in populated.iter().enumerate() {
            if !is_populated {
                buf[k * wsize..(k + 1) * wsize].fill(fill_value);
            }
        }

        log::debug!(
            "sample_horizon shape=[{},{},{wsize}] elapsed={:?}",
            surface.nrows(),
            surface.ncols(),
            start.elapsed()
        );

        Ok((
            [surface.nrows(), surface.ncols(), wsize],
            crate::response::floats_to_bytes(&buf),
        ))
    }

    // ---------------------------------------------------------- attributes

    /// Along-surface mode: one fixed `(above, below)` window per cell,
    /// reference depth is the primary surface's own value.
    pub fn attributes_along_surface(
        &self,
        handle: &DataHandle,
        primary: &RegularSurface,
        above: f64,
        below: f64,
        stepsize: f64,
        attributes: &[Attribute],
        interpolation: Interpolation,
    ) -> Result<(AttributeMetadata, Vec<Vec<u8>>)> {
        let start = std::time::Instant::now();
        let metadata = handle.metadata();
        let source_window = VerticalWindow::squeeze(above, below, metadata.vertical.stepsize);
        let dest_stepsize = if stepsize == 0.0 {
            metadata.vertical.stepsize
        } else {
            stepsize
        };
        let dest_window = VerticalWindow::from_stepsize(above, below, dest_stepsize);

        let populated = self.populated_mask(metadata, primary)?;
        let sizes: Vec<usize> = populated
            .iter()
            .map(|&p| if p { source_window.size() } else { 0 })
            .collect();
        let mut horizon = Horizon::with_sizes(primary.nrows(), primary.ncols(), &sizes);

        self.fetch_horizon_pass(
            handle,
            primary,
            &populated,
            |_row, _col, value| {
                let reference = metadata.vertical.index_of_annotation(value as f64);
                (reference, source_window)
            },
            &mut horizon,
            interpolation,
        )?;

        let maps = self.attribute_pass(
            &horizon,
            attributes,
            primary.fill_value,
            |_k, _raw_len| (source_window, dest_window),
        );

        log::debug!(
            "attributes_along_surface shape=[{},{}] nattributes={} elapsed={:?}",
            primary.nrows(),
            primary.ncols(),
            attributes.len(),
            start.elapsed()
        );

        Ok((
            AttributeMetadata {
                format: "<f4",
                shape: [primary.nrows(), primary.ncols()],
            },
            maps,
        ))
    }

    /// Between-surfaces mode: top/bottom per cell come from min/max of the
    /// (possibly resampled) primary/secondary pair; the window spans
    /// exactly `[top, bottom]` with a cell-varying sample count.
    pub fn attributes_between_surfaces(
        &self,
        handle: &DataHandle,
        primary: &RegularSurface,
        secondary: &RegularSurface,
        stepsize: f64,
        attributes: &[Attribute],
        interpolation: Interpolation,
    ) -> Result<(AttributeMetadata, Vec<Vec<u8>>)> {
        let start = std::time::Instant::now();
        let metadata = handle.metadata();
        let dest_stepsize = if stepsize == 0.0 {
            metadata.vertical.stepsize
        } else {
            stepsize
        };
        let aligned_secondary = if primary.same_grid_as(secondary) {
            secondary.clone()
        } else {
            primary.resample_nearest(secondary)
        };

        let hsize = primary.len();
        let mut primary_above_votes = 0usize;
        let mut secondary_above_votes = 0usize;
        for k in 0..hsize {
            let p = primary.get_flat(k);
            let s = aligned_secondary.get_flat(k);
            if primary.is_fill(p) || aligned_secondary.is_fill(s) {
                continue;
            }
            if p < s {
                primary_above_votes += 1;
            } else if p > s {
                secondary_above_votes += 1;
            }
        }
        let primary_is_top = primary_above_votes >= secondary_above_votes;
        log::debug!(
            "between-surfaces orientation: primary_is_top={primary_is_top} ({primary_above_votes} vs {secondary_above_votes})"
        );

        let mut top_bottom: Vec<Option<(f64, f64)>> = Vec::with_capacity(hsize);
        for k in 0..hsize {
            let p = primary.get_flat(k) as f64;
            let s = aligned_secondary.get_flat(k) as f64;
            let fill = primary.is_fill(p as f32) || aligned_secondary.is_fill(s as f32);
            let mismatched = (primary_is_top && p > s) || (!primary_is_top && p < s);
            if fill || mismatched {
                top_bottom.push(None);
            } else {
                top_bottom.push(Some((p.min(s), p.max(s))));
            }
        }

        let populated: Vec<bool> = top_bottom.iter().map(Option::is_some).collect();
        let sizes: Vec<usize> = top_bottom
            .iter()
            .map(|tb| match tb {
                Some((top, bottom)) => {
                    (((bottom - top) / metadata.vertical.stepsize).round() as usize) + 1
                }
                None => 0,
            })
            .collect();
        let mut horizon = Horizon::with_sizes(primary.nrows(), primary.ncols(), &sizes);

        self.fetch_horizon_pass(
            handle,
            primary,
            &populated,
            |row, col, _value| {
                let k = row * primary.ncols() + col;
                let (top, _bottom) = top_bottom[k].expect("populated cell has a top/bottom span");
                let reference = metadata.vertical.index_of_annotation(top);
                let below_samples = sizes[k] - 1;
                (
                    reference,
                    VerticalWindow {
                        stepsize: metadata.vertical.stepsize,
                        nsamples_above: 0,
                        nsamples_below: below_samples,
                    },
                )
            },
            &mut horizon,
            interpolation,
        )?;

        // Each cell's window spans its own `[top, bottom]` range, so both
        // the source window (already packed at the cube's stepsize, "top"
        // as its reference) and the destination window (the same span
        // resampled at `dest_stepsize`) are derived per cell from the
        // packed window's length rather than shared across the surface —
        // unlike the along-surface path, where one `(above, below)` window
        // applies everywhere.
        let vertical_stepsize = metadata.vertical.stepsize;
        let maps = self.attribute_pass(
            &horizon,
            attributes,
            primary.fill_value,
            |_k, raw_len| {
                let source_window = VerticalWindow {
                    stepsize: vertical_stepsize,
                    nsamples_above: 0,
                    nsamples_below: raw_len - 1,
                };
                let span = (raw_len - 1) as f64 * vertical_stepsize;
                let nsamples_below_dest = (span / dest_stepsize).round().max(0.0) as usize;
                let dest_window = VerticalWindow {
                    stepsize: dest_stepsize,
                    nsamples_above: 0,
                    nsamples_below: nsamples_below_dest,
                };
                (source_window, dest_window)
            },
        );

        log::debug!(
            "attributes_between_surfaces shape=[{},{}] nattributes={} elapsed={:?}",
            primary.nrows(),
            primary.ncols(),
            attributes.len(),
            start.elapsed()
        );

        Ok((
            AttributeMetadata {
                format: "<f4",
                shape: [primary.nrows(), primary.ncols()],
            },
            maps,
        ))
    }

    // ---------------------------------------------------------- internals

    fn populated_mask(&self, metadata: &MetadataHandle, surface: &RegularSurface) -> Result<Vec<bool>> {
        let inline_axis = metadata.inline();
        let crossline_axis = metadata.crossline();
        let mut mask = Vec::with_capacity(surface.len());
        for (row, col, value) in surface.iter_cells() {
            if surface.is_fill(value) {
                mask.push(false);
                continue;
            }
            let (x, y) = surface.row_col_to_world(row, col);
            let (i, j) = metadata.transformer.cdp_to_ij(x, y)?;
            mask.push(inline_axis.in_range(i) && crossline_axis.in_range(j));
        }
        Ok(mask)
    }

    /// The horizon fetch pass: partition `[0, hsize)` into bands and issue
    /// one `read_samples` call per band, writing into `horizon`'s shared
    /// buffer at each cell's precomputed, non-overlapping offset. Bands run
    /// on a bounded worker pool sized `max(1, nrows/2)`, matching §5.
    fn fetch_horizon_pass(
        &self,
        handle: &DataHandle,
        surface: &RegularSurface,
        populated: &[bool],
        window_for_cell: impl Fn(usize, usize, f32) -> (f64, VerticalWindow) + Sync,
        horizon: &mut Horizon,
        interpolation: Interpolation,
    ) -> Result<()> {
        let metadata = handle.metadata();
        let nrows = surface.nrows();
        let ncols = surface.ncols();
        let workers = (nrows / 2).max(self.config.horizon_fetch_min_workers);
        let band_size = nrows.div_ceil(workers).max(1);

        let offsets = horizon.offsets().to_vec();
        let buffer = horizon.buffer_mut();

        let bands: Vec<(usize, usize)> = (0..nrows)
            .step_by(band_size)
            .map(|start| (start, (start + band_size).min(nrows)))
            .collect();

        let results: Vec<Result<Vec<(usize, Vec<f32>)>>> = bands
            .par_iter()
            .map(|&(row_start, row_end)| {
                let mut coords = Vec::new();
                let mut cell_lens = Vec::new();
                for row in row_start..row_end {
                    for col in 0..ncols {
                        let k = row * ncols + col;
                        if !populated[k] {
                            continue;
                        }
                        let value = surface.get(row, col);
                        let (reference, window) = window_for_cell(row, col, value);
                        let (x, y) = surface.row_col_to_world(row, col);
                        let (i, j) = metadata.transformer.cdp_to_ij(x, y)?;
                        let wsize = window.size();
                        for slot in 0..wsize {
                            let delta_units = window.offset_of_slot(slot);
                            let delta_voxels = delta_units / metadata.vertical.stepsize;
                            let k_corner = reference + delta_voxels;
                            if !metadata.vertical.in_range(k_corner) {
                                return Err(EngineError::bad_request(format!(
                                    "row {row} col {col}: vertical window slot at {k_corner} is out of range [0, {})",
                                    metadata.vertical.nsamples
                                )));
                            }
                            coords.push([i, j, k_corner]);
                        }
                        cell_lens.push((k, wsize));
                    }
                }
                let mut buf = vec![0f32; coords.len()];
                handle.read_samples(&mut buf, &coords, interpolation)?;
                let mut out = Vec::with_capacity(cell_lens.len());
                let mut pos = 0;
                for (k, len) in cell_lens {
                    out.push((k, buf[pos..pos + len].to_vec()));
                    pos += len;
                }
                Ok(out)
            })
            .collect();

        for result in results {
            let cells = result.map_err(|err| {
                log::error!("horizon fetch worker failed: {err}");
                err
            })?;
            for (k, values) in cells {
                let (lo, hi) = (offsets[k], offsets[k + 1]);
                buffer[lo..hi].copy_from_slice(&values);
            }
        }
        Ok(())
    }

    /// The attribute pass: for each requested attribute, reduce every
    /// populated cell's window (resampled onto that cell's destination
    /// window) with its kernel; unpopulated cells emit `fill_value`. Runs
    /// across up to `config.attribute_workers` concurrent workers via
    /// `rayon`. `window_spec(k, raw_len)` derives the `(source_window,
    /// dest_window)` pair for cell `k` from its packed window length —
    /// along-surface cells all share one fixed pair, while between-surfaces
    /// cells each span a different `[top, bottom]` range and need their own.
    fn attribute_pass(
        &self,
        horizon: &Horizon,
        attributes: &[Attribute],
        fill_value: f32,
        window_spec: impl Fn(usize, usize) -> (VerticalWindow, VerticalWindow) + Sync,
    ) -> Vec<Vec<u8>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.attribute_workers)
            .build();
        let compute = |attribute: &Attribute| -> Vec<u8> {
            let values: Vec<f32> = (0..horizon.hsize())
                .into_par_iter()
                .map(|k| {
                    let window = horizon.cell_window(k);
                    if window.is_empty() {
                        fill_value
                    } else {
                        let (source_window, dest_window) = window_spec(k, window.len());
                        let resampled = resample_window(window, source_window, dest_window);
                        attribute.apply(&resampled, dest_window.reference_offset())
                    }
                })
                .collect();
            crate::response::floats_to_bytes(&values)
        };
        match pool {
            Ok(pool) => pool.install(|| attributes.iter().map(compute).collect()),
            Err(_) => attributes.iter().map(compute).collect(),
        }
    }
}

/// Linearly resample a densely-sampled `source` window (aligned to
/// `source_window.stepsize`, same size as `source.len()`) onto
/// `dest_window`'s grid. Identity when the two windows coincide.
fn resample_window(source: &[f32], source_window: VerticalWindow, dest_window: VerticalWindow) -> Vec<f32> {
    if source_window.stepsize == dest_window.stepsize
        && source_window.nsamples_above == dest_window.nsamples_above
        && source_window.nsamples_below == dest_window.nsamples_below
    {
        return source.to_vec();
    }
    let src_ref = source_window.reference_offset() as f64;
    (0..dest_window.size())
        .map(|slot| {
            let units = dest_window.offset_of_slot(slot);
            let src_idx = src_ref + units / source_window.stepsize;
            let lo = src_idx.floor().clamp(0.0, (source.len() - 1) as f64);
            let hi = (lo + 1.0).min((source.len() - 1) as f64);
            let frac = (src_idx - lo) as f32;
            let lo = lo as usize;
            let hi = hi as usize;
            source[lo] * (1.0 - frac) + source[hi] * frac
        })
        .collect()
}

/// Which physical dimensions (y, x) a slice's output plane pulls from, per
/// §4.3's plane table.
fn plane_dims(direction: Direction) -> (usize, usize) {
    match direction {
        AxisName::Inline | AxisName::I => (1, 0),
        AxisName::Crossline | AxisName::J => (2, 0),
        AxisName::Depth | AxisName::Time | AxisName::Sample | AxisName::K => (2, 1),
    }
}

fn dim_axis<'a>(metadata: &'a MetadataHandle, dim: usize) -> &'a crate::axis::Axis {
    match dim {
        0 => &metadata.vertical,
        1 => metadata.crossline(),
        _ => metadata.inline(),
    }
}

/// Reorder a row-major `[vertical, crossline, inline]` buffer into row-major
/// `[extents[y_dim], extents[x_dim]]`, dropping the (size-1) pinned
/// dimension implicitly.
fn reorder_2d(raw: &[f32], extents: [usize; 3], y_dim: usize, x_dim: usize) -> Vec<f32> {
    let get = |idx: [usize; 3]| -> f32 {
        let flat = (idx[0] * extents[1] + idx[1]) * extents[2] + idx[2];
        raw[flat]
    };
    let mut out = Vec::with_capacity(extents[y_dim] * extents[x_dim]);
    for y in 0..extents[y_dim] {
        for x in 0..extents[x_dim] {
            let mut idx = [0usize; 3];
            idx[y_dim] = y;
            idx[x_dim] = x;
            out.push(get(idx));
        }
    }
    out
}

/// CDP corners of the reduced voxel-space rectangle spanned by `subvol`'s
/// crossline/inline extent, with consecutive duplicates collapsed (a
/// degenerate, pinned dimension otherwise repeats each corner twice).
fn rectangle_footprint(metadata: &MetadataHandle, subvol: &VoxelBox) -> Vec<[f64; 2]> {
    let cross_lo = subvol.lower[1] as f64;
    let cross_hi = (subvol.upper[1] - 1) as f64;
    let inline_lo = subvol.lower[2] as f64;
    let inline_hi = (subvol.upper[2] - 1) as f64;
    let corners = [
        (inline_lo, cross_lo),
        (inline_hi, cross_lo),
        (inline_hi, cross_hi),
        (inline_lo, cross_hi),
    ];
    let mut out: Vec<[f64; 2]> = Vec::with_capacity(4);
    for (i, j) in corners {
        let (x, y) = metadata.transformer.ij_to_cdp(i, j);
        if out.last() != Some(&[x, y]) {
            out.push([x, y]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::datahandle::DataHandle;
    use crate::testutil::MemoryCube;
    use std::sync::Arc;

    fn well_known_handle() -> DataHandle {
        DataHandle::open(Arc::new(MemoryCube::well_known())).unwrap()
    }

    #[test]
    fn slice_inline_matches_fixture() {
        crate::testutil::init_test_logging();
        let handle = well_known_handle();
        let engine = QueryEngine::new(EngineConfig::default());
        let (meta, data) = engine.slice(&handle, Direction::Inline, 3.0, &[]).unwrap();
        assert_eq!(meta.shape, [2, 4]);
        let floats: &[f32] = bytemuck::cast_slice(&data);
        assert_eq!(floats, &[108.0, 109.0, 110.0, 111.0, 112.0, 113.0, 114.0, 115.0]);
        assert_eq!(meta.geospatial, vec![[8.0, 4.0], [6.0, 7.0]]);
    }

    #[test]
    fn slice_time_with_inline_bound_matches_fixture() {
        let handle = well_known_handle();
        let engine = QueryEngine::new(EngineConfig::default());
        let bounds = [Bound {
            direction: AxisName::Inline,
            lower: 1.0,
            upper: 3.0,
        }];
        let (meta, data) = engine.slice(&handle, Direction::Sample, 8.0, &bounds).unwrap();
        assert_eq!(meta.shape, [2, 2]);
        let floats: &[f32] = bytemuck::cast_slice(&data);
        assert_eq!(floats, &[101.0, 105.0, 109.0, 113.0]);
    }

    #[test]
    fn fence_cdp_matches_fixture() {
        let handle = well_known_handle();
        let engine = QueryEngine::new(EngineConfig::default());
        let points = vec![
            vec![8.0, 4.0],
            vec![6.0, 7.0],
            vec![2.0, 0.0],
            vec![8.0, 4.0],
            vec![14.0, 8.0],
        ];
        let (meta, data) = engine
            .fence(&handle, CoordinateSystem::Cdp, &points, Interpolation::Nearest, None)
            .unwrap();
        assert_eq!(meta.shape, [5, 4]);
        let floats: &[f32] = bytemuck::cast_slice(&data);
        let expected: Vec<f32> = [
            108.0, 109.0, 110.0, 111.0, 112.0, 113.0, 114.0, 115.0, 100.0, 101.0, 102.0, 103.0,
            108.0, 109.0, 110.0, 111.0, 116.0, 117.0, 118.0, 119.0,
        ]
        .to_vec();
        assert_eq!(floats, expected.as_slice());
    }

    #[test]
    fn fence_out_of_bounds_point_fills_without_failing() {
        let handle = well_known_handle();
        let engine = QueryEngine::new(EngineConfig::default());
        let points = vec![vec![8.0, 4.0], vec![1000.0, 1000.0]];
        let (_, data) = engine
            .fence(
                &handle,
                CoordinateSystem::Cdp,
                &points,
                Interpolation::Nearest,
                Some(-999.25),
            )
            .unwrap();
        let floats: &[f32] = bytemuck::cast_slice(&data);
        assert_eq!(&floats[4..8], &[-999.25; 4]);
        assert_eq!(&floats[0..4], &[108.0, 109.0, 110.0, 111.0]);
    }

    #[test]
    fn fence_out_of_bounds_point_without_fill_value_fails() {
        let handle = well_known_handle();
        let engine = QueryEngine::new(EngineConfig::default());
        let points = vec![vec![1000.0, 1000.0]];
        let result = engine.fence(&handle, CoordinateSystem::Cdp, &points, Interpolation::Nearest, None);
        assert!(result.is_err());
    }

    #[test]
    fn fence_rejects_malformed_point() {
        let handle = well_known_handle();
        let engine = QueryEngine::new(EngineConfig::default());
        let points = vec![vec![1.0, 2.0, 3.0]];
        let result = engine.fence(&handle, CoordinateSystem::Index, &points, Interpolation::Nearest, None);
        assert!(result.is_err());
    }

    #[test]
    fn horizon_window_size_one_equals_cube_sample() {
        let handle = well_known_handle();
        let engine = QueryEngine::new(EngineConfig::default());
        let surface = RegularSurface::new(vec![vec![8.0]], 8.0, 4.0, 1.0, 1.0, 0.0, -999.25).unwrap();
        let (shape, data) = engine
            .sample_horizon(&handle, &surface, 0.0, 0.0, Interpolation::Nearest, -999.25)
            .unwrap();
        assert_eq!(shape, [1, 1, 1]);
        let floats: &[f32] = bytemuck::cast_slice(&data);
        assert_eq!(floats, &[109.0]);
    }

    #[test]
    fn fill_cell_propagates_to_every_attribute() {
        let handle = DataHandle::open(Arc::new(MemoryCube::ten_samples())).unwrap();
        let engine = QueryEngine::new(EngineConfig::default());
        let surface = RegularSurface::new(
            vec![vec![20.0, -999.25], vec![20.0, 20.0]],
            1.0,
            1.0,
            1.0,
            1.0,
            0.0,
            -999.25,
        )
        .unwrap();
        let (_, maps) = engine
            .attributes_along_surface(
                &handle,
                &surface,
                8.0,
                8.0,
                4.0,
                &[Attribute::Min, Attribute::Max, Attribute::Mean],
                Interpolation::Nearest,
            )
            .unwrap();
        for map in &maps {
            let floats: &[f32] = bytemuck::cast_slice(map);
            assert_eq!(floats[1], -999.25);
        }
    }

    #[test]
    fn no_populated_cells_yields_fill_everywhere() {
        let handle = DataHandle::open(Arc::new(MemoryCube::ten_samples())).unwrap();
        let engine = QueryEngine::new(EngineConfig::default());
        let surface =
            RegularSurface::new(vec![vec![-999.25, -999.25]], 1.0, 1.0, 1.0, 1.0, 0.0, -999.25)
                .unwrap();
        let (_, maps) = engine
            .attributes_along_surface(
                &handle,
                &surface,
                8.0,
                8.0,
                4.0,
                &[Attribute::Min],
                Interpolation::Nearest,
            )
            .unwrap();
        let floats: &[f32] = bytemuck::cast_slice(&maps[0]);
        assert!(floats.iter().all(|&v| v == -999.25));
    }

    #[test]
    fn between_surfaces_mismatched_cell_becomes_fill() {
        let handle = DataHandle::open(Arc::new(MemoryCube::ten_samples())).unwrap();
        let engine = QueryEngine::new(EngineConfig::default());
        // top (8) everywhere below bottom (28), except the mismatched cell
        // where the pair is reversed relative to that orientation.
        let top = RegularSurface::new(
            vec![vec![8.0, 28.0], vec![8.0, 8.0]],
            1.0,
            1.0,
            1.0,
            1.0,
            0.0,
            -999.25,
        )
        .unwrap();
        let bottom = RegularSurface::new(
            vec![vec![28.0, 8.0], vec![28.0, 28.0]],
            1.0,
            1.0,
            1.0,
            1.0,
            0.0,
            -999.25,
        )
        .unwrap();
        let (_, maps) = engine
            .attributes_between_surfaces(
                &handle,
                &top,
                &bottom,
                4.0,
                &[Attribute::Min],
                Interpolation::Nearest,
            )
            .unwrap();
        let floats: &[f32] = bytemuck::cast_slice(&maps[0]);
        assert_eq!(floats[1], -999.25);
        // The three well-formed cells all resolve (via nearest-neighbour
        // rounding of the unrotated unit bin grid) to the same trace,
        // `values[1][1][k] = 111 + k`. Depth 8 is k=2, depth 28 is k=7, so
        // the naive reference minimum over that [top, bottom] span is
        // `111 + 2 = 113`, not the top sample (`113` as well here, which is
        // why the regression needs the full span: the top-only bug would
        // also report 113 for `Min` but would fail for `Max`/`Mean`).
        assert_eq!(floats[0], 113.0);
        assert_eq!(floats[2], 113.0);
        assert_eq!(floats[3], 113.0);

        let (_, maps) = engine
            .attributes_between_surfaces(
                &handle,
                &top,
                &bottom,
                4.0,
                &[Attribute::Max, Attribute::Mean],
                Interpolation::Nearest,
            )
            .unwrap();
        let max: &[f32] = bytemuck::cast_slice(&maps[0]);
        let mean: &[f32] = bytemuck::cast_slice(&maps[1]);
        // Naive reference over values[1][1][2..=7] = [113,114,115,116,117,118]:
        // a single-top-sample bug would report 113 for both instead.
        assert_eq!(max[0], 118.0);
        assert!((mean[0] - 115.5).abs() < 1e-4);
    }
}
