// SPDX-License-Identifier: AGPL-3.0-or-later
//! The seam between this crate and whatever backing library actually owns
//! bytes on an object store. A caller plugs in a [`VolumeDataSource`]; this
//! crate ships only the in-memory reference implementation in
//! [`crate::testutil`] used by its own tests and doctests.

use crate::error::{DataSourceError, EngineError};
use std::str::FromStr;

/// Interpolation kernel used by a voxel/trace/sample fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    #[default]
    Nearest,
    Linear,
    Cubic,
    Angular,
    Triangular,
}

impl FromStr for Interpolation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            "cubic" => Ok(Self::Cubic),
            "angular" => Ok(Self::Angular),
            "triangular" => Ok(Self::Triangular),
            other => Err(EngineError::bad_request(format!(
                "unknown interpolation method: {other}"
            ))),
        }
    }
}

/// Per-axis layout fields a backing library reports about an opened cube.
#[derive(Debug, Clone)]
pub struct AxisLayout {
    pub annotation: crate::axis::AxisAnnotation,
    pub min: f64,
    pub max: f64,
    pub stepsize: f64,
    pub nsamples: usize,
    pub unit: crate::axis::Unit,
}

/// Everything [`crate::datahandle::DataHandle::open`] needs to build a
/// [`crate::metadata::MetadataHandle`]. Axis zero is always the vertical
/// axis; axes one and two are crossline and inline, matching how the
/// original layout reports them.
#[derive(Debug, Clone)]
pub struct CubeLayout {
    pub vertical: AxisLayout,
    pub crossline: AxisLayout,
    pub inline: AxisLayout,
    pub bingrid: crate::transformer::BinGrid,
    pub crs: String,
    pub input_file_name: String,
    pub import_time_stamp: String,
}

/// A rectangular voxel-space region, `[lower, upper)` per dimension, in the
/// dimension order `[vertical, crossline, inline]`.
#[derive(Debug, Clone, Copy)]
pub struct VoxelBox {
    pub lower: [i64; 3],
    pub upper: [i64; 3],
}

impl VoxelBox {
    pub fn nsamples(&self) -> [usize; 3] {
        std::array::from_fn(|d| (self.upper[d] - self.lower[d]).max(0) as usize)
    }

    pub fn total_samples(&self) -> usize {
        self.nsamples().iter().product()
    }
}

/// The trait a backing object-store reader implements to plug into this
/// crate; analogous to the original's external volume-data I/O library
/// contract. All reads request 32-bit float format at level-of-detail 0,
/// channel Sample; coordinates are always **voxel-center** positions — the
/// engine, not the implementor, is responsible for the +0.5 shift.
pub trait VolumeDataSource: Send + Sync {
    fn layout(&self) -> Result<CubeLayout, DataSourceError>;

    fn subvolume_buffer_size(&self, region: &VoxelBox) -> usize {
        region.total_samples()
    }

    /// Fill `buf` (row-major over `[vertical, crossline, inline]`) with the
    /// cube samples covering `region`.
    fn read_subvolume(&self, buf: &mut [f32], region: &VoxelBox) -> Result<(), DataSourceError>;

    fn traces_buffer_size(&self, ntraces: usize, nsamples: usize) -> usize {
        ntraces * nsamples
    }

    /// One trace of `nsamples` vertical-axis values per `(inline, crossline)`
    /// voxel-center coordinate in `coords`.
    fn read_traces(
        &self,
        buf: &mut [f32],
        coords: &[[f64; 2]],
        interpolation: Interpolation,
    ) -> Result<(), DataSourceError>;

    fn samples_buffer_size(&self, nsamples: usize) -> usize {
        nsamples
    }

    /// One interpolated sample per full `(inline, crossline, vertical)`
    /// voxel-center coordinate in `coords`.
    fn read_samples(
        &self,
        buf: &mut [f32],
        coords: &[[f64; 3]],
        interpolation: Interpolation,
    ) -> Result<(), DataSourceError>;
}
