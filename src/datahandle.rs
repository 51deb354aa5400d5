// SPDX-License-Identifier: AGPL-3.0-or-later
//! Opens a cube and performs interpolated voxel/trace/sample fetches,
//! wrapping the external [`VolumeDataSource`] and owning the single
//! load-bearing invariant of this crate: every coordinate handed to the
//! backing source is a voxel *center*, never a corner.

use crate::axis::{Axis, AxisAnnotation};
use crate::datasource::{CubeLayout, Interpolation, VoxelBox, VolumeDataSource};
use crate::error::Result;
use crate::metadata::MetadataHandle;
use crate::transformer::CoordinateTransformer;
use std::sync::Arc;

/// Shift a voxel-corner coordinate to the voxel-center convention the
/// backing source expects. Centralised here so no call site has to repeat
/// the `+0.5` literal.
#[inline]
pub fn corner_to_center(corner: f64) -> f64 {
    corner + 0.5
}

pub struct DataHandle {
    source: Arc<dyn VolumeDataSource>,
    metadata: MetadataHandle,
}

impl DataHandle {
    /// Open a cube from an already-constructed source, validating that the
    /// layout it reports is exactly three-dimensional (enforced implicitly
    /// by [`CubeLayout`]'s shape) and building the [`MetadataHandle`].
    pub fn open(source: Arc<dyn VolumeDataSource>) -> Result<Self> {
        let layout: CubeLayout = source.layout()?;
        let vertical = Axis::new(
            layout.vertical.annotation,
            layout.vertical.min,
            layout.vertical.max,
            layout.vertical.stepsize,
            layout.vertical.nsamples,
            layout.vertical.unit,
            0,
        )?;
        let crossline = Axis::new(
            AxisAnnotation::Crossline,
            layout.crossline.min,
            layout.crossline.max,
            layout.crossline.stepsize,
            layout.crossline.nsamples,
            layout.crossline.unit,
            1,
        )?;
        let inline = Axis::new(
            AxisAnnotation::Inline,
            layout.inline.min,
            layout.inline.max,
            layout.inline.stepsize,
            layout.inline.nsamples,
            layout.inline.unit,
            2,
        )?;
        let transformer = CoordinateTransformer::new(layout.bingrid, inline, crossline);
        let metadata = MetadataHandle::new(
            vertical,
            transformer,
            layout.crs,
            layout.input_file_name,
            layout.import_time_stamp,
        );
        Ok(Self { source, metadata })
    }

    pub fn metadata(&self) -> &MetadataHandle {
        &self.metadata
    }

    /// The §6 "Cube" metadata shape: CRS, provenance, bounding box in all
    /// three coordinate systems, and the three axes, ready to serialise.
    pub fn cube_metadata(&self) -> crate::response::CubeMetadata {
        crate::response::CubeMetadata::from(&self.metadata)
    }

    pub fn subvolume_buffer_size(&self, region: &VoxelBox) -> usize {
        self.source.subvolume_buffer_size(region)
    }

    pub fn read_subvolume(&self, buf: &mut [f32], region: &VoxelBox) -> Result<()> {
        self.source.read_subvolume(buf, region)?;
        Ok(())
    }

    /// `coords` are voxel-corner `(inline, crossline)` pairs; shifted to
    /// centers before the fetch.
    pub fn read_traces(
        &self,
        buf: &mut [f32],
        coords: &[[f64; 2]],
        interpolation: Interpolation,
    ) -> Result<()> {
        let shifted: Vec<[f64; 2]> = coords
            .iter()
            .map(|&[i, j]| [corner_to_center(i), corner_to_center(j)])
            .collect();
        self.source.read_traces(buf, &shifted, interpolation)?;
        Ok(())
    }

    /// `coords` are voxel-corner `(inline, crossline, vertical)` triples;
    /// shifted to centers before the fetch.
    pub fn read_samples(
        &self,
        buf: &mut [f32],
        coords: &[[f64; 3]],
        interpolation: Interpolation,
    ) -> Result<()> {
        let shifted: Vec<[f64; 3]> = coords
            .iter()
            .map(|&[i, j, k]| {
                [
                    corner_to_center(i),
                    corner_to_center(j),
                    corner_to_center(k),
                ]
            })
            .collect();
        self.source.read_samples(buf, &shifted, interpolation)?;
        Ok(())
    }
}
