// SPDX-License-Identifier: AGPL-3.0-or-later
//! [`SubVolume`]: the voxel bounding box of a slice request, built from a
//! [`Direction`] (the slice normal), a lineno, and an ordered list of
//! [`Bound`] constraints on the other axes.

pub use crate::axis::AxisName as Direction;
use crate::axis::AxisName;
use crate::datasource::VoxelBox;
use crate::error::{EngineError, Result};
use crate::metadata::MetadataHandle;

/// A half-open voxel-space constraint on a non-primary axis during a slice
/// query.
#[derive(Debug, Clone, Copy)]
pub struct Bound {
    pub direction: AxisName,
    pub lower: f64,
    pub upper: f64,
}

/// Resolve `direction` to the physical dimension index it pins
/// (`0` = vertical, `1` = crossline, `2` = inline).
fn dimension_of(metadata: &MetadataHandle, direction: AxisName) -> usize {
    metadata.resolve_axis(direction).unwrap().dimension
}

/// Build the default full-range [`VoxelBox`], pin `direction` at
/// `lineno_voxel`, then apply each `bound` in order — bounds on the
/// primary axis are silently ignored, later bounds on the same axis
/// override earlier ones, and a full-range bound is a no-op.
pub fn build_subvolume(
    metadata: &MetadataHandle,
    direction: AxisName,
    lineno_voxel: i64,
    bounds: &[Bound],
) -> Result<VoxelBox> {
    let primary_dim = dimension_of(metadata, direction);
    let mut lower = [0i64, 0, 0];
    let mut upper = [
        metadata.vertical.nsamples as i64,
        metadata.crossline().nsamples as i64,
        metadata.inline().nsamples as i64,
    ];
    lower[primary_dim] = lineno_voxel;
    upper[primary_dim] = lineno_voxel + 1;

    for bound in bounds {
        let dim = dimension_of(metadata, bound.direction);
        if dim == primary_dim {
            continue;
        }
        let axis = metadata.resolve_axis(bound.direction)?;
        let is_index_axis = matches!(bound.direction, AxisName::I | AxisName::J | AxisName::K);
        let lo = axis.accept_lineno(bound.lower, is_index_axis).map_err(|_| {
            EngineError::bad_request(format!(
                "bound lower {} is out of range for axis {:?}",
                bound.lower, bound.direction
            ))
        })?;
        let hi_inclusive = axis.accept_lineno(bound.upper, is_index_axis).map_err(|_| {
            EngineError::bad_request(format!(
                "bound upper {} is out of range for axis {:?}",
                bound.upper, bound.direction
            ))
        })?;
        if lo as usize == 0 && hi_inclusive as usize + 1 == axis.nsamples {
            // full-range bound: no-op, matching the spec's "ignored" clause.
            continue;
        }
        lower[dim] = lo;
        upper[dim] = hi_inclusive + 1;
    }

    if lower.iter().zip(upper.iter()).any(|(&l, &u)| l >= u) {
        return Err(EngineError::bad_request(
            "bound produces an empty or inverted range",
        ));
    }

    Ok(VoxelBox { lower, upper })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{Axis, AxisAnnotation, Unit};
    use crate::transformer::{BinGrid, CoordinateTransformer};

    fn metadata() -> MetadataHandle {
        let vertical = Axis::new(AxisAnnotation::Sample, 4.0, 16.0, 4.0, 4, Unit::Unitless, 0)
            .unwrap();
        let crossline =
            Axis::new(AxisAnnotation::Crossline, 10.0, 11.0, 1.0, 2, Unit::Unitless, 1).unwrap();
        let inline = Axis::new(AxisAnnotation::Inline, 1.0, 5.0, 2.0, 3, Unit::Unitless, 2)
            .unwrap();
        let bingrid = BinGrid {
            xori: 2.0,
            yori: 0.0,
            xinc: 7.2111,
            yinc: 3.6056,
            rotation_deg: 33.69,
        };
        MetadataHandle::new(
            vertical,
            CoordinateTransformer::new(bingrid, inline, crossline),
            "crs",
            "well_known",
            "2024-01-01",
        )
    }

    #[test]
    fn pins_primary_axis_and_spans_others() {
        let meta = metadata();
        let sub = build_subvolume(&meta, Direction::Inline, 1, &[]).unwrap();
        assert_eq!(sub.lower, [0, 0, 1]);
        assert_eq!(sub.upper, [4, 2, 2]);
    }

    #[test]
    fn bound_on_primary_axis_is_ignored() {
        let meta = metadata();
        let sub = build_subvolume(
            &meta,
            Direction::Inline,
            1,
            &[Bound {
                direction: Direction::Inline,
                lower: 1.0,
                upper: 3.0,
            }],
        )
        .unwrap();
        assert_eq!(sub.lower[2], 1);
        assert_eq!(sub.upper[2], 2);
    }

    #[test]
    fn later_bound_overrides_earlier() {
        let meta = metadata();
        let sub = build_subvolume(
            &meta,
            Direction::Sample,
            1,
            &[
                Bound {
                    direction: Direction::Inline,
                    lower: 1.0,
                    upper: 5.0,
                },
                Bound {
                    direction: Direction::Inline,
                    lower: 1.0,
                    upper: 3.0,
                },
            ],
        )
        .unwrap();
        assert_eq!(sub.lower[2], 0);
        assert_eq!(sub.upper[2], 2);
    }
}
