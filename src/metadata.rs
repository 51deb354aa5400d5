// SPDX-License-Identifier: AGPL-3.0-or-later
//! Cube-level metadata: which physical dimension each logical axis maps to,
//! the bounding box in the three coordinate systems, and the cube's CRS /
//! provenance fields.

use crate::axis::{Axis, AxisAnnotation, AxisName};
use crate::error::{EngineError, Result};
use crate::transformer::CoordinateTransformer;
use serde::Serialize;

/// Resolved axes and coordinate transformer for one open cube.
#[derive(Debug, Clone)]
pub struct MetadataHandle {
    pub vertical: Axis,
    pub transformer: CoordinateTransformer,
    pub crs: String,
    pub input_file_name: String,
    pub import_time_stamp: String,
}

impl MetadataHandle {
    pub fn new(
        vertical: Axis,
        transformer: CoordinateTransformer,
        crs: impl Into<String>,
        input_file_name: impl Into<String>,
        import_time_stamp: impl Into<String>,
    ) -> Self {
        Self {
            vertical,
            transformer,
            crs: crs.into(),
            input_file_name: input_file_name.into(),
            import_time_stamp: import_time_stamp.into(),
        }
    }

    pub fn inline(&self) -> &Axis {
        self.transformer.inline_axis()
    }

    pub fn crossline(&self) -> &Axis {
        self.transformer.crossline_axis()
    }

    /// Resolve a logical axis name to the physical [`Axis`] it refers to.
    /// `I`/`J`/`K` are positional (inline/crossline/vertical); named
    /// domains (`Depth`/`Time`/`Sample`) must additionally match the
    /// cube's actual vertical unit, which callers validate separately via
    /// [`Self::validate_vertical_domain`].
    pub fn resolve_axis(&self, name: AxisName) -> Result<&Axis> {
        match name {
            AxisName::I | AxisName::Inline => Ok(self.inline()),
            AxisName::J | AxisName::Crossline => Ok(self.crossline()),
            AxisName::K | AxisName::Depth | AxisName::Time | AxisName::Sample => {
                Ok(&self.vertical)
            }
        }
    }

    /// A `Time`/`Depth`/`Sample` slice request is only legal if it matches
    /// the cube's actual vertical unit; `Inline`/`Crossline`/`I`/`J`/`K`
    /// requests never need this check.
    pub fn validate_vertical_domain(&self, name: AxisName) -> Result<()> {
        let requested = match name {
            AxisName::Depth => AxisAnnotation::Depth,
            AxisName::Time => AxisAnnotation::Time,
            AxisName::Sample => AxisAnnotation::Sample,
            _ => return Ok(()),
        };
        if requested == self.vertical.annotation {
            Ok(())
        } else {
            Err(EngineError::bad_request(format!(
                "Cannot fetch {:?} slice for cube with vertical axis unit: {}",
                requested, self.vertical.unit
            )))
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let inline = self.inline();
        let crossline = self.crossline();
        let il_corners = [
            (inline.min, crossline.min),
            (inline.max, crossline.min),
            (inline.max, crossline.max),
            (inline.min, crossline.max),
        ];
        let ij_corners = [
            (0.0, 0.0),
            (inline.nsamples as f64 - 1.0, 0.0),
            (inline.nsamples as f64 - 1.0, crossline.nsamples as f64 - 1.0),
            (0.0, crossline.nsamples as f64 - 1.0),
        ];
        let cdp_corners = ij_corners.map(|(i, j)| self.transformer.ij_to_cdp(i, j));
        BoundingBox {
            cdp: cdp_corners.map(|(x, y)| [x, y]),
            ilxl: il_corners.map(|(i, x)| [i, x]),
            ij: ij_corners.map(|(i, j)| [i, j]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundingBox {
    pub cdp: [[f64; 2]; 4],
    pub ilxl: [[f64; 2]; 4],
    pub ij: [[f64; 2]; 4],
}
