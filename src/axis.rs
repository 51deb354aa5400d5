// SPDX-License-Identifier: AGPL-3.0-or-later
//! A single cube dimension: its annotation domain, its physical unit, and
//! the voxel/annotation conversions that only need one axis in isolation.
//!
//! Conversions that mix two axes (CDP world coordinates) live in
//! [`crate::transformer`].

use crate::error::{EngineError, Result};
use std::str::FromStr;

/// What an axis counts in annotation space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisAnnotation {
    Inline,
    Crossline,
    Sample,
    Time,
    Depth,
}

impl AxisAnnotation {
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Sample | Self::Time | Self::Depth)
    }
}

/// Physical unit carried by the vertical axis (horizontal axes are always
/// unitless annotation numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Unitless,
    Millisecond,
    Second,
    Meter,
    Foot,
    USSurveyFoot,
}

impl Unit {
    /// Whether this unit is a legal pairing for `domain`.
    pub fn matches_domain(self, domain: AxisAnnotation) -> bool {
        match domain {
            AxisAnnotation::Time => matches!(self, Self::Millisecond | Self::Second),
            AxisAnnotation::Depth => matches!(self, Self::Meter | Self::Foot | Self::USSurveyFoot),
            AxisAnnotation::Sample => matches!(self, Self::Unitless),
            AxisAnnotation::Inline | AxisAnnotation::Crossline => true,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unitless => "Unitless",
            Self::Millisecond => "Millisecond",
            Self::Second => "Second",
            Self::Meter => "Meter",
            Self::Foot => "Foot",
            Self::USSurveyFoot => "USSurveyFoot",
        };
        f.write_str(s)
    }
}

/// The caller-facing axis-name grammar (`i|j|k|inline|crossline|depth|time|sample`),
/// shared by [`crate::subvolume::Direction`] and [`crate::subvolume::Bound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisName {
    I,
    J,
    K,
    Inline,
    Crossline,
    Depth,
    Time,
    Sample,
}

impl FromStr for AxisName {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "i" => Ok(Self::I),
            "j" => Ok(Self::J),
            "k" => Ok(Self::K),
            "inline" => Ok(Self::Inline),
            "crossline" => Ok(Self::Crossline),
            "depth" => Ok(Self::Depth),
            "time" => Ok(Self::Time),
            "sample" => Ok(Self::Sample),
            other => Err(EngineError::bad_request(format!(
                "unknown axis name: {other}"
            ))),
        }
    }
}

impl AxisName {
    /// Whether this name refers to the vertical axis regardless of which
    /// physical unit that axis actually carries.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::K | Self::Depth | Self::Time | Self::Sample)
    }
}

/// One dimension of the cube.
#[derive(Debug, Clone)]
pub struct Axis {
    pub annotation: AxisAnnotation,
    pub min: f64,
    pub max: f64,
    pub stepsize: f64,
    pub nsamples: usize,
    pub unit: Unit,
    pub dimension: usize,
}

const TOLERANCE: f64 = 1e-6;

impl Axis {
    pub fn new(
        annotation: AxisAnnotation,
        min: f64,
        max: f64,
        stepsize: f64,
        nsamples: usize,
        unit: Unit,
        dimension: usize,
    ) -> Result<Self> {
        if nsamples == 0 {
            return Err(EngineError::nullptr("axis nsamples must be >= 1"));
        }
        if stepsize <= 0.0 {
            return Err(EngineError::nullptr("axis stepsize must be > 0"));
        }
        let expected_max = min + (nsamples - 1) as f64 * stepsize;
        if (expected_max - max).abs() > TOLERANCE.max(stepsize * 1e-6) {
            return Err(EngineError::nullptr(format!(
                "axis max {max} does not match min + (nsamples-1)*stepsize {expected_max}"
            )));
        }
        if !unit.matches_domain(annotation) {
            return Err(EngineError::nullptr(format!(
                "unit {unit} is not valid for axis domain {annotation:?}"
            )));
        }
        Ok(Self {
            annotation,
            min,
            max,
            stepsize,
            nsamples,
            unit,
            dimension,
        })
    }

    /// Continuous (unrounded) voxel-corner index of an annotation value.
    pub fn index_of_annotation(&self, annotation: f64) -> f64 {
        (annotation - self.min) / self.stepsize
    }

    /// Nearest integer voxel index for an annotation value.
    pub fn nearest_voxel(&self, annotation: f64) -> i64 {
        self.index_of_annotation(annotation).round() as i64
    }

    /// Annotation value at a (possibly fractional) voxel-corner index.
    pub fn annotation_of_voxel(&self, voxel: f64) -> f64 {
        self.min + voxel * self.stepsize
    }

    /// Whether a voxel-corner coordinate falls within the sampled range,
    /// using the half-open-around-centers convention.
    pub fn in_range(&self, voxel: f64) -> bool {
        voxel >= -0.5 && voxel < self.nsamples as f64 - 0.5
    }

    /// Accept a slice `lineno` for this axis: for an annotation axis it must
    /// land on (or within tolerance of) an integer multiple of `stepsize`
    /// from `min`; for an index axis it must be an in-range integer.
    pub fn accept_lineno(&self, lineno: f64, is_index_axis: bool) -> Result<i64> {
        if is_index_axis {
            let idx = lineno.round() as i64;
            if (lineno - idx as f64).abs() > TOLERANCE || idx < 0 || idx as usize >= self.nsamples
            {
                return Err(EngineError::bad_request("Invalid lineno"));
            }
            Ok(idx)
        } else {
            let k = self.index_of_annotation(lineno);
            let rounded = k.round();
            if (k - rounded).abs() > TOLERANCE || rounded < 0.0 || rounded as usize >= self.nsamples
            {
                return Err(EngineError::bad_request("Invalid lineno"));
            }
            Ok(rounded as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_axis() -> Axis {
        Axis::new(AxisAnnotation::Inline, 1.0, 5.0, 2.0, 3, Unit::Unitless, 1).unwrap()
    }

    #[test]
    fn rejects_inconsistent_max() {
        assert!(Axis::new(AxisAnnotation::Inline, 1.0, 99.0, 2.0, 3, Unit::Unitless, 1).is_err());
    }

    #[test]
    fn round_trips_voxel_to_annotation() {
        let axis = sample_axis();
        for v in 0..axis.nsamples {
            let ann = axis.annotation_of_voxel(v as f64);
            let back = axis.annotation_of_voxel(axis.nearest_voxel(ann) as f64);
            assert!((ann - back).abs() < TOLERANCE);
        }
    }

    #[test]
    fn in_range_is_half_open_around_centers() {
        let axis = sample_axis();
        assert!(axis.in_range(-0.5));
        assert!(!axis.in_range(-0.51));
        assert!(axis.in_range(axis.nsamples as f64 - 0.51));
        assert!(!axis.in_range(axis.nsamples as f64 - 0.5));
    }

    #[test]
    fn accepts_integer_multiples_only() {
        let axis = sample_axis();
        assert_eq!(axis.accept_lineno(3.0, false).unwrap(), 1);
        assert!(axis.accept_lineno(2.0, false).is_err());
    }

    /// §8's quantified round-trip invariant, checked over many random
    /// in-range voxels on a larger axis rather than just the handful of
    /// integer voxels `round_trips_voxel_to_annotation` exercises.
    #[test]
    fn round_trip_holds_for_random_in_range_voxels() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let axis = Axis::new(AxisAnnotation::Depth, 0.0, 996.0, 4.0, 250, Unit::Meter, 0).unwrap();
        let mut rng: StdRng = SeedableRng::from_seed([7; 32]);
        for _ in 0..2000 {
            let v: f64 = rng.gen_range(0.0..(axis.nsamples - 1) as f64);
            let ann = axis.annotation_of_voxel(v);
            let back = axis.annotation_of_voxel(axis.nearest_voxel(ann) as f64);
            assert!((ann - back).abs() < TOLERANCE, "v={v} ann={ann} back={back}");
        }
    }
}
