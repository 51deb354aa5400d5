// SPDX-License-Identifier: AGPL-3.0-or-later
//! The in-process stand-in for the wire "multipart response": a typed
//! metadata value plus N row-major `float32` little-endian data parts.
//! Serialising this onto an actual transport is a caller concern (§6 of
//! the design: this crate never touches HTTP).

use crate::axis::Axis;
use crate::metadata::{BoundingBox, MetadataHandle};
use serde::Serialize;

/// `{annotation, min, max, samples, stepSize, unit}`.
#[derive(Debug, Clone, Serialize)]
pub struct AxisMeta {
    pub annotation: String,
    pub min: f64,
    pub max: f64,
    pub samples: usize,
    #[serde(rename = "stepSize")]
    pub step_size: f64,
    pub unit: String,
}

impl From<&Axis> for AxisMeta {
    fn from(axis: &Axis) -> Self {
        Self {
            annotation: format!("{:?}", axis.annotation),
            min: axis.min,
            max: axis.max,
            samples: axis.nsamples,
            step_size: axis.stepsize,
            unit: axis.unit.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SliceMetadata {
    pub format: &'static str,
    pub shape: [usize; 2],
    pub x: AxisMeta,
    pub y: AxisMeta,
    pub geospatial: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FenceMetadata {
    pub format: &'static str,
    pub shape: [usize; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeMetadata {
    pub format: &'static str,
    pub shape: [usize; 2],
}

/// `{crs, inputFileName, importTimeStamp, boundingBox: {cdp,ilxl,ij},
/// axis: [inline, crossline, sample]}` — the §6 "Cube" metadata shape,
/// describing an opened cube rather than any one query's result.
#[derive(Debug, Clone, Serialize)]
pub struct CubeMetadata {
    pub crs: String,
    #[serde(rename = "inputFileName")]
    pub input_file_name: String,
    #[serde(rename = "importTimeStamp")]
    pub import_time_stamp: String,
    #[serde(rename = "boundingBox")]
    pub bounding_box: BoundingBox,
    pub axis: [AxisMeta; 3],
}

impl From<&MetadataHandle> for CubeMetadata {
    fn from(metadata: &MetadataHandle) -> Self {
        Self {
            crs: metadata.crs.clone(),
            input_file_name: metadata.input_file_name.clone(),
            import_time_stamp: metadata.import_time_stamp.clone(),
            bounding_box: metadata.bounding_box(),
            axis: [
                AxisMeta::from(metadata.inline()),
                AxisMeta::from(metadata.crossline()),
                AxisMeta::from(&metadata.vertical),
            ],
        }
    }
}

/// One attribute's output values, serialised as a dense row-major `f32`
/// little-endian byte buffer via `bytemuck`.
pub fn floats_to_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

/// A fully assembled response: typed metadata, serialised to JSON by the
/// caller, plus the data parts.
pub struct ResponsePayload<M: Serialize> {
    pub metadata: M,
    pub data_parts: Vec<Vec<u8>>,
}

impl<M: Serialize> ResponsePayload<M> {
    pub fn metadata_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datahandle::DataHandle;
    use crate::testutil::MemoryCube;
    use std::sync::Arc;

    #[test]
    fn cube_metadata_uses_documented_camel_case_shape() {
        let handle = DataHandle::open(Arc::new(MemoryCube::well_known())).unwrap();
        let cube = handle.cube_metadata();
        let json = serde_json::to_value(&cube).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("inputFileName"));
        assert!(obj.contains_key("importTimeStamp"));
        assert!(obj.contains_key("boundingBox"));
        assert_eq!(obj["crs"], "well_known_crs");
        assert_eq!(cube.axis.len(), 3);
        assert_eq!(cube.axis[0].annotation, "Inline");
        assert_eq!(cube.axis[1].annotation, "Crossline");
        assert_eq!(cube.axis[2].annotation, "Sample");
        let bbox = obj["boundingBox"].as_object().unwrap();
        assert!(bbox.contains_key("cdp"));
        assert!(bbox.contains_key("ilxl"));
        assert!(bbox.contains_key("ij"));
    }
}
