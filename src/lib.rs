// SPDX-License-Identifier: AGPL-3.0-or-later
#![deny(
    rust_2018_compatibility,
    rust_2018_idioms,
    nonstandard_style,
    unused,
    future_incompatible,
    non_camel_case_types,
    unused_parens,
    non_upper_case_globals,
    unused_qualifications,
    unused_results,
    bare_trait_objects,
    ellipsis_inclusive_range_patterns,
    elided_lifetimes_in_paths
)]
#![warn(clippy::explicit_into_iter_loop)]
//! Geometric slice/fence/horizon/attribute query engine over a 3-D seismic
//! cube. The engine itself never touches storage or the network: callers
//! plug in a [`datasource::VolumeDataSource`] and get back typed metadata
//! plus row-major `f32` byte buffers.
//!
//! [`engine::QueryEngine`] is the entry point; [`datahandle::DataHandle`]
//! opens a cube and owns the voxel-center shift invariant every read goes
//! through.

pub mod axis;
pub mod cache;
pub mod config;
pub mod datahandle;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod horizon;
pub mod kernels;
pub mod metadata;
pub mod response;
pub mod subvolume;
pub mod surface;
pub mod transformer;
pub mod window;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub mod prelude {
    pub use crate::cache::{Fingerprint, ResponseCache};
    pub use crate::config::EngineConfig;
    pub use crate::datahandle::DataHandle;
    pub use crate::datasource::{Interpolation, VolumeDataSource};
    pub use crate::engine::{CoordinateSystem, QueryEngine};
    pub use crate::error::{EngineError, Result};
    pub use crate::kernels::Attribute;
    pub use crate::response::CubeMetadata;
    pub use crate::subvolume::{Bound, Direction};
    pub use crate::surface::RegularSurface;
}
