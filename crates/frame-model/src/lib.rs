//! Reframe Frame Model
//!
//! Defines the core data contracts shared by detection, tracking, and rendering:
//! - **Frames:** fixed-size RGB images and their dimensions
//! - **Geometry:** motion boxes, per-frame box sets, regions of interest
//! - **Viewport:** the fixed-size virtual camera and its per-frame center
//! - **Report:** the serialized result of analyzing one frame sequence
//!
//! All coordinates are integer pixels with the origin at the top-left corner.

pub mod frame;
pub mod geometry;
pub mod report;
pub mod viewport;

pub use frame::*;
pub use geometry::*;
pub use report::*;
pub use viewport::*;
