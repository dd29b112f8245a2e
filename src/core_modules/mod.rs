pub mod box_topology;
pub mod color;
pub mod detection;
pub mod geometry;
pub mod keypoint;
pub mod overlay_renderer;
pub mod raster;
pub mod surface;
