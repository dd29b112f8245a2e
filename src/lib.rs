// THEORY:
// `shoe_vision` turns the output of an Objectron-style 3D box detector into an
// annotated frame. The public surface is deliberately small:
//
// - `pipeline::FramePipeline` renders one frame at a time.
// - `parallel_pipeline::ParallelPipeline` renders many frames on a tokio pool.
// - `core_modules` holds the building blocks: keypoints, the box role table,
//   the axis geometry, drawing surfaces and the overlay renderer. They are
//   public for callers that want to draw onto their own surface.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::OverlayConfig;
pub use error::OverlayError;
