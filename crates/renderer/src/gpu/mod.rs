//! GPU side of a render.
//!
//! - `context` owns the wgpu instance, device and surface, and sizes the
//!   surface to the loaded image.
//! - `geometry` uploads the fixed full-screen quad.
//! - `texture` uploads the decoded image with nearest, clamped sampling.
//! - `pipeline` turns two compiled stages into a render pipeline.
//! - `pass` ties one image's resources together and encodes the draw.
//! - `state` holds the current pass and presents it to the window.

mod context;
mod geometry;
mod pass;
mod pipeline;
mod state;
mod texture;

#[cfg(test)]
mod testing;

pub use geometry::{vertex_bytes, QUAD_POSITIONS, QUAD_TEX_COORDS, VERTEX_STRIDE};
pub(crate) use state::GpuState;
