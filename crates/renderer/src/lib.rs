//! Renderer crate for cellmosaic.
//!
//! Decodes a user-selected image and redraws it through a Worley cell-noise
//! fragment shader, one flat-colour cell per feature point. The flow for a
//! single selection is:
//!
//! ```text
//!   file dialog / drop / CLI path
//!          │ PathBuf
//!          ▼
//!   Session::select ──▶ loader::spawn_decode ──▶ EventLoopProxy (LoadOutcome)
//!                                                        │
//!   GpuState::render_image ◀── Session::accept_decoded ◀─┘
//!          │
//!          └─▶ EffectPass::build: compile ▶ link ▶ resolve ▶ geometry ▶ texture ▶ draw
//! ```
//!
//! Shader compilation, program linking and location lookup run on naga IR and
//! need no GPU, so they are exposed for the `check` command and for tests.
//! Everything that touches the device stays crate-private behind
//! [`Renderer::run`].

pub mod cell;
pub mod compile;
pub mod error;
mod gpu;
pub mod loader;
pub mod program;
pub mod session;
mod types;
mod window;

use anyhow::Result;

pub use cell::{CellNoise, CellSample, CELL_FACTOR};
pub use compile::{ParsedShader, ShaderSource};
pub use error::{LoadError, RenderError};
pub use gpu::{vertex_bytes, QUAD_POSITIONS, QUAD_TEX_COORDS, VERTEX_STRIDE};
pub use loader::{SourceImage, Viewport};
pub use program::{AttributeLocations, ProgramInterface, ResolvedLocations};
pub use session::{Session, SessionState};
pub use types::{GpuPowerPreference, RendererConfig, ShaderKind};

/// Entry point for the interactive viewer.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the window and blocks until the user closes it.
    pub fn run(self) -> Result<()> {
        tracing::info!(
            gpu_power = %self.config.gpu_power,
            initial_image = ?self.config.initial_image,
            "starting viewer"
        );
        window::run(self.config)
    }
}

/// Parses and links the built-in shader pair without a GPU.
pub fn check_program() -> Result<ProgramInterface, RenderError> {
    let source = ShaderSource::CELL_MOSAIC;
    let vertex = compile::parse(ShaderKind::Vertex, source.vertex)?;
    let fragment = compile::parse(ShaderKind::Fragment, source.fragment)?;
    program::link_interface(&vertex, &fragment)
}
