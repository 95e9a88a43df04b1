use std::path::PathBuf;

use thiserror::Error;

use crate::types::ShaderKind;

/// Failures raised while turning a decoded image into pixels on the surface.
///
/// Every stage of the render returns this type so the orchestration can stop
/// at the first failure instead of drawing with invalid handles.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{kind} shader failed to compile:\n{diagnostics}")]
    ShaderCompile {
        kind: ShaderKind,
        diagnostics: String,
    },
    #[error("shader program failed to link:\n{diagnostics}")]
    ProgramLink { diagnostics: String },
    #[error("shader program does not expose `{name}`")]
    UnresolvedBinding { name: &'static str },
    #[error("cannot draw into a {width}x{height} surface")]
    EmptyViewport { width: u32, height: u32 },
    #[error("image is {width}x{height} but the GPU supports at most {limit} pixels per side")]
    ImageTooLarge { width: u32, height: u32, limit: u32 },
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl RenderError {
    pub fn as_surface_error(&self) -> Option<&wgpu::SurfaceError> {
        match self {
            RenderError::Surface(err) => Some(err),
            _ => None,
        }
    }
}

/// Failures raised by the image loader.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to decode image at {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image at {} has no pixels", path.display())]
    Empty { path: PathBuf },
}
