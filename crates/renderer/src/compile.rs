use std::borrow::Cow;

use wgpu::naga;
use wgpu::naga::front::glsl;
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::RenderError;
use crate::types::ShaderKind;

/// Vertex and fragment GLSL for one effect, fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: &'static str,
    pub fragment: &'static str,
}

impl ShaderSource {
    /// The Worley cell-mosaic effect.
    pub const CELL_MOSAIC: ShaderSource = ShaderSource {
        vertex: VERTEX_SHADER_GLSL,
        fragment: FRAGMENT_SHADER_GLSL,
    };

    pub fn get(&self, kind: ShaderKind) -> &'static str {
        match kind {
            ShaderKind::Vertex => self.vertex,
            ShaderKind::Fragment => self.fragment,
        }
    }
}

/// A shader that parsed and validated as naga IR.
///
/// The IR is kept next to the GPU handle so the linker and binder can reflect
/// on entry points, varyings, and resource bindings without a device.
#[derive(Debug, Clone)]
pub struct ParsedShader {
    pub kind: ShaderKind,
    pub module: naga::Module,
}

/// GPU shader module plus the IR it was built from.
pub(crate) struct CompiledShader {
    pub parsed: ParsedShader,
    pub module: wgpu::ShaderModule,
}

/// Parses and validates GLSL for the given stage without touching the GPU.
///
/// Diagnostics from the naga frontend and validator are rendered against the
/// source so the error text points at the offending line.
pub fn parse(kind: ShaderKind, source: &str) -> Result<ParsedShader, RenderError> {
    let mut frontend = glsl::Frontend::default();
    let module = frontend
        .parse(&glsl::Options::from(kind.stage()), source)
        .map_err(|errors| RenderError::ShaderCompile {
            kind,
            diagnostics: non_empty(errors.emit_to_string(source), "GLSL parse failed"),
        })?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|error| RenderError::ShaderCompile {
            kind,
            diagnostics: non_empty(error.as_inner().to_string(), "validation failed"),
        })?;

    Ok(ParsedShader { kind, module })
}

/// Compiles one stage into a `wgpu::ShaderModule`.
///
/// On failure the diagnostics are logged and no module is returned; a module
/// the device rejected is dropped before the error is reported.
pub(crate) fn compile(
    device: &wgpu::Device,
    kind: ShaderKind,
    source: &str,
) -> Result<CompiledShader, RenderError> {
    let parsed = parse(kind, source).inspect_err(|err| {
        tracing::error!(stage = %kind, error = %err, "shader compilation failed");
    })?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.label()),
        source: wgpu::ShaderSource::Naga(Cow::Owned(parsed.module.clone())),
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        drop(module);
        let err = RenderError::ShaderCompile {
            kind,
            diagnostics: non_empty(error.to_string(), "device rejected shader module"),
        };
        tracing::error!(stage = %kind, error = %err, "shader compilation failed");
        return Err(err);
    }

    tracing::debug!(stage = %kind, "compiled shader");
    Ok(CompiledShader { parsed, module })
}

fn non_empty(diagnostics: String, fallback: &str) -> String {
    if diagnostics.trim().is_empty() {
        fallback.to_string()
    } else {
        diagnostics
    }
}

/// Passes the clip-space position through as a varying so the fragment stage
/// can tile cells in [-1, 1] directly.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 position;
layout(location = 1) in vec2 texCoord;

layout(location = 0) out vec2 vTexCoord;
layout(location = 1) out vec2 vPosition;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
    vTexCoord = texCoord;
    vPosition = position;
}
";

/// Worley cell mosaic: every fragment samples the image at the grid cell that
/// owns the nearest feature point.
///
/// The constants must stay in sync with [`crate::cell`].
const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 vTexCoord;
layout(location = 1) in vec2 vPosition;

layout(location = 0) out vec4 pixel;

layout(set = 0, binding = 0) uniform texture2D imageTexture;
layout(set = 0, binding = 1) uniform sampler imageSampler;

const float FACTOR = 40.0;

vec2 featureOffset(vec2 seed) {
    return vec2(
        fract(sin(seed.x * 2345.678 + seed.y * 3488982.394)),
        fract(sin(seed.y * 38859.234 + seed.x * 129384.22))
    );
}

void main() {
    vec2 uv = vPosition * FACTOR;
    vec2 gv = fract(uv);
    vec2 id = floor(uv);

    float minDist = 100.0;
    vec2 cell = id;
    for (int y = -1; y <= 1; y++) {
        for (int x = -1; x <= 1; x++) {
            vec2 offset = vec2(float(x), float(y));
            vec2 p = offset + featureOffset(id + offset);
            float d = length(gv - p);
            if (d < minDist) {
                minDist = d;
                cell = id + offset;
            }
        }
    }

    vec2 tex = (cell / FACTOR) * 0.5 + 0.5;
    pixel = texture(
        sampler2D(imageTexture, imageSampler),
        tex * vec2(1.0, -1.0) + vec2(0.0, 1.0)
    );
}
";
