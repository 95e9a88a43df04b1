use anyhow::{Context, Result};
use renderer::{check_program, loader, Renderer, RendererConfig, CELL_FACTOR};
use tracing_subscriber::EnvFilter;

use crate::cli::{CheckArgs, RunArgs};

pub fn run(args: RunArgs) -> Result<()> {
    if let Some(path) = &args.image {
        if !path.exists() {
            anyhow::bail!("image {} does not exist", path.display());
        }
    }

    let config = RendererConfig {
        initial_image: args.image,
        gpu_power: args.gpu_power,
        ..RendererConfig::default()
    };
    Renderer::new(config).run().context("viewer exited with an error")
}

pub fn check(args: CheckArgs) -> Result<()> {
    let program = check_program().context("built-in shader program failed to build")?;
    let locations = program.locations();
    println!("position location {}", locations.position);
    println!("texCoord location {}", locations.tex_coord);
    println!("imageSampler location {}", locations.image_sampler);
    println!("imageTexture location {}", locations.image_texture);
    locations
        .require()
        .context("shader program is missing a required location")?;
    println!("cell factor: {CELL_FACTOR}");

    if let Some(path) = &args.image {
        let image = loader::decode(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        println!("{}: {}", path.display(), image.viewport());
    }

    tracing::debug!("check passed");
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
