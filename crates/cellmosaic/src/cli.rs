use std::path::PathBuf;

use clap::{Parser, Subcommand};
use renderer::GpuPowerPreference;

#[derive(Parser, Debug)]
#[command(
    name = "cellmosaic",
    author,
    version,
    about = "Redraws an image as a Worley cell mosaic on the GPU",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Image to load as soon as the window opens (press `O` to pick another).
    #[arg(value_name = "IMAGE")]
    pub image: Option<PathBuf>,

    /// GPU adapter preference: `low` (integrated) or `high` (discrete).
    #[arg(
        long,
        value_name = "POWER",
        value_parser = parse_gpu_power,
        default_value_t = GpuPowerPreference::default(),
        env = "CELLMOSAIC_GPU_POWER"
    )]
    pub gpu_power: GpuPowerPreference,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile and link the shader program without a window and print its locations.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Also decode this image and print its dimensions.
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_gpu_power(value: &str) -> Result<GpuPowerPreference, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("GPU power preference must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "low" | "low-power" | "integrated" => Ok(GpuPowerPreference::Low),
        "high" | "high-performance" | "discrete" => Ok(GpuPowerPreference::High),
        other => Err(format!(
            "unknown GPU power preference '{other}'; expected low or high"
        )),
    }
}
