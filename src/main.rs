use anyhow::{bail, Context};
use cgmath::{Deg, Vector3};
use clap::Parser;

use roomview::{
    app::{run_headless, ViewerApp},
    config::ViewerConfig,
    gfx::{
        backend::ClearMask,
        camera::{CameraConfig, LookCapture, StepMode},
        rendering::{ProjectionConfig, RenderConfig},
    },
};

#[derive(Parser)]
#[command(name = "roomview", about = "Walk through OBJ models placed in a simple room")]
struct Cli {
    /// OBJ models to place, as `path` or `path@x,y,z`
    models: Vec<String>,

    /// Window width in logical pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Window height in logical pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 45.0)]
    fov: f32,

    /// Movement per frame, or per second with --per-second
    #[arg(long, default_value_t = 0.05)]
    speed: f32,

    /// Scale movement by frame time instead of moving a fixed step per frame
    #[arg(long)]
    per_second: bool,

    /// Degrees of rotation per pixel of pointer motion
    #[arg(long, default_value_t = 0.1)]
    sensitivity: f32,

    /// Disable depth testing
    #[arg(long)]
    no_depth_test: bool,

    /// Do not clear the depth buffer between frames
    #[arg(long)]
    no_depth_clear: bool,

    /// Measure look input from the window center instead of raw pointer motion
    #[arg(long)]
    center_warp: bool,

    /// Present as fast as possible
    #[arg(long)]
    no_vsync: bool,

    /// Run N frames against a recording backend instead of opening a window
    #[arg(long, value_name = "N")]
    headless: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Splits `path@x,y,z` into a path and a placement; a bare path is placed at the origin.
fn parse_model(arg: &str) -> anyhow::Result<(&str, Vector3<f32>)> {
    let Some((path, placement)) = arg.rsplit_once('@') else {
        return Ok((arg, Vector3::new(0.0, 0.0, 0.0)));
    };

    let coords = placement
        .split(',')
        .map(|c| c.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid placement in '{}'", arg))?;
    let [x, y, z] = coords.as_slice() else {
        bail!("placement in '{}' needs three coordinates", arg);
    };

    Ok((path, Vector3::new(*x, *y, *z)))
}

impl Cli {
    fn viewer_config(&self) -> anyhow::Result<ViewerConfig> {
        let step = if self.per_second {
            StepMode::PerSecond(self.speed)
        } else {
            StepMode::PerFrame(self.speed)
        };
        if self.width == 0 || self.height == 0 {
            bail!(
                "window size must be non-zero, got {}x{}",
                self.width,
                self.height
            );
        }
        let projection = ProjectionConfig::default()
            .with_fovy(Deg(self.fov))
            .context("invalid --fov")?;
        let clear_mask = ClearMask {
            color: true,
            depth: !self.no_depth_clear,
        };

        let mut config = ViewerConfig::default()
            .with_window_size(self.width, self.height)
            .with_camera(
                CameraConfig::default()
                    .with_step(step)
                    .with_sensitivity(self.sensitivity),
            )
            .with_projection(projection)
            .with_render(
                RenderConfig::default()
                    .with_vsync(!self.no_vsync)
                    .with_depth_test(!self.no_depth_test)
                    .with_clear_mask(clear_mask),
            );

        if self.center_warp {
            config = config.with_look_capture(LookCapture::CenterWarp);
        }

        for arg in &self.models {
            let (path, placement) = parse_model(arg)?;
            config = config.with_model(path, placement);
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = cli.viewer_config()?;
    config.warn_suspicious();

    match cli.headless {
        Some(frames) => {
            run_headless(&config, frames)?;
            Ok(())
        }
        None => ViewerApp::new(config).run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_placement() {
        let (path, placement) = parse_model("chair.obj@1.5,0,-2").unwrap();
        assert_eq!(path, "chair.obj");
        assert_eq!(placement, Vector3::new(1.5, 0.0, -2.0));

        let (path, placement) = parse_model("table.obj").unwrap();
        assert_eq!(path, "table.obj");
        assert_eq!(placement, Vector3::new(0.0, 0.0, 0.0));

        assert!(parse_model("lamp.obj@1,2").is_err());
        assert!(parse_model("lamp.obj@a,b,c").is_err());
    }

    #[test]
    fn test_cli_builds_config() {
        let cli = Cli::parse_from([
            "roomview",
            "--per-second",
            "--speed",
            "2",
            "--no-depth-clear",
            "chair.obj@1,0,0",
        ]);
        let config = cli.viewer_config().unwrap();

        assert_eq!(config.camera.step, StepMode::PerSecond(2.0));
        assert_eq!(config.render.clear_mask, ClearMask::COLOR);
        assert_eq!(config.models.len(), 1);
    }

    #[test]
    fn test_cli_rejects_unusable_view_settings() {
        for args in [
            &["roomview", "--fov", "0"][..],
            &["roomview", "--fov", "200"][..],
            &["roomview", "--width", "0", "--headless", "5"][..],
        ] {
            let cli = Cli::parse_from(args);
            assert!(cli.viewer_config().is_err(), "{:?} should be rejected", args);
        }
    }
}
