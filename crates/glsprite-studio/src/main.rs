mod args;
mod headless;
mod scene;
mod studio;
mod texture;

use anyhow::Result;
use clap::Parser;
use winit::dpi::PhysicalSize;

use glsprite_engine::device::GpuInit;
use glsprite_engine::logging::{LoggingConfig, init_logging};
use glsprite_engine::window::{Runtime, RuntimeConfig};

use crate::args::StudioArgs;
use crate::studio::StudioApp;

fn main() -> Result<()> {
    let args = StudioArgs::parse();
    init_logging(LoggingConfig::default());

    let config = args.scene_config();
    log::info!(
        "{} sprites at {} fps, {:?} vertices",
        config.sprite_count,
        config.fps,
        config.representation
    );

    if args.headless {
        let report = headless::run(&config)?;
        log::info!(
            "animator fired {} frames, {} rendered",
            report.animator_frames,
            report.frames
        );
        return Ok(());
    }

    let runtime = RuntimeConfig {
        title: "glsprite".to_string(),
        initial_size: PhysicalSize::new(config.width, config.height),
    };
    Runtime::run(runtime, GpuInit::default(), StudioApp::new(config))
}
