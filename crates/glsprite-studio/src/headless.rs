//! Headless run: the animator paces frames drawn into a recording context.

use std::sync::mpsc;

use anyhow::{Context, Result};

use glsprite_engine::gl::{GlContext, RecordingGl, TextureId};
use glsprite_engine::time::{Animator, FrameClock};

use crate::args::{DEFAULT_HEADLESS_FRAMES, SceneConfig};
use crate::scene::Scene;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeadlessReport {
    pub frames: u64,
    pub draw_calls: u64,
    pub gl_errors: u64,
    pub context_losses: u32,
    /// Frames the animator fired; exceeds `frames` when requests coalesced.
    pub animator_frames: u64,
}

pub fn run(config: &SceneConfig) -> Result<HeadlessReport> {
    let max_frames = config.max_frames.unwrap_or(DEFAULT_HEADLESS_FRAMES);

    let mut gl = RecordingGl::new(config.capabilities);
    let capabilities = config.capabilities.restrict(gl.capabilities());
    let mut scene = Scene::build(config, capabilities).context("failed to build scene")?;

    // The recording context has no texture storage; any non-zero name will do.
    let mut next_texture = 1;
    scene.set_texture(TextureId(next_texture));
    scene.upload_buffers(&mut gl);

    // Capacity 1: a frame request made while one is pending is dropped.
    let (tx, rx) = mpsc::sync_channel::<()>(1);
    let animator = Animator::new(config.fps)?.start(move || {
        let _ = tx.try_send(());
    })?;

    let mut clock = FrameClock::new();
    let mut report = HeadlessReport::default();

    while report.frames < max_frames {
        if rx.recv().is_err() {
            break;
        }

        let time = clock.tick();
        scene.update(time.dt);

        gl.clear_calls();
        scene.draw(&mut gl).context("draw failed")?;
        report.draw_calls += gl.draw_count() as u64;
        while let Some(code) = gl.take_error() {
            log::warn!("frame {}: graphics error: {code}", report.frames);
            report.gl_errors += 1;
        }
        report.frames += 1;

        if config.context_loss_at == Some(report.frames) {
            log::info!("simulating context loss after frame {}", report.frames);
            gl.lose_context();
            scene.on_context_lost();

            next_texture += 1;
            scene.set_texture(TextureId(next_texture));
            scene.upload_buffers(&mut gl);
            report.context_losses += 1;
        }
    }

    report.animator_frames = animator.stop();
    scene.release(&mut gl);

    log::info!(
        "headless run: {} frames, {} draws, {} errors",
        report.frames,
        report.draw_calls,
        report.gl_errors
    );
    Ok(report)
}
