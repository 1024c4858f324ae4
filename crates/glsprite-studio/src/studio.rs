//! Windowed demo on the wgpu runtime.

use anyhow::{Result, anyhow};
use winit::event::WindowEvent;
use winit::window::WindowId;

use glsprite_engine::core::{App, AppControl, FrameCtx};
use glsprite_engine::device::Gpu;
use glsprite_engine::gl::{GlContext, WgpuGl};
use glsprite_engine::time::{AnimationHandle, Animator};
use glsprite_engine::window::RedrawWaker;

use crate::args::SceneConfig;
use crate::scene::Scene;
use crate::texture::{CHECKER_SIZE, sprite_image};

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.09,
    b: 0.12,
    a: 1.0,
};

/// Frames between window title refreshes.
const TITLE_INTERVAL: u64 = 30;

pub struct StudioApp {
    config: SceneConfig,
    scene: Option<Scene>,
    gl: Option<WgpuGl>,
    animator: Option<AnimationHandle>,
    frames: u64,
}

impl StudioApp {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            scene: None,
            gl: None,
            animator: None,
            frames: 0,
        }
    }

    fn start_animator(&mut self, waker: RedrawWaker) -> Result<()> {
        let handle = Animator::new(self.config.fps)?.start(move || {
            waker.wake();
        })?;
        self.animator = Some(handle);
        Ok(())
    }

    fn stop_animator(&mut self) {
        if let Some(handle) = self.animator.take() {
            let fired = handle.stop();
            log::debug!("animator fired {fired} frames");
        }
    }

    fn resume(&mut self, gpu: &Gpu<'_>, waker: RedrawWaker) -> Result<()> {
        let mut gl = gpu.create_gl_context(self.config.capabilities);
        let capabilities = gl.capabilities();

        let scene = match self.scene.take() {
            Some(scene) => scene,
            None => Scene::build(&self.config, capabilities)?,
        };
        let scene = self.scene.insert(scene);

        let size = gpu.size();
        scene.set_bounds(size.width, size.height);
        upload_resources(scene, &mut gl)?;
        self.gl = Some(gl);

        self.start_animator(waker)
    }
}

/// (Re-)creates everything the sprites need on a fresh context.
fn upload_resources(scene: &mut Scene, gl: &mut WgpuGl) -> Result<()> {
    let texture = gl
        .create_texture_rgba8(CHECKER_SIZE, CHECKER_SIZE, &sprite_image())
        .map_err(|code| anyhow!("sprite texture upload failed: {code}"))?;
    scene.set_texture(texture);
    scene.upload_buffers(gl);
    Ok(())
}

impl App for StudioApp {
    fn on_resumed(&mut self, gpu: &Gpu<'_>, waker: RedrawWaker) -> AppControl {
        match self.resume(gpu, waker) {
            Ok(()) => AppControl::Continue,
            Err(e) => {
                log::error!("failed to set up sprites: {e:#}");
                AppControl::Exit
            }
        }
    }

    fn on_suspended(&mut self) {
        self.stop_animator();
        if let Some(scene) = self.scene.as_mut() {
            scene.on_context_lost();
        }
        self.gl = None;
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if let WindowEvent::Resized(size) = event {
            if let Some(scene) = self.scene.as_mut() {
                scene.set_bounds(size.width, size.height);
            }
            if let Some(gl) = self.gl.as_mut() {
                gl.set_viewport(size.width, size.height);
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let (Some(scene), Some(gl)) = (self.scene.as_mut(), self.gl.as_mut()) else {
            return AppControl::Continue;
        };

        scene.update(ctx.time.dt);

        let mut drawn = Ok(());
        let control = ctx.render(CLEAR, |target| {
            drawn = scene.draw(&mut *gl);
            gl.flush(target);
        });
        if let Err(e) = drawn {
            log::error!("{e}");
            return AppControl::Exit;
        }
        while let Some(code) = gl.take_error() {
            log::warn!("frame {}: graphics error: {code}", self.frames);
        }
        self.frames += 1;

        if self.frames % TITLE_INTERVAL == 0 {
            ctx.runtime.set_title(format!("glsprite - {:.0} fps", ctx.time.fps));
        }

        if self.config.context_loss_at == Some(self.frames) {
            log::info!("simulating context loss after frame {}", self.frames);
            gl.lose_context();
            scene.on_context_lost();
            if let Err(e) = upload_resources(scene, gl) {
                log::error!("{e:#}");
                return AppControl::Exit;
            }
        }

        if self.config.max_frames.is_some_and(|max| self.frames >= max) {
            return AppControl::Exit;
        }
        control
    }

    fn on_exit(&mut self) {
        self.stop_animator();
        if let (Some(scene), Some(gl)) = (self.scene.as_mut(), self.gl.as_mut()) {
            scene.release(gl);
        }
        log::info!("rendered {} frames", self.frames);
    }
}
