//! Command line options.

use clap::Parser;

use glsprite_engine::gl::Capabilities;
use glsprite_engine::mesh::Representation;

/// Frames rendered by a headless run when `--max-frames` is not given.
pub const DEFAULT_HEADLESS_FRAMES: u64 = 120;

/// Bouncing-sprite demo for the fixed-function sprite engine.
#[derive(Parser, Debug, Clone)]
#[command(name = "glsprite-studio", version)]
pub struct StudioArgs {
    /// Number of sprites.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=4096))]
    pub sprites: u32,

    /// Target frame rate of the animator.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub fps: u32,

    /// Draw sprites as meshes instead of draw-texture blits.
    #[arg(long)]
    pub mesh: bool,

    /// Upload meshes into buffer objects.
    #[arg(long)]
    pub vbo: bool,

    /// Store mesh vertices as Q16.16 fixed point.
    #[arg(long)]
    pub fixed_point: bool,

    /// Pretend the context lacks the draw-texture extension.
    #[arg(long)]
    pub no_draw_texture: bool,

    /// Render into a recording context instead of a window.
    #[arg(long)]
    pub headless: bool,

    /// Exit after N frames.
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Simulate a graphics context loss after frame N.
    #[arg(long)]
    pub context_loss_at: Option<u64>,

    /// Drawable width in pixels.
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Drawable height in pixels.
    #[arg(long, default_value_t = 480)]
    pub height: u32,
}

/// How sprites are built and drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub sprite_count: usize,
    pub fps: u32,
    pub use_mesh: bool,
    pub use_hardware_buffers: bool,
    pub representation: Representation,
    /// Capabilities requested from the context.
    pub capabilities: Capabilities,
    pub max_frames: Option<u64>,
    pub context_loss_at: Option<u64>,
    pub width: u32,
    pub height: u32,
}

impl StudioArgs {
    pub fn scene_config(&self) -> SceneConfig {
        let capabilities = Capabilities {
            vertex_buffer_objects: self.vbo,
            draw_texture: !self.no_draw_texture,
        };

        // Blits have no fallback; without the extension the only way to draw
        // is by mesh.
        let use_mesh = self.mesh || !capabilities.draw_texture;
        if use_mesh && !self.mesh {
            log::warn!("draw-texture unavailable; drawing sprites as meshes");
        }
        if self.vbo && !use_mesh {
            log::warn!("--vbo has no effect on blit sprites");
        }
        if self.fixed_point && !use_mesh {
            log::warn!("--fixed-point has no effect on blit sprites");
        }

        let max_frames = match (self.max_frames, self.headless) {
            (None, true) => Some(DEFAULT_HEADLESS_FRAMES),
            (frames, _) => frames,
        };

        SceneConfig {
            sprite_count: self.sprites as usize,
            fps: self.fps,
            use_mesh,
            use_hardware_buffers: self.vbo && use_mesh,
            representation: if self.fixed_point {
                Representation::Fixed
            } else {
                Representation::Float
            },
            capabilities,
            max_frames,
            context_loss_at: self.context_loss_at,
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }
}
