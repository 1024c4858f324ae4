/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available. Sprite textures are
    /// uploaded as sRGB, so this keeps colors as authored.
    pub prefer_srgb: bool,

    /// Present mode. FIFO paces presentation to the display; the animator
    /// paces frame requests independently.
    pub present_mode: wgpu::PresentMode,

    /// Surface alpha mode; falls back to a supported one when unavailable.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub power_preference: wgpu::PowerPreference,

    pub required_limits: wgpu::Limits,

    /// Hint only; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            power_preference: wgpu::PowerPreference::LowPower,
            // Downlevel limits match the GL ES class hardware this targets.
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}
