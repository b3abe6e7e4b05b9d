//! Render targets: the screen plus framebuffers backed by render textures.

mod manager;
mod render_target;

pub use manager::{RenderTargets, TargetKey};
pub use render_target::RenderTarget;
