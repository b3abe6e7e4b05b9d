use crate::context::ContextAttributes;
use crate::error::{RendererError, Result};
use crate::paint::Color;
use crate::texture::GcSettings;

/// Renderer construction options.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererOptions {
    /// Screen size in logical pixels.
    pub width: f32,
    pub height: f32,

    /// Physical pixels per logical pixel.
    pub resolution: f32,

    pub antialias: bool,

    /// Whether the screen has an alpha channel. The root is then cleared to
    /// transparent instead of the background color.
    pub transparent: bool,

    pub stencil: bool,
    pub preserve_drawing_buffer: bool,
    pub premultiplied_alpha: bool,

    /// Whether [`render`](super::Renderer::render) clears the target unless told otherwise.
    pub clear_before_render: bool,

    /// `0xRRGGBB`.
    pub background_color: u32,

    pub gc: GcSettings,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            resolution: 1.0,
            antialias: false,
            transparent: false,
            stencil: true,
            preserve_drawing_buffer: false,
            premultiplied_alpha: true,
            clear_before_render: true,
            background_color: 0x000000,
            gc: GcSettings::default(),
        }
    }
}

impl RendererOptions {
    /// Attributes the context is created with; fixed for the renderer's life.
    pub fn context_attributes(&self) -> ContextAttributes {
        ContextAttributes {
            antialias: self.antialias,
            alpha: self.transparent,
            stencil: self.stencil,
            premultiplied_alpha: self.premultiplied_alpha,
            preserve_drawing_buffer: self.preserve_drawing_buffer,
        }
    }

    /// Clear color of the screen.
    pub fn background(&self) -> Color {
        if self.transparent {
            Color::transparent()
        } else {
            Color::from_hex(self.background_color, 1.0)
        }
    }

    /// Screen size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        physical(self.width, self.height, self.resolution)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(RendererError::Config(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        if !(self.width >= 0.0 && self.height >= 0.0) {
            return Err(RendererError::Config(format!(
                "screen size must not be negative, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

pub(crate) fn physical(width: f32, height: f32, resolution: f32) -> (u32, u32) {
    (
        (width * resolution).round().max(0.0) as u32,
        (height * resolution).round().max(0.0) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_screen_clears_to_nothing() {
        let opts = RendererOptions {
            transparent: true,
            background_color: 0xff0000,
            ..RendererOptions::default()
        };
        assert_eq!(opts.background(), Color::transparent());
        assert!(opts.context_attributes().alpha);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let opts = RendererOptions {
            resolution: 0.0,
            ..RendererOptions::default()
        };
        assert!(matches!(opts.validate(), Err(RendererError::Config(_))));
    }

    #[test]
    fn physical_size_scales_by_resolution() {
        let opts = RendererOptions {
            width: 100.0,
            height: 50.0,
            resolution: 2.0,
            ..RendererOptions::default()
        };
        assert_eq!(opts.physical_size(), (200, 100));
    }
}
