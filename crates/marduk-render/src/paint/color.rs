/// Premultiplied RGBA clear color.
///
/// `rgb` is already multiplied by `a`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn transparent() -> Self {
        Self::from_premul(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::from_premul(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn from_premul(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `0xRRGGBB` with straight `alpha`, the form background colors are
    /// configured in.
    pub fn from_hex(rgb: u32, alpha: f32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        let a = alpha.clamp(0.0, 1.0);
        Self {
            r: channel(16) * a,
            g: channel(8) * a,
            b: channel(0) * a,
            a,
        }
    }

    /// Back to `0xRRGGBB`; zero for a fully transparent color.
    pub fn to_hex(self) -> u32 {
        if self.a <= 0.0 {
            return 0;
        }
        let channel = |v: f32| ((v / self.a).clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub(crate) fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}
