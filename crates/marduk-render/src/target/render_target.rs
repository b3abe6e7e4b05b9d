use crate::coords::{Matrix, Rect};
use crate::device::{GraphicsDriver, RawFramebuffer};
use crate::paint::Color;

/// A framebuffer plus the frame and projection used to draw into it.
///
/// The root target is the screen (`framebuffer == None`) and flips y so that
/// logical coordinates grow downwards on both kinds of target.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    framebuffer: Option<RawFramebuffer>,
    frame: Rect,
    resolution: f32,
    transform: Option<Matrix>,
    projection: Matrix,
    clear_color: Color,
    root: bool,
}

impl RenderTarget {
    /// Screen target of `width`×`height` logical pixels.
    pub fn root(width: f32, height: f32, resolution: f32, clear_color: Color) -> Self {
        Self::build(None, Rect::from_size(width, height), resolution, clear_color, true)
    }

    /// Off-screen target drawing into `framebuffer`.
    pub fn offscreen(framebuffer: RawFramebuffer, frame: Rect) -> Self {
        Self::build(Some(framebuffer), frame, 1.0, Color::transparent(), false)
    }

    fn build(
        framebuffer: Option<RawFramebuffer>,
        frame: Rect,
        resolution: f32,
        clear_color: Color,
        root: bool,
    ) -> Self {
        let mut target = Self {
            framebuffer,
            frame,
            resolution,
            transform: None,
            projection: Matrix::IDENTITY,
            clear_color,
            root,
        };
        target.update_projection();
        target
    }

    #[inline]
    pub fn framebuffer(&self) -> Option<RawFramebuffer> {
        self.framebuffer
    }

    #[inline]
    pub fn frame(&self) -> Rect {
        self.frame
    }

    #[inline]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.root
    }

    #[inline]
    pub fn transform(&self) -> Option<Matrix> {
        self.transform
    }

    /// Maps logical coordinates in [`frame`](Self::frame) to clip space.
    #[inline]
    pub fn projection(&self) -> Matrix {
        self.projection
    }

    #[inline]
    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
        self.update_projection();
    }

    pub fn set_transform(&mut self, transform: Option<Matrix>) {
        self.transform = transform;
        self.update_projection();
    }

    /// Resizes the frame, keeping its origin.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.frame.width = width;
        self.frame.height = height;
        self.update_projection();
    }

    /// Viewport in physical pixels.
    pub fn viewport(&self) -> (i32, i32, u32, u32) {
        let px = self.frame.scaled(self.resolution);
        (
            px.x as i32,
            px.y as i32,
            px.width.max(0.0) as u32,
            px.height.max(0.0) as u32,
        )
    }

    /// Binds the framebuffer and sets the viewport.
    pub fn activate<D: GraphicsDriver>(&self, driver: &mut D) {
        driver.bind_framebuffer(self.framebuffer);
        let (x, y, width, height) = self.viewport();
        driver.viewport(x, y, width, height);
    }

    /// Clears the target; it must be the one bound.
    pub fn clear<D: GraphicsDriver>(&self, driver: &mut D, color: Option<Color>) {
        driver.clear(color.unwrap_or(self.clear_color));
    }

    fn update_projection(&mut self) {
        let f = self.frame;
        let w = if f.width == 0.0 { 1.0 } else { f.width };
        let h = if f.height == 0.0 { 1.0 } else { f.height };

        let a = 2.0 / w;
        let (d, ty_base) = if self.root { (-2.0 / h, 1.0) } else { (2.0 / h, -1.0) };
        let projection = Matrix::new(a, 0.0, 0.0, d, -1.0 - f.x * a, ty_base - f.y * d);

        self.projection = match self.transform {
            Some(t) => projection.append(t),
            None => projection,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-5 && (a.1 - b.1).abs() < 1e-5
    }

    #[test]
    fn root_projection_flips_y() {
        let t = RenderTarget::root(200.0, 100.0, 1.0, Color::black());
        let p = t.projection();
        assert!(approx(p.apply(0.0, 0.0), (-1.0, 1.0)));
        assert!(approx(p.apply(200.0, 100.0), (1.0, -1.0)));
    }

    #[test]
    fn offscreen_projection_keeps_y() {
        let t = RenderTarget::offscreen(RawFramebuffer(1), Rect::from_size(64.0, 32.0));
        let p = t.projection();
        assert!(approx(p.apply(0.0, 0.0), (-1.0, -1.0)));
        assert!(approx(p.apply(64.0, 32.0), (1.0, 1.0)));
    }

    #[test]
    fn transform_is_applied_before_projection() {
        let mut t = RenderTarget::offscreen(RawFramebuffer(1), Rect::from_size(10.0, 10.0));
        t.set_transform(Some(Matrix::translation(5.0, 5.0)));
        assert!(approx(t.projection().apply(0.0, 0.0), (0.0, 0.0)));
    }

    #[test]
    fn viewport_uses_resolution() {
        let t = RenderTarget::root(100.0, 50.0, 2.0, Color::black());
        assert_eq!(t.viewport(), (0, 0, 200, 100));
    }
}
