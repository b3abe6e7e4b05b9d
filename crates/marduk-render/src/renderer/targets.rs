use crate::coords::Matrix;
use crate::device::GraphicsDriver;
use crate::paint::Color;
use crate::target::{RenderTarget, TargetKey};
use crate::texture::{RenderTexture, TextureLike};

use super::Renderer;
use super::options::physical;

impl<D: GraphicsDriver> Renderer<D> {
    /// Makes a render texture (or the screen, for `None`) the active target.
    ///
    /// The texture gets its storage and framebuffer on first use, is pulled
    /// out of every texture unit, and takes `transform` as its view
    /// transform.
    pub fn bind_render_texture(
        &mut self,
        target: Option<&RenderTexture>,
        transform: Option<Matrix>,
    ) {
        if !self.gpu_available() {
            return;
        }

        let key = target.map_or(TargetKey::Screen, |t| {
            TargetKey::Texture(t.base_texture().uid())
        });
        if key != self.res.targets.active_key() {
            self.flush_object_renderer();
        }
        if let Some(texture) = target {
            if !self.prepare_render_texture(texture, key) {
                return;
            }
        }

        if let Some(target) = self.res.targets.get_mut(key) {
            target.set_transform(transform);
        }
        if self.res.targets.active_key() != key {
            self.res.targets.activate(&mut self.driver, key);
        }
    }

    /// Activates an existing target.
    ///
    /// Switching to a different target flushes the current object renderer
    /// first. Re-binding the active target issues no driver calls.
    pub fn bind_render_target(&mut self, key: TargetKey) -> bool {
        if !self.gpu_available() {
            return false;
        }
        if self.res.targets.active_key() == key {
            return true;
        }
        if !self.res.targets.contains(key) {
            log::warn!("render target {key:?} does not exist");
            return false;
        }

        self.flush_object_renderer();
        self.res.targets.activate(&mut self.driver, key)
    }

    /// Uploads the backing texture and creates the framebuffer if needed.
    fn prepare_render_texture(&mut self, texture: &RenderTexture, key: TargetKey) -> bool {
        let context = self.context.current();
        let base = texture.base_texture();
        let res = &mut self.res;

        let current = base
            .gl_texture(context)
            .filter(|gl| gl.dirty_id == base.dirty_id());
        let gl = match current {
            Some(gl) => gl,
            None => {
                let uploaded =
                    res.textures
                        .update_texture(&mut self.driver, &mut res.slots, base, Some(0));
                let Some(gl) = uploaded else {
                    log::warn!("render texture {:?} has no area", base.uid());
                    return false;
                };
                gl
            }
        };
        if !res.targets.contains(key) {
            let framebuffer = self.driver.create_framebuffer(gl.texture);
            log::debug!("created {framebuffer:?} for render texture {:?}", base.uid());
            res.targets
                .insert(base.uid(), RenderTarget::offscreen(framebuffer, texture.frame()));
        }

        base.touch(res.gc.count());
        res.slots.unbind(&mut self.driver, context, base);
        let resized = match res.targets.get_mut(key) {
            Some(target) if target.frame() != texture.frame() => {
                target.set_frame(texture.frame());
                true
            }
            _ => false,
        };
        if resized && res.targets.active_key() == key {
            res.targets.activate(&mut self.driver, key);
        }
        true
    }

    #[inline]
    pub fn active_render_target(&self) -> &RenderTarget {
        self.res.targets.active()
    }

    #[inline]
    pub fn active_render_target_key(&self) -> TargetKey {
        self.res.targets.active_key()
    }

    /// Sets the view transform of the active target only.
    pub fn set_transform(&mut self, transform: Option<Matrix>) {
        self.res.targets.active_mut().set_transform(transform);
    }

    /// Clears the active target, to its own clear color unless one is given.
    pub fn clear(&mut self, color: Option<Color>) {
        if !self.gpu_available() {
            return;
        }
        self.res.targets.active().clear(&mut self.driver, color);
    }

    /// Resizes the screen, in logical pixels.
    ///
    /// While the context is lost only the size is recorded; it is applied on
    /// restoration.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.screen = (width, height);
        if !self.gpu_available() {
            return;
        }

        let (pw, ph) = physical(width, height, self.options.resolution);
        self.driver.resize_drawing_buffer(pw, ph);

        self.res.targets.root_mut().resize(width, height);
        if self.res.targets.active_key() == TargetKey::Screen {
            self.res.targets.activate(&mut self.driver, TargetKey::Screen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::renderer;
    use crate::coords::Matrix;
    use crate::device::DriverCall;
    use crate::paint::Color;
    use crate::target::TargetKey;
    use crate::texture::{RenderTexture, TextureLike};

    #[test]
    fn render_texture_gets_one_framebuffer() {
        let mut r = renderer(2);
        let rt = RenderTexture::new(32, 16);

        r.bind_render_texture(Some(&rt), None);
        r.bind_render_texture(None, None);
        r.bind_render_texture(Some(&rt), None);

        let created = r
            .driver()
            .count_calls(|c| matches!(c, DriverCall::CreateFramebuffer { .. }));
        assert_eq!(created, 1);
        assert_eq!(
            r.active_render_target_key(),
            TargetKey::Texture(rt.base_texture().uid())
        );
        assert_eq!(r.active_render_target().viewport(), (0, 0, 32, 16));
    }

    #[test]
    fn render_texture_is_never_resident_while_targeted() {
        let mut r = renderer(2);
        let rt = RenderTexture::new(8, 8);
        r.bind_texture(&rt, Some(1), false);

        r.bind_render_texture(Some(&rt), None);
        assert_eq!(r.texture_slots().find(rt.base_texture()), None);
    }

    #[test]
    fn resized_render_texture_is_reallocated() {
        let mut r = renderer(2);
        let mut rt = RenderTexture::new(8, 8);
        r.bind_render_texture(Some(&rt), None);
        rt.resize(16, 4);
        r.driver_mut().clear_calls();

        r.bind_render_texture(Some(&rt), None);
        let raw = rt.base_texture().gl_texture(r.context_id()).unwrap().texture;
        assert!(r.driver().calls().contains(&DriverCall::UploadTexture {
            texture: raw,
            width: 16,
            height: 4,
            has_pixels: false,
        }));
        let created = r
            .driver()
            .count_calls(|c| matches!(c, DriverCall::CreateFramebuffer { .. }));
        assert_eq!(created, 0);
        assert_eq!(r.active_render_target().viewport(), (0, 0, 16, 4));
    }

    #[test]
    fn rebinding_the_active_target_is_free() {
        let mut r = renderer(2);
        assert!(r.bind_render_target(TargetKey::Screen));
        assert!(r.driver().calls().is_empty());
    }

    #[test]
    fn transform_only_touches_the_active_target() {
        let mut r = renderer(2);
        let rt = RenderTexture::new(8, 8);
        let key = TargetKey::Texture(rt.base_texture().uid());
        let shift = Matrix::translation(1.0, 2.0);

        r.bind_render_texture(Some(&rt), None);
        r.set_transform(Some(shift));
        r.bind_render_target(TargetKey::Screen);
        assert_eq!(r.active_render_target().transform(), None);

        r.bind_render_target(key);
        assert_eq!(r.active_render_target().transform(), Some(shift));
    }

    #[test]
    fn resize_updates_the_drawing_buffer_and_viewport() {
        let mut r = renderer(2);
        r.resize(320.0, 240.0);
        assert_eq!(
            r.driver().calls(),
            &[
                DriverCall::ResizeDrawingBuffer { width: 320, height: 240 },
                DriverCall::BindFramebuffer(None),
                DriverCall::Viewport { x: 0, y: 0, width: 320, height: 240 },
            ]
        );
    }

    #[test]
    fn clear_uses_the_background_color() {
        let mut r = renderer(2);
        r.clear(None);
        assert_eq!(r.driver().calls(), &[DriverCall::Clear(Color::black())]);
    }
}
