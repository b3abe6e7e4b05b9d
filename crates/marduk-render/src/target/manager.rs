use std::collections::HashMap;

use crate::device::{GraphicsDriver, RawFramebuffer};
use crate::texture::TextureUid;

use super::render_target::RenderTarget;

/// Names a render target: the screen or a render texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TargetKey {
    Screen,
    Texture(TextureUid),
}

/// The root target, every off-screen target of this context generation, and
/// which one is active.
#[derive(Debug)]
pub struct RenderTargets {
    root: RenderTarget,
    offscreen: HashMap<TextureUid, RenderTarget>,
    active: TargetKey,
}

impl RenderTargets {
    pub fn new(root: RenderTarget) -> Self {
        Self {
            root,
            offscreen: HashMap::new(),
            active: TargetKey::Screen,
        }
    }

    #[inline]
    pub fn root(&self) -> &RenderTarget {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut RenderTarget {
        &mut self.root
    }

    #[inline]
    pub fn active_key(&self) -> TargetKey {
        self.active
    }

    pub fn get(&self, key: TargetKey) -> Option<&RenderTarget> {
        match key {
            TargetKey::Screen => Some(&self.root),
            TargetKey::Texture(uid) => self.offscreen.get(&uid),
        }
    }

    pub(crate) fn get_mut(&mut self, key: TargetKey) -> Option<&mut RenderTarget> {
        match key {
            TargetKey::Screen => Some(&mut self.root),
            TargetKey::Texture(uid) => self.offscreen.get_mut(&uid),
        }
    }

    /// The active target. Falls back to the root if the key went stale.
    pub fn active(&self) -> &RenderTarget {
        self.get(self.active).unwrap_or(&self.root)
    }

    pub(crate) fn active_mut(&mut self) -> &mut RenderTarget {
        match self.active {
            TargetKey::Screen => &mut self.root,
            TargetKey::Texture(uid) => match self.offscreen.get_mut(&uid) {
                Some(target) => target,
                None => &mut self.root,
            },
        }
    }

    pub fn contains(&self, key: TargetKey) -> bool {
        self.get(key).is_some()
    }

    pub fn offscreen_count(&self) -> usize {
        self.offscreen.len()
    }

    pub(crate) fn insert(&mut self, uid: TextureUid, target: RenderTarget) {
        self.offscreen.insert(uid, target);
    }

    /// Makes `key` active and binds it. Unknown keys are ignored.
    pub(crate) fn activate<D: GraphicsDriver>(&mut self, driver: &mut D, key: TargetKey) -> bool {
        let Some(target) = self.get(key) else {
            log::warn!("render target {key:?} does not exist");
            return false;
        };
        target.activate(driver);
        self.active = key;
        true
    }

    /// Removes the off-screen target of `uid` and deletes its framebuffer.
    ///
    /// If it was active, the root becomes active (not re-bound).
    pub(crate) fn destroy<D: GraphicsDriver>(&mut self, driver: &mut D, uid: TextureUid) -> bool {
        let Some(target) = self.offscreen.remove(&uid) else {
            return false;
        };
        if let Some(fb) = target.framebuffer() {
            driver.delete_framebuffer(fb);
        }
        if self.active == TargetKey::Texture(uid) {
            self.active = TargetKey::Screen;
        }
        true
    }

    pub(crate) fn destroy_all<D: GraphicsDriver>(&mut self, driver: &mut D) {
        for (_, target) in self.offscreen.drain() {
            if let Some(fb) = target.framebuffer() {
                driver.delete_framebuffer(fb);
            }
        }
        self.active = TargetKey::Screen;
    }

    /// Framebuffers of every off-screen target.
    pub fn framebuffers(&self) -> impl Iterator<Item = RawFramebuffer> + '_ {
        self.offscreen.values().filter_map(RenderTarget::framebuffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::device::{DriverCall, RecordingDriver};
    use crate::paint::Color;
    use crate::texture::{RenderTexture, TextureLike};

    fn targets() -> RenderTargets {
        RenderTargets::new(RenderTarget::root(100.0, 100.0, 1.0, Color::black()))
    }

    #[test]
    fn activate_binds_framebuffer_and_viewport() {
        let mut driver = RecordingDriver::new(1);
        let mut t = targets();
        t.activate(&mut driver, TargetKey::Screen);
        assert_eq!(
            driver.take_calls(),
            vec![
                DriverCall::BindFramebuffer(None),
                DriverCall::Viewport { x: 0, y: 0, width: 100, height: 100 },
            ]
        );
    }

    #[test]
    fn unknown_key_keeps_active() {
        let mut driver = RecordingDriver::new(1);
        let mut t = targets();
        let rt = RenderTexture::new(4, 4);
        assert!(!t.activate(&mut driver, TargetKey::Texture(rt.base_texture().uid())));
        assert_eq!(t.active_key(), TargetKey::Screen);
        assert!(driver.calls().is_empty());
    }

    #[test]
    fn destroying_active_target_falls_back_to_root() {
        let mut driver = RecordingDriver::new(1);
        let mut t = targets();
        let rt = RenderTexture::new(4, 4);
        let uid = rt.base_texture().uid();
        let color = crate::device::GraphicsDriver::create_texture(&mut driver);
        let fb = crate::device::GraphicsDriver::create_framebuffer(&mut driver, color);

        t.insert(uid, RenderTarget::offscreen(fb, Rect::from_size(4.0, 4.0)));
        t.activate(&mut driver, TargetKey::Texture(uid));
        assert!(t.destroy(&mut driver, uid));

        assert_eq!(t.active_key(), TargetKey::Screen);
        assert!(driver.calls().contains(&DriverCall::DeleteFramebuffer(fb)));
        assert_eq!(driver.invalid_handle_uses(), 0);
    }
}
