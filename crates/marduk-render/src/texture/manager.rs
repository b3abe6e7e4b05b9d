use std::rc::Rc;

use crate::context::ContextId;
use crate::device::{GraphicsDriver, TextureUpload};

use super::base::{BaseTexture, GlTexture};
use super::slots::TextureSlots;

/// Creates, refreshes and deletes the GPU copies of logical textures for one
/// context generation.
///
/// Every texture with a live GPU copy is in the managed list, which is what
/// the garbage collector scans.
#[derive(Debug)]
pub struct TextureManager {
    context: ContextId,
    premultiplied_alpha: bool,
    managed: Vec<Rc<BaseTexture>>,
}

impl TextureManager {
    pub fn new(context: ContextId, premultiplied_alpha: bool) -> Self {
        Self {
            context,
            premultiplied_alpha,
            managed: Vec::new(),
        }
    }

    #[inline]
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Textures that currently own a GPU copy.
    pub fn managed(&self) -> &[Rc<BaseTexture>] {
        &self.managed
    }

    /// Uploads `texture` and leaves it bound on `unit`.
    ///
    /// Creates the GPU copy if this generation has none, otherwise re-uploads
    /// into the existing one. Without a unit, the unit already holding the
    /// texture is reused, falling back to unit 0. Returns `None` for textures
    /// that cannot be uploaded.
    pub fn update_texture<D: GraphicsDriver>(
        &mut self,
        driver: &mut D,
        slots: &mut TextureSlots,
        texture: &Rc<BaseTexture>,
        unit: Option<usize>,
    ) -> Option<GlTexture> {
        if !texture.is_valid() {
            log::debug!("texture {:?} has no area; upload skipped", texture.uid());
            return None;
        }

        let unit = unit.or_else(|| slots.find(texture)).unwrap_or(0);
        slots.set(unit, texture.clone());
        slots.activate(driver, unit);

        let raw = match texture.gl_texture(self.context) {
            Some(gl) => gl.texture,
            None => {
                let raw = driver.create_texture();
                self.managed.push(texture.clone());
                log::trace!("created {raw:?} for texture {:?}", texture.uid());
                raw
            }
        };
        driver.bind_texture(raw);

        let gl = texture.with_source(|source, dirty_id| {
            driver.upload_texture(
                raw,
                &TextureUpload {
                    width: source.width(),
                    height: source.height(),
                    pixels: source.pixels(),
                    premultiplied_alpha: self.premultiplied_alpha,
                },
            );
            GlTexture {
                texture: raw,
                dirty_id,
                width: source.width(),
                height: source.height(),
            }
        });
        texture.set_gl_texture(self.context, gl);
        Some(gl)
    }

    /// Deletes the GPU copy of `texture`, first releasing any unit it occupies.
    ///
    /// The logical texture and its pixels stay intact.
    pub fn destroy_texture<D: GraphicsDriver>(
        &mut self,
        driver: &mut D,
        slots: &mut TextureSlots,
        texture: &Rc<BaseTexture>,
    ) -> bool {
        let destroyed = self.release(driver, slots, texture);
        if destroyed {
            self.managed.retain(|t| !Rc::ptr_eq(t, texture));
        }
        destroyed
    }

    /// Deletes the GPU copies of textures idle for more than `max_idle` frames.
    ///
    /// Render-target textures are skipped. Returns how many were evicted.
    pub fn evict_idle<D: GraphicsDriver>(
        &mut self,
        driver: &mut D,
        slots: &mut TextureSlots,
        now: u64,
        max_idle: u64,
    ) -> usize {
        let candidates = std::mem::take(&mut self.managed);
        let mut evicted = 0;

        for texture in candidates {
            let idle = now.saturating_sub(texture.touched());
            if !texture.is_render_target() && idle > max_idle {
                if self.release(driver, slots, &texture) {
                    evicted += 1;
                }
            } else {
                self.managed.push(texture);
            }
        }

        if evicted > 0 {
            log::debug!("texture gc evicted {evicted} texture(s) at frame {now}");
        }
        evicted
    }

    /// Drops every handle of this generation without calling the driver.
    ///
    /// Used after a context loss, when the objects are already gone. Handles
    /// other contexts hold on the same textures are left alone.
    pub fn forget_all(&mut self) {
        for texture in self.managed.drain(..) {
            texture.take_gl_texture(self.context);
        }
    }

    /// Deletes every managed GPU copy.
    pub fn destroy_all<D: GraphicsDriver>(&mut self, driver: &mut D, slots: &mut TextureSlots) {
        for texture in std::mem::take(&mut self.managed) {
            self.release(driver, slots, &texture);
        }
    }

    fn release<D: GraphicsDriver>(
        &mut self,
        driver: &mut D,
        slots: &mut TextureSlots,
        texture: &Rc<BaseTexture>,
    ) -> bool {
        let Some(gl) = texture.take_gl_texture(self.context) else {
            return false;
        };
        slots.unbind(driver, self.context, texture);
        driver.delete_texture(gl.texture);
        true
    }
}
