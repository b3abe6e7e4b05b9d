use std::rc::Rc;

use crate::context::ContextId;
use crate::device::GraphicsDriver;
use crate::target::TargetKey;
use crate::texture::{BaseTexture, GcMode, TextureGc, TextureLike, TextureSlots};

use super::Renderer;

impl<D: GraphicsDriver> Renderer<D> {
    /// Makes `texture` resident in a texture unit and returns that unit.
    ///
    /// A texture already resident anywhere is left where it is unless `force`
    /// is set. Otherwise `slot` is used, or the next unit in round-robin
    /// order. Forced binds default to unit 0. The returned unit is the one to
    /// hand to shaders. A `slot` past the last unit is clamped to it.
    pub fn bind_texture<T: TextureLike + ?Sized>(
        &mut self,
        texture: &T,
        slot: Option<usize>,
        force: bool,
    ) -> usize {
        let base = texture.base_texture().clone();
        self.bind_base_texture(base, slot, force)
    }

    /// Binds the placeholder of `slot` into it.
    pub fn bind_empty_texture(&mut self, slot: usize) -> usize {
        let slot = self.clamp_unit(slot);
        let placeholder = self.res.slots.placeholder(slot).clone();
        self.bind_base_texture(placeholder, Some(slot), false)
    }

    fn bind_base_texture(
        &mut self,
        base: Rc<BaseTexture>,
        slot: Option<usize>,
        force: bool,
    ) -> usize {
        if !self.gpu_available() {
            return slot.unwrap_or(0);
        }

        let slot = slot.map(|unit| self.clamp_unit(unit));
        let context = self.context.current();
        let res = &mut self.res;
        base.touch(res.gc.count());

        let unit = if force {
            slot.unwrap_or(0)
        } else if let Some(found) = res.slots.find(&base) {
            if is_stale(&base, context) {
                res.textures.update_texture(&mut self.driver, &mut res.slots, &base, Some(found));
            }
            return found;
        } else {
            slot.unwrap_or_else(|| res.slots.next_round_robin())
        };

        match base.gl_texture(context) {
            None => {
                log::trace!("uploading {:?} into unit {unit}", base.uid());
                res.textures.update_texture(&mut self.driver, &mut res.slots, &base, Some(unit));
            }
            Some(gl) if gl.dirty_id != base.dirty_id() => {
                res.textures.update_texture(&mut self.driver, &mut res.slots, &base, Some(unit));
            }
            Some(_) if res.slots.holds(unit, &base) => {}
            Some(gl) => {
                res.slots.set(unit, base);
                res.slots.activate(&mut self.driver, unit);
                self.driver.bind_texture(gl.texture);
            }
        }
        unit
    }

    fn clamp_unit(&self, unit: usize) -> usize {
        let last = self.res.slots.len() - 1;
        if unit > last {
            log::warn!("texture unit {unit} out of range; using unit {last}");
            return last;
        }
        unit
    }

    /// Puts placeholders back into every unit holding `texture`.
    pub fn unbind_texture<T: TextureLike + ?Sized>(&mut self, texture: &T) -> usize {
        if !self.gpu_available() {
            return 0;
        }
        let context = self.context.current();
        self.res
            .slots
            .unbind(&mut self.driver, context, texture.base_texture())
    }

    /// Deletes the GPU copy of `texture` in this context generation.
    ///
    /// The pixels stay on the CPU side; the next bind uploads them again. A
    /// render texture also loses its framebuffer.
    pub fn destroy_texture<T: TextureLike + ?Sized>(&mut self, texture: &T) -> bool {
        if !self.gpu_available() {
            return false;
        }
        let base = texture.base_texture();

        let key = TargetKey::Texture(base.uid());
        if self.res.targets.contains(key) {
            if self.res.targets.active_key() == key {
                self.flush_object_renderer();
                self.res.targets.activate(&mut self.driver, TargetKey::Screen);
            }
            self.res.targets.destroy(&mut self.driver, base.uid());
        }

        self.res
            .textures
            .destroy_texture(&mut self.driver, &mut self.res.slots, base)
    }

    /// Releases idle GPU textures now, whatever the collection mode.
    pub fn run_gc(&mut self) -> usize {
        if !self.gpu_available() {
            return 0;
        }
        let res = &mut self.res;
        res.gc.run(&mut self.driver, &mut res.textures, &mut res.slots)
    }

    pub fn set_gc_mode(&mut self, mode: GcMode) {
        self.res.gc.set_mode(mode);
    }

    #[inline]
    pub fn texture_gc(&self) -> &TextureGc {
        &self.res.gc
    }

    /// Current occupancy of the texture units.
    #[inline]
    pub fn texture_slots(&self) -> &TextureSlots {
        &self.res.slots
    }

    /// Number of textures with a GPU copy in this generation.
    pub fn managed_texture_count(&self) -> usize {
        self.res.textures.managed().len()
    }
}

fn is_stale(base: &BaseTexture, context: ContextId) -> bool {
    base.gl_texture(context)
        .is_some_and(|gl| gl.dirty_id != base.dirty_id())
}
