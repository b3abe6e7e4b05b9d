use crate::device::GraphicsDriver;

use super::manager::TextureManager;
use super::slots::TextureSlots;

/// When the collector scans.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum GcMode {
    /// Scan every `check_period` frames.
    #[default]
    Auto,
    /// Only scan on an explicit [`TextureGc::run`].
    Manual,
}

/// Texture garbage-collection settings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GcSettings {
    pub mode: GcMode,

    /// Frames a texture may go unbound before its GPU copy is released.
    pub max_idle: u64,

    /// Frames between automatic scans.
    pub check_period: u32,
}

impl Default for GcSettings {
    fn default() -> Self {
        Self {
            mode: GcMode::Auto,
            max_idle: 60 * 60,
            check_period: 60 * 10,
        }
    }
}

/// Frame-counting collector for idle GPU textures.
///
/// Binds stamp textures with [`count`](Self::count). A scan visits only the
/// managed textures, never the bind history.
#[derive(Debug)]
pub struct TextureGc {
    settings: GcSettings,
    count: u64,
    check_count: u32,
}

impl TextureGc {
    pub fn new(settings: GcSettings) -> Self {
        Self {
            settings,
            count: 0,
            check_count: 0,
        }
    }

    /// Frames rendered in this context generation.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn settings(&self) -> GcSettings {
        self.settings
    }

    pub fn set_mode(&mut self, mode: GcMode) {
        self.settings.mode = mode;
    }

    /// Advances one frame. Returns true when an automatic scan is due.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.settings.mode == GcMode::Manual {
            return false;
        }

        self.check_count += 1;
        if self.check_count > self.settings.check_period {
            self.check_count = 0;
            return true;
        }
        false
    }

    /// Releases the GPU copies of idle textures. Returns how many were released.
    pub fn run<D: GraphicsDriver>(
        &self,
        driver: &mut D,
        textures: &mut TextureManager,
        slots: &mut TextureSlots,
    ) -> usize {
        textures.evict_idle(driver, slots, self.count, self.settings.max_idle)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::context::ContextIds;
    use crate::device::{DriverCall, RecordingDriver};
    use crate::texture::{BaseTexture, TextureSource};

    fn fixture(units: usize) -> (RecordingDriver, TextureManager, TextureSlots) {
        let ctx = ContextIds::new().issue();
        let driver = RecordingDriver::new(units);
        let slots = TextureSlots::new(
            (0..units)
                .map(|_| BaseTexture::new(TextureSource::transparent_pixel()))
                .collect(),
        );
        (driver, TextureManager::new(ctx, true), slots)
    }

    fn pixel() -> Rc<BaseTexture> {
        BaseTexture::new(TextureSource::from_pixels(1, 1, &[[255, 0, 0, 255]]))
    }

    #[test]
    fn manual_mode_never_schedules() {
        let mut gc = TextureGc::new(GcSettings {
            mode: GcMode::Manual,
            max_idle: 1,
            check_period: 0,
        });
        assert!(!(0..10).any(|_| gc.tick()));
        assert_eq!(gc.count(), 10);
    }

    #[test]
    fn auto_mode_schedules_after_period() {
        let mut gc = TextureGc::new(GcSettings {
            mode: GcMode::Auto,
            max_idle: 1,
            check_period: 2,
        });
        assert!(!gc.tick());
        assert!(!gc.tick());
        assert!(gc.tick());
        assert!(!gc.tick());
    }

    #[test]
    fn evicts_only_idle_textures() {
        let (mut driver, mut textures, mut slots) = fixture(2);
        let mut gc = TextureGc::new(GcSettings {
            mode: GcMode::Manual,
            max_idle: 2,
            check_period: 0,
        });

        let stale = pixel();
        let fresh = pixel();
        textures.update_texture(&mut driver, &mut slots, &stale, Some(0));
        for _ in 0..5 {
            gc.tick();
        }
        fresh.touch(gc.count());
        textures.update_texture(&mut driver, &mut slots, &fresh, Some(1));

        assert_eq!(gc.run(&mut driver, &mut textures, &mut slots), 1);
        assert!(!stale.has_gl_texture(textures.context()));
        assert!(fresh.has_gl_texture(textures.context()));
        assert!(slots.is_vacant(0));
    }

    #[test]
    fn second_scan_evicts_nothing() {
        let (mut driver, mut textures, mut slots) = fixture(2);
        let mut gc = TextureGc::new(GcSettings {
            mode: GcMode::Manual,
            max_idle: 0,
            check_period: 0,
        });
        textures.update_texture(&mut driver, &mut slots, &pixel(), Some(0));
        textures.update_texture(&mut driver, &mut slots, &pixel(), Some(1));
        gc.tick();

        assert_eq!(gc.run(&mut driver, &mut textures, &mut slots), 2);
        let deletes = driver.count_calls(|c| matches!(c, DriverCall::DeleteTexture(_)));
        assert_eq!(gc.run(&mut driver, &mut textures, &mut slots), 0);
        assert_eq!(
            driver.count_calls(|c| matches!(c, DriverCall::DeleteTexture(_))),
            deletes
        );
    }

    #[test]
    fn render_targets_are_kept() {
        let (mut driver, mut textures, mut slots) = fixture(1);
        let mut gc = TextureGc::new(GcSettings {
            mode: GcMode::Manual,
            max_idle: 0,
            check_period: 0,
        });
        let target = BaseTexture::new_render_target(8, 8);
        textures.update_texture(&mut driver, &mut slots, &target, Some(0));
        gc.tick();
        gc.tick();

        assert_eq!(gc.run(&mut driver, &mut textures, &mut slots), 0);
        assert_eq!(textures.managed().len(), 1);
    }
}
