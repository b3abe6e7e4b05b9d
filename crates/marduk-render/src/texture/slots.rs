use std::rc::Rc;

use crate::context::ContextId;
use crate::device::GraphicsDriver;

use super::base::BaseTexture;

/// Which logical texture occupies each hardware texture unit.
///
/// Every unit always holds something: either a real texture or that unit's
/// placeholder. Lookups scan from unit 0 so duplicate occupancy left behind by
/// forced binds still resolves to the lowest unit.
#[derive(Debug)]
pub struct TextureSlots {
    bound: Vec<Rc<BaseTexture>>,
    placeholders: Vec<Rc<BaseTexture>>,

    /// Round-robin cursor for binds without a suggested unit.
    next_location: usize,

    /// Unit selected at the driver, if known.
    active_unit: Option<usize>,
}

impl TextureSlots {
    /// Creates a table with every unit holding its placeholder.
    pub fn new(placeholders: Vec<Rc<BaseTexture>>) -> Self {
        debug_assert!(!placeholders.is_empty(), "texture slot table needs at least one unit");
        Self {
            bound: placeholders.clone(),
            placeholders,
            next_location: 0,
            active_unit: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Texture occupying `unit`.
    #[inline]
    pub fn get(&self, unit: usize) -> &Rc<BaseTexture> {
        &self.bound[unit]
    }

    /// Lowest unit holding `texture`.
    pub fn find(&self, texture: &Rc<BaseTexture>) -> Option<usize> {
        self.bound.iter().position(|t| Rc::ptr_eq(t, texture))
    }

    #[inline]
    pub fn holds(&self, unit: usize, texture: &Rc<BaseTexture>) -> bool {
        Rc::ptr_eq(&self.bound[unit], texture)
    }

    #[inline]
    pub fn placeholder(&self, unit: usize) -> &Rc<BaseTexture> {
        &self.placeholders[unit]
    }

    /// Returns true if `unit` holds its placeholder.
    #[inline]
    pub fn is_vacant(&self, unit: usize) -> bool {
        Rc::ptr_eq(&self.bound[unit], &self.placeholders[unit])
    }

    pub(crate) fn set(&mut self, unit: usize, texture: Rc<BaseTexture>) {
        self.bound[unit] = texture;
    }

    /// Picks the next unit for a bind without a suggestion.
    ///
    /// Walks the table downwards from the top so every unit is reused in turn.
    pub(crate) fn next_round_robin(&mut self) -> usize {
        let len = self.bound.len();
        self.next_location = (self.next_location + 1) % len;
        len - self.next_location - 1
    }

    pub(crate) fn reset_round_robin(&mut self) {
        self.next_location = 0;
    }

    /// Selects `unit` at the driver unless it already is.
    pub(crate) fn activate<D: GraphicsDriver>(&mut self, driver: &mut D, unit: usize) {
        if self.active_unit != Some(unit) {
            driver.active_texture(unit);
            self.active_unit = Some(unit);
        }
    }

    /// Forgets which unit is selected (after unmanaged driver use).
    pub(crate) fn invalidate_active_unit(&mut self) {
        self.active_unit = None;
    }

    /// Puts `unit`'s placeholder back, at the driver as well.
    pub(crate) fn bind_placeholder<D: GraphicsDriver>(
        &mut self,
        driver: &mut D,
        context: ContextId,
        unit: usize,
    ) {
        let placeholder = self.placeholders[unit].clone();
        self.activate(driver, unit);
        if let Some(gl) = placeholder.gl_texture(context) {
            driver.bind_texture(gl.texture);
        }
        self.bound[unit] = placeholder;
    }

    /// Replaces every occurrence of `texture` with the unit's placeholder.
    ///
    /// Returns the number of units that were released.
    pub(crate) fn unbind<D: GraphicsDriver>(
        &mut self,
        driver: &mut D,
        context: ContextId,
        texture: &Rc<BaseTexture>,
    ) -> usize {
        let mut released = 0;
        for unit in 0..self.bound.len() {
            if Rc::ptr_eq(&self.bound[unit], texture) {
                self.bind_placeholder(driver, context, unit);
                released += 1;
            }
        }
        released
    }
}
