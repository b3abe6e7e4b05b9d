use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_RENDERER_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies one context generation of one renderer.
///
/// GPU-side handles are cached under the id that was current when they were
/// created. A restore issues a new id, so handles from a lost generation can
/// never be found again.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ContextId {
    renderer: u32,
    generation: u32,
}

impl ContextId {
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({}:{})", self.renderer, self.generation)
    }
}

/// Issues [`ContextId`]s for a single renderer.
#[derive(Debug)]
pub struct ContextIds {
    renderer: u32,
    generation: u32,
}

impl ContextIds {
    pub fn new() -> Self {
        Self {
            renderer: NEXT_RENDERER_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
        }
    }

    /// Starts a new generation and returns its id.
    pub fn issue(&mut self) -> ContextId {
        self.generation = self.generation.wrapping_add(1);
        ContextId {
            renderer: self.renderer,
            generation: self.generation,
        }
    }
}

impl Default for ContextIds {
    fn default() -> Self {
        Self::new()
    }
}
