//! Pluggable batch renderers and the registry that dispatches between them.
//!
//! Exactly one object renderer is current. Switching stops the old one
//! (flushing its batch), applies the new one's state, then starts it.

use crate::context::ContextId;
use crate::device::GraphicsDriver;
use crate::renderer::Renderer;
use crate::state::StateDesc;

/// Index of a registered object renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRendererId(usize);

impl ObjectRendererId {
    /// The sentinel renderer that draws nothing.
    pub const EMPTY: Self = Self(0);
}

/// A batching strategy for one class of drawables.
///
/// Every hook receives the renderer so it can bind textures and state. The
/// renderer being called is detached from the registry for the duration of
/// the call.
pub trait ObjectRenderer<D: GraphicsDriver> {
    /// State applied when this renderer becomes current.
    fn state(&self) -> Option<StateDesc> {
        None
    }

    fn start(&mut self, _renderer: &mut Renderer<D>) {}

    /// Becoming non-current. Pending work must be drawn here.
    fn stop(&mut self, renderer: &mut Renderer<D>) {
        self.flush(renderer);
    }

    /// Draws any batched work.
    fn flush(&mut self, _renderer: &mut Renderer<D>) {}

    /// A new context generation is ready; GPU objects must be re-acquired.
    fn context_changed(&mut self, _renderer: &mut Renderer<D>, _context: ContextId) {}

    fn destroy(&mut self, _renderer: &mut Renderer<D>) {}
}

/// Current by default and after every [`Renderer::flush`].
#[derive(Debug, Default)]
pub struct EmptyRenderer;

impl<D: GraphicsDriver> ObjectRenderer<D> for EmptyRenderer {}

struct Entry<D> {
    name: String,
    renderer: Option<Box<dyn ObjectRenderer<D>>>,
}

/// Name-keyed table of object renderers plus the current one.
pub struct ObjectRenderers<D> {
    entries: Vec<Entry<D>>,
    current: ObjectRendererId,
}

impl<D: GraphicsDriver> ObjectRenderers<D> {
    pub const EMPTY_NAME: &'static str = "empty";

    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                name: Self::EMPTY_NAME.to_owned(),
                renderer: Some(Box::new(EmptyRenderer)),
            }],
            current: ObjectRendererId::EMPTY,
        }
    }

    /// Adds `renderer` under `name`, replacing a previous one of that name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        renderer: Box<dyn ObjectRenderer<D>>,
    ) -> ObjectRendererId {
        let name = name.into();
        if let Some(id) = self.id(&name) {
            if id == ObjectRendererId::EMPTY {
                log::warn!("the empty object renderer cannot be replaced");
                return id;
            }
            log::debug!("replacing object renderer '{name}'");
            self.entries[id.0].renderer = Some(renderer);
            return id;
        }
        self.entries.push(Entry {
            name,
            renderer: Some(renderer),
        });
        ObjectRendererId(self.entries.len() - 1)
    }

    pub fn id(&self, name: &str) -> Option<ObjectRendererId> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .map(ObjectRendererId)
    }

    pub fn name(&self, id: ObjectRendererId) -> Option<&str> {
        self.entries.get(id.0).map(|e| e.name.as_str())
    }

    pub fn contains(&self, id: ObjectRendererId) -> bool {
        id.0 < self.entries.len()
    }

    #[inline]
    pub fn current(&self) -> ObjectRendererId {
        self.current
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<ObjectRendererId> {
        (0..self.entries.len()).map(ObjectRendererId).collect()
    }

    pub(crate) fn set_current(&mut self, id: ObjectRendererId) {
        self.current = id;
    }

    /// State descriptor of `id`, if it is not detached.
    pub(crate) fn state_of(&self, id: ObjectRendererId) -> Option<StateDesc> {
        self.entries
            .get(id.0)
            .and_then(|e| e.renderer.as_ref())
            .and_then(|r| r.state())
    }

    /// Detaches a renderer so it can be handed the owning [`Renderer`].
    pub(crate) fn take(&mut self, id: ObjectRendererId) -> Option<Box<dyn ObjectRenderer<D>>> {
        self.entries.get_mut(id.0).and_then(|e| e.renderer.take())
    }

    pub(crate) fn put_back(&mut self, id: ObjectRendererId, renderer: Box<dyn ObjectRenderer<D>>) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            if entry.renderer.is_none() {
                entry.renderer = Some(renderer);
            }
        }
    }
}

impl<D: GraphicsDriver> Default for ObjectRenderers<D> {
    fn default() -> Self {
        Self::new()
    }
}
