use crate::device::GraphicsDriver;
use crate::object_renderer::{ObjectRenderer, ObjectRendererId};

use super::Renderer;

impl<D: GraphicsDriver> Renderer<D> {
    /// Installs an object renderer and hands it the current context.
    pub fn register_object_renderer(
        &mut self,
        name: impl Into<String>,
        renderer: Box<dyn ObjectRenderer<D>>,
    ) -> ObjectRendererId {
        let id = self.object_renderers.register(name, renderer);
        if self.gpu_available() {
            let context = self.context.current();
            self.with_object_renderer(id, |r, this| r.context_changed(this, context));
        }
        id
    }

    pub fn object_renderer_id(&self, name: &str) -> Option<ObjectRendererId> {
        self.object_renderers.id(name)
    }

    #[inline]
    pub fn current_object_renderer(&self) -> ObjectRendererId {
        self.object_renderers.current()
    }

    /// Makes `id` the current object renderer.
    ///
    /// The previous one is stopped, the new one's state is applied, then it
    /// is started. Selecting the current renderer does nothing.
    pub fn set_object_renderer(&mut self, id: ObjectRendererId) {
        let previous = self.object_renderers.current();
        if id == previous || !self.gpu_available() {
            return;
        }
        if !self.object_renderers.contains(id) {
            log::warn!("unknown object renderer {id:?}");
            return;
        }

        self.with_object_renderer(previous, |r, this| r.stop(this));
        self.object_renderers.set_current(id);
        if let Some(state) = self.object_renderers.state_of(id) {
            self.res.state.set_state(&mut self.driver, state);
        }
        self.with_object_renderer(id, |r, this| r.start(this));
    }

    /// Draws all pending batched work by switching to the empty renderer.
    pub fn flush(&mut self) {
        self.set_object_renderer(ObjectRendererId::EMPTY);
    }

    /// Flushes the current object renderer but keeps it current.
    pub(crate) fn flush_object_renderer(&mut self) {
        let current = self.object_renderers.current();
        self.with_object_renderer(current, |r, this| r.flush(this));
    }

    /// Runs `f` with the renderer `id` detached from the registry.
    ///
    /// Re-entrant calls for the same id are skipped.
    pub(crate) fn with_object_renderer(
        &mut self,
        id: ObjectRendererId,
        f: impl FnOnce(&mut dyn ObjectRenderer<D>, &mut Self),
    ) {
        let Some(mut renderer) = self.object_renderers.take(id) else {
            return;
        };
        f(renderer.as_mut(), self);
        self.object_renderers.put_back(id, renderer);
    }
}
