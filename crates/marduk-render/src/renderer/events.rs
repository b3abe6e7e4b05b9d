use crate::context::ContextId;

/// Notifications emitted by a [`Renderer`](super::Renderer).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RendererEvent {
    /// A context generation is ready; GPU objects must be (re)acquired.
    Context(ContextId),
    PreRender,
    PostRender,
}

/// Handle returned by [`Renderer::on`](super::Renderer::on).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&RendererEvent)>;

#[derive(Default)]
pub(crate) struct Listeners {
    next: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub fn add(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.entries.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(l, _)| *l != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: RendererEvent) {
        for (_, listener) in &mut self.entries {
            listener(&event);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
