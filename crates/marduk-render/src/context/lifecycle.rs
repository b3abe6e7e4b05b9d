use super::id::{ContextId, ContextIds};

/// Context attributes frozen at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ContextAttributes {
    pub antialias: bool,
    pub alpha: bool,
    pub stencil: bool,
    pub premultiplied_alpha: bool,
    pub preserve_drawing_buffer: bool,
}

/// Whether GPU work may be issued.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContextStatus {
    Usable,
    Lost,
}

/// Notification handed to the renderer when the host reports a context loss.
///
/// The renderer always calls [`prevent_default`](Self::prevent_default) so the
/// host leaves restoration timing to the engine.
#[derive(Debug, Default)]
pub struct ContextLostEvent {
    default_prevented: bool,
}

impl ContextLostEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Tracks the current context generation and its usability.
#[derive(Debug)]
pub struct ContextLifecycle {
    ids: ContextIds,
    current: ContextId,
    status: ContextStatus,
    attributes: ContextAttributes,
}

impl ContextLifecycle {
    pub fn new(attributes: ContextAttributes) -> Self {
        let mut ids = ContextIds::new();
        let current = ids.issue();
        Self {
            ids,
            current,
            status: ContextStatus::Usable,
            attributes,
        }
    }

    #[inline]
    pub fn current(&self) -> ContextId {
        self.current
    }

    #[inline]
    pub fn status(&self) -> ContextStatus {
        self.status
    }

    #[inline]
    pub fn is_usable(&self) -> bool {
        self.status == ContextStatus::Usable
    }

    #[inline]
    pub fn attributes(&self) -> ContextAttributes {
        self.attributes
    }

    pub fn mark_lost(&mut self) {
        if self.status == ContextStatus::Usable {
            log::warn!("graphics context lost ({:?})", self.current);
        }
        self.status = ContextStatus::Lost;
    }

    /// Invalidates the current id and starts a usable generation.
    pub fn begin_generation(&mut self) -> ContextId {
        self.current = self.ids.issue();
        self.status = ContextStatus::Usable;
        log::debug!("context generation {:?} started", self.current);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> ContextAttributes {
        ContextAttributes {
            antialias: false,
            alpha: false,
            stencil: true,
            premultiplied_alpha: true,
            preserve_drawing_buffer: false,
        }
    }

    #[test]
    fn loss_then_new_generation() {
        let mut ctx = ContextLifecycle::new(attrs());
        let first = ctx.current();
        ctx.mark_lost();
        assert!(!ctx.is_usable());

        let second = ctx.begin_generation();
        assert!(ctx.is_usable());
        assert_ne!(first, second);
    }
}
