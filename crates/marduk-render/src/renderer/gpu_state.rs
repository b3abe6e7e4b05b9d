use crate::context::ContextId;
use crate::device::{GraphicsDriver, RawVertexArray};
use crate::shader::Shader;
use crate::state::{BlendMode, RenderState, StateDesc};

use super::Renderer;

/// A vertex array created through the renderer, valid in one context
/// generation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexArrayObject {
    raw: RawVertexArray,
    context: ContextId,
}

impl VertexArrayObject {
    #[inline]
    pub fn raw(&self) -> RawVertexArray {
        self.raw
    }

    #[inline]
    pub fn context(&self) -> ContextId {
        self.context
    }
}

impl<D: GraphicsDriver> Renderer<D> {
    /// Last state applied at the driver.
    #[inline]
    pub fn render_state(&self) -> &RenderState {
        &self.res.state
    }

    pub fn set_state(&mut self, desc: StateDesc) {
        if self.gpu_available() {
            self.res.state.set_state(&mut self.driver, desc);
        }
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        if self.gpu_available() {
            self.res.state.set_blend_mode(&mut self.driver, mode);
        }
    }

    /// Saves the current state descriptor.
    pub fn push_state(&mut self) {
        self.res.state.push();
    }

    /// Restores the last saved state descriptor.
    pub fn pop_state(&mut self) {
        if self.gpu_available() {
            self.res.state.pop(&mut self.driver);
        }
    }

    /// `None` while the context is lost.
    pub fn create_vertex_array_object(&mut self) -> Option<VertexArrayObject> {
        if !self.gpu_available() {
            return None;
        }
        let raw = self.driver.create_vertex_array();
        self.res.vertex_arrays.push(raw);
        Some(VertexArrayObject {
            raw,
            context: self.context.current(),
        })
    }

    /// Binds `vao`, or unbinds with `None`. Already-bound arrays are skipped.
    ///
    /// Arrays from an earlier context generation are refused.
    pub fn bind_vertex_array_object(&mut self, vao: Option<&VertexArrayObject>) {
        if !self.gpu_available() {
            return;
        }
        let raw = match vao {
            Some(vao) if vao.context != self.context.current() => {
                log::warn!("{:?} belongs to {:?}; unbinding", vao.raw, vao.context);
                None
            }
            Some(vao) => Some(vao.raw),
            None => None,
        };
        self.res.state.bind_vertex_array(&mut self.driver, raw);
    }

    pub fn destroy_vertex_array_object(&mut self, vao: VertexArrayObject) {
        if !self.gpu_available() || vao.context != self.context.current() {
            return;
        }
        if self.res.state.vertex_array() == Some(vao.raw) {
            self.res.state.bind_vertex_array(&mut self.driver, None);
        }
        self.res.vertex_arrays.retain(|&v| v != vao.raw);
        self.driver.delete_vertex_array(vao.raw);
    }

    /// Program for a (vertex, fragment) pair, compiled once per generation.
    ///
    /// `None` without a program provider, while lost, or if compilation fails.
    pub fn shader(&mut self, vertex: &str, fragment: &str) -> Option<Shader> {
        if !self.gpu_available() {
            return None;
        }
        let provider = self.program_provider.as_deref_mut()?;
        self.res.shaders.get_or_compile(provider, vertex, fragment)
    }

    /// Makes `shader` the active program. Returns true if the driver was called.
    pub fn bind_shader(&mut self, shader: &Shader) -> bool {
        if !self.gpu_available() {
            return false;
        }
        if shader.context() != self.context.current() {
            log::warn!("{:?} belongs to {:?}; not bound", shader.program(), shader.context());
            return false;
        }
        self.res.state.use_program(&mut self.driver, Some(shader.program()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::renderer;
    use crate::context::{ContextId, ContextLostEvent};
    use crate::device::{DriverCall, RawProgram};
    use crate::shader::ProgramProvider;

    struct Sequential(u32);

    impl ProgramProvider for Sequential {
        fn compile(&mut self, _: ContextId, _: &str, _: &str) -> Option<RawProgram> {
            self.0 += 1;
            Some(RawProgram(self.0))
        }
    }

    #[test]
    fn vertex_array_binds_are_deduplicated() {
        let mut r = renderer(2);
        let vao = r.create_vertex_array_object().unwrap();

        r.bind_vertex_array_object(Some(&vao));
        r.bind_vertex_array_object(Some(&vao));
        r.bind_vertex_array_object(None);

        let binds: Vec<_> = r
            .driver()
            .calls()
            .iter()
            .filter(|c| matches!(c, DriverCall::BindVertexArray(_)))
            .cloned()
            .collect();
        assert_eq!(
            binds,
            vec![
                DriverCall::BindVertexArray(Some(vao.raw())),
                DriverCall::BindVertexArray(None),
            ]
        );
    }

    #[test]
    fn vertex_array_from_a_lost_generation_is_refused() {
        let mut r = renderer(2);
        let vao = r.create_vertex_array_object().unwrap();
        r.driver_mut().simulate_context_loss();
        r.handle_context_lost(&mut ContextLostEvent::new());
        r.handle_context_restored();
        r.driver_mut().clear_calls();

        r.bind_vertex_array_object(Some(&vao));
        assert_eq!(r.driver().invalid_handle_uses(), 0);
        assert!(r.driver().calls().is_empty());
    }

    #[test]
    fn shaders_are_cached_and_bound_once() {
        let mut r = renderer(2);
        r.set_program_provider(Box::new(Sequential(0)));

        let a = r.shader("vs", "fs").unwrap();
        let b = r.shader("vs", "fs").unwrap();
        assert_eq!(a, b);

        assert!(r.bind_shader(&a));
        assert!(!r.bind_shader(&b));
        assert_eq!(
            r.driver().count_calls(|c| matches!(c, DriverCall::UseProgram(_))),
            1
        );
    }

    #[test]
    fn no_provider_means_no_shader() {
        let mut r = renderer(2);
        assert!(r.shader("vs", "fs").is_none());
    }

    #[test]
    fn destroying_the_bound_vao_unbinds_it() {
        let mut r = renderer(2);
        let vao = r.create_vertex_array_object().unwrap();
        r.bind_vertex_array_object(Some(&vao));
        r.destroy_vertex_array_object(vao);

        assert_eq!(r.render_state().vertex_array(), None);
        assert_eq!(r.driver().invalid_handle_uses(), 0);
    }
}
