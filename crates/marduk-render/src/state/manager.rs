use crate::device::{Capability, GraphicsDriver, RawProgram, RawVertexArray};

use super::blend::BlendMode;

/// Declarative fixed-function state, as requested by an object renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StateDesc {
    pub blend: bool,
    pub blend_mode: BlendMode,
    pub depth_test: bool,
    pub cull_face: bool,
    pub front_face_clockwise: bool,
}

impl Default for StateDesc {
    fn default() -> Self {
        Self {
            blend: true,
            blend_mode: BlendMode::Normal,
            depth_test: false,
            cull_face: false,
            front_face_clockwise: false,
        }
    }
}

/// Last state applied at the driver.
///
/// Every setter compares against the recorded value and only reaches the
/// driver on a change. `None` means unknown: the next set always applies.
#[derive(Debug, Default)]
pub struct RenderState {
    blend: Option<bool>,
    blend_mode: Option<BlendMode>,
    depth_test: Option<bool>,
    cull_face: Option<bool>,
    front_face_clockwise: Option<bool>,

    vertex_array: Option<RawVertexArray>,
    program: Option<RawProgram>,

    stack: Vec<StateDesc>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applied descriptor, if every field is known.
    pub fn current(&self) -> Option<StateDesc> {
        Some(StateDesc {
            blend: self.blend?,
            blend_mode: self.blend_mode?,
            depth_test: self.depth_test?,
            cull_face: self.cull_face?,
            front_face_clockwise: self.front_face_clockwise?,
        })
    }

    #[inline]
    pub fn vertex_array(&self) -> Option<RawVertexArray> {
        self.vertex_array
    }

    #[inline]
    pub fn program(&self) -> Option<RawProgram> {
        self.program
    }

    pub fn set_state<D: GraphicsDriver>(&mut self, driver: &mut D, desc: StateDesc) {
        self.set_blend(driver, desc.blend);
        self.set_blend_mode(driver, desc.blend_mode);
        self.set_depth_test(driver, desc.depth_test);
        self.set_cull_face(driver, desc.cull_face);
        self.set_front_face(driver, desc.front_face_clockwise);
    }

    pub fn set_blend<D: GraphicsDriver>(&mut self, driver: &mut D, enabled: bool) {
        if self.blend != Some(enabled) {
            driver.set_capability(Capability::Blend, enabled);
            self.blend = Some(enabled);
        }
    }

    pub fn set_blend_mode<D: GraphicsDriver>(&mut self, driver: &mut D, mode: BlendMode) {
        if self.blend_mode != Some(mode) {
            let (src, dst) = mode.factors();
            driver.blend_func(src, dst);
            self.blend_mode = Some(mode);
        }
    }

    pub fn set_depth_test<D: GraphicsDriver>(&mut self, driver: &mut D, enabled: bool) {
        if self.depth_test != Some(enabled) {
            driver.set_capability(Capability::DepthTest, enabled);
            self.depth_test = Some(enabled);
        }
    }

    pub fn set_cull_face<D: GraphicsDriver>(&mut self, driver: &mut D, enabled: bool) {
        if self.cull_face != Some(enabled) {
            driver.set_capability(Capability::CullFace, enabled);
            self.cull_face = Some(enabled);
        }
    }

    pub fn set_front_face<D: GraphicsDriver>(&mut self, driver: &mut D, clockwise: bool) {
        if self.front_face_clockwise != Some(clockwise) {
            driver.front_face(clockwise);
            self.front_face_clockwise = Some(clockwise);
        }
    }

    /// Binds `vao` unless it already is. Returns true if the driver was called.
    pub fn bind_vertex_array<D: GraphicsDriver>(
        &mut self,
        driver: &mut D,
        vao: Option<RawVertexArray>,
    ) -> bool {
        if self.vertex_array == vao {
            return false;
        }
        driver.bind_vertex_array(vao);
        self.vertex_array = vao;
        true
    }

    /// Uses `program` unless it already is. Returns true if the driver was called.
    pub fn use_program<D: GraphicsDriver>(
        &mut self,
        driver: &mut D,
        program: Option<RawProgram>,
    ) -> bool {
        if self.program == program {
            return false;
        }
        driver.use_program(program);
        self.program = program;
        true
    }

    /// Saves the current descriptor (defaults for unknown fields).
    pub fn push(&mut self) {
        let saved = self.current().unwrap_or_default();
        self.stack.push(saved);
    }

    /// Restores the last pushed descriptor. No-op on an empty stack.
    pub fn pop<D: GraphicsDriver>(&mut self, driver: &mut D) {
        if let Some(desc) = self.stack.pop() {
            self.set_state(driver, desc);
        }
    }

    /// Unbinds the vertex array and program and forces every field to its
    /// default. Descriptors saved with [`push`](Self::push) are discarded.
    pub fn reset_to_default<D: GraphicsDriver>(&mut self, driver: &mut D) {
        driver.bind_vertex_array(None);
        driver.use_program(None);
        *self = Self::default();
        self.set_state(driver, StateDesc::default());
    }
}
