use std::collections::HashSet;

use crate::paint::Color;

use super::driver::{
    BlendFactor, Capability, DriverCapabilities, GraphicsDriver, RawFramebuffer, RawProgram,
    RawTexture, RawVertexArray, TextureUpload,
};

/// One call received by a [`RecordingDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    CreateTexture(RawTexture),
    UploadTexture { texture: RawTexture, width: u32, height: u32, has_pixels: bool },
    DeleteTexture(RawTexture),
    ActiveTexture(usize),
    BindTexture(RawTexture),
    CreateFramebuffer { framebuffer: RawFramebuffer, color: RawTexture },
    DeleteFramebuffer(RawFramebuffer),
    BindFramebuffer(Option<RawFramebuffer>),
    Viewport { x: i32, y: i32, width: u32, height: u32 },
    Clear(Color),
    CreateVertexArray(RawVertexArray),
    BindVertexArray(Option<RawVertexArray>),
    DeleteVertexArray(RawVertexArray),
    UseProgram(Option<RawProgram>),
    SetCapability(Capability, bool),
    BlendFunc(BlendFactor, BlendFactor),
    FrontFace(bool),
    ResizeDrawingBuffer { width: u32, height: u32 },
    Flush,
    LoseContext,
    RestoreContext,
    RemoveSurface,
}

/// Headless driver that records every call instead of talking to a GPU.
///
/// Object names are never reused, so a handle from a destroyed context
/// generation can be told apart from a live one. Uses of such handles are
/// counted in [`invalid_handle_uses`](Self::invalid_handle_uses).
#[derive(Debug)]
pub struct RecordingDriver {
    caps: DriverCapabilities,
    lost: bool,
    next_name: u32,

    live_textures: HashSet<RawTexture>,
    live_framebuffers: HashSet<RawFramebuffer>,
    live_vertex_arrays: HashSet<RawVertexArray>,

    invalid_handle_uses: usize,
    calls: Vec<DriverCall>,
}

impl RecordingDriver {
    /// Creates a driver reporting `max_texture_units` units and all extensions.
    pub fn new(max_texture_units: usize) -> Self {
        Self::with_capabilities(DriverCapabilities {
            max_texture_units,
            vertex_array_objects: true,
            lose_context_extension: true,
        })
    }

    pub fn with_capabilities(caps: DriverCapabilities) -> Self {
        Self {
            caps,
            lost: false,
            next_name: 1,
            live_textures: HashSet::new(),
            live_framebuffers: HashSet::new(),
            live_vertex_arrays: HashSet::new(),
            invalid_handle_uses: 0,
            calls: Vec::new(),
        }
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    /// Drains the call log.
    pub fn take_calls(&mut self) -> Vec<DriverCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Counts logged calls matching `pred`.
    pub fn count_calls(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Number of `bind_texture` calls in the log.
    pub fn texture_binds(&self) -> usize {
        self.count_calls(|c| matches!(c, DriverCall::BindTexture(_)))
    }

    pub fn live_texture_count(&self) -> usize {
        self.live_textures.len()
    }

    pub fn is_live_texture(&self, texture: RawTexture) -> bool {
        self.live_textures.contains(&texture)
    }

    /// Number of calls that referenced an object the current context does not own.
    pub fn invalid_handle_uses(&self) -> usize {
        self.invalid_handle_uses
    }

    /// Simulates the host dropping the context. Every object dies with it.
    pub fn simulate_context_loss(&mut self) {
        self.lost = true;
        self.live_textures.clear();
        self.live_framebuffers.clear();
        self.live_vertex_arrays.clear();
    }

    fn next_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    fn check_texture(&mut self, texture: RawTexture) {
        if !self.lost && !self.live_textures.contains(&texture) {
            self.invalid_handle_uses += 1;
        }
    }
}

impl GraphicsDriver for RecordingDriver {
    fn capabilities(&self) -> DriverCapabilities {
        self.caps
    }

    fn is_context_lost(&self) -> bool {
        self.lost
    }

    fn restore_context(&mut self) -> bool {
        self.calls.push(DriverCall::RestoreContext);
        if !self.caps.lose_context_extension {
            return false;
        }
        self.lost = false;
        true
    }

    fn lose_context(&mut self) -> bool {
        self.calls.push(DriverCall::LoseContext);
        if !self.caps.lose_context_extension {
            return false;
        }
        self.simulate_context_loss();
        true
    }

    fn create_texture(&mut self) -> RawTexture {
        let texture = RawTexture(self.next_name());
        if !self.lost {
            self.live_textures.insert(texture);
        }
        self.calls.push(DriverCall::CreateTexture(texture));
        texture
    }

    fn upload_texture(&mut self, texture: RawTexture, upload: &TextureUpload<'_>) {
        self.check_texture(texture);
        self.calls.push(DriverCall::UploadTexture {
            texture,
            width: upload.width,
            height: upload.height,
            has_pixels: upload.pixels.is_some(),
        });
    }

    fn delete_texture(&mut self, texture: RawTexture) {
        self.check_texture(texture);
        self.live_textures.remove(&texture);
        self.calls.push(DriverCall::DeleteTexture(texture));
    }

    fn active_texture(&mut self, unit: usize) {
        debug_assert!(unit < self.caps.max_texture_units, "texture unit {unit} out of range");
        self.calls.push(DriverCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: RawTexture) {
        self.check_texture(texture);
        self.calls.push(DriverCall::BindTexture(texture));
    }

    fn create_framebuffer(&mut self, color: RawTexture) -> RawFramebuffer {
        self.check_texture(color);
        let framebuffer = RawFramebuffer(self.next_name());
        if !self.lost {
            self.live_framebuffers.insert(framebuffer);
        }
        self.calls.push(DriverCall::CreateFramebuffer { framebuffer, color });
        framebuffer
    }

    fn delete_framebuffer(&mut self, framebuffer: RawFramebuffer) {
        if !self.lost && !self.live_framebuffers.remove(&framebuffer) {
            self.invalid_handle_uses += 1;
        }
        self.calls.push(DriverCall::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<RawFramebuffer>) {
        if let Some(fb) = framebuffer {
            if !self.lost && !self.live_framebuffers.contains(&fb) {
                self.invalid_handle_uses += 1;
            }
        }
        self.calls.push(DriverCall::BindFramebuffer(framebuffer));
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.calls.push(DriverCall::Viewport { x, y, width, height });
    }

    fn clear(&mut self, color: Color) {
        self.calls.push(DriverCall::Clear(color));
    }

    fn create_vertex_array(&mut self) -> RawVertexArray {
        let vao = RawVertexArray(self.next_name());
        if !self.lost {
            self.live_vertex_arrays.insert(vao);
        }
        self.calls.push(DriverCall::CreateVertexArray(vao));
        vao
    }

    fn bind_vertex_array(&mut self, vao: Option<RawVertexArray>) {
        if let Some(v) = vao {
            if !self.lost && !self.live_vertex_arrays.contains(&v) {
                self.invalid_handle_uses += 1;
            }
        }
        self.calls.push(DriverCall::BindVertexArray(vao));
    }

    fn delete_vertex_array(&mut self, vao: RawVertexArray) {
        if !self.lost && !self.live_vertex_arrays.remove(&vao) {
            self.invalid_handle_uses += 1;
        }
        self.calls.push(DriverCall::DeleteVertexArray(vao));
    }

    fn use_program(&mut self, program: Option<RawProgram>) {
        self.calls.push(DriverCall::UseProgram(program));
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        self.calls.push(DriverCall::SetCapability(capability, enabled));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.calls.push(DriverCall::BlendFunc(src, dst));
    }

    fn front_face(&mut self, clockwise: bool) {
        self.calls.push(DriverCall::FrontFace(clockwise));
    }

    fn resize_drawing_buffer(&mut self, width: u32, height: u32) {
        self.calls.push(DriverCall::ResizeDrawingBuffer { width, height });
    }

    fn flush(&mut self) {
        self.calls.push(DriverCall::Flush);
    }

    fn remove_surface(&mut self) {
        self.calls.push(DriverCall::RemoveSurface);
    }
}
