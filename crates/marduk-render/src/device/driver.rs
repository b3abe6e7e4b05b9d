use crate::paint::Color;

/// Texture object issued by a driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RawTexture(pub u32);

/// Framebuffer object issued by a driver. `None` at bind sites means the screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RawFramebuffer(pub u32);

/// Vertex array object issued by a driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RawVertexArray(pub u32);

/// Linked program handle issued by a program provider.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RawProgram(pub u32);

/// Hardware limits and optional extensions reported by a graphics context.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DriverCapabilities {
    /// Number of texture image units usable from a fragment stage.
    pub max_texture_units: usize,

    /// Whether vertex array objects are available.
    pub vertex_array_objects: bool,

    /// Whether the context can be lost and restored on request.
    pub lose_context_extension: bool,
}

/// Toggleable fixed-function state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    Blend,
    DepthTest,
    CullFace,
}

/// Blend equation factors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    SrcColor,
    OneMinusSrcColor,
    DstAlpha,
    DstColor,
}

/// Pixel upload for a 2D RGBA8 texture.
///
/// `pixels == None` allocates storage without initializing it (render textures).
#[derive(Debug, Copy, Clone)]
pub struct TextureUpload<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: Option<&'a [u8]>,
    pub premultiplied_alpha: bool,
}

/// Capability surface the renderer core drives.
///
/// Calls mirror a stateful immediate-mode API: texture binds apply to the
/// active unit, clears apply to the bound framebuffer. Implementations must
/// not change the framebuffer or texture binding as a side effect of object
/// creation.
///
/// While the context is lost every call must be accepted and ignored.
pub trait GraphicsDriver {
    fn capabilities(&self) -> DriverCapabilities;

    /// Returns true once the underlying context has been lost.
    fn is_context_lost(&self) -> bool;

    /// Asks the context to come back after a loss.
    ///
    /// Returns true if the context is usable again.
    fn restore_context(&mut self) -> bool {
        false
    }

    /// Forces a context loss. Returns false when unsupported.
    fn lose_context(&mut self) -> bool {
        false
    }

    fn create_texture(&mut self) -> RawTexture;
    fn upload_texture(&mut self, texture: RawTexture, upload: &TextureUpload<'_>);
    fn delete_texture(&mut self, texture: RawTexture);

    /// Selects the texture unit subsequent `bind_texture` calls apply to.
    fn active_texture(&mut self, unit: usize);
    fn bind_texture(&mut self, texture: RawTexture);

    /// Creates a framebuffer with `color` as its color attachment.
    fn create_framebuffer(&mut self, color: RawTexture) -> RawFramebuffer;
    fn delete_framebuffer(&mut self, framebuffer: RawFramebuffer);
    fn bind_framebuffer(&mut self, framebuffer: Option<RawFramebuffer>);

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn clear(&mut self, color: Color);

    fn create_vertex_array(&mut self) -> RawVertexArray;
    fn bind_vertex_array(&mut self, vao: Option<RawVertexArray>);
    fn delete_vertex_array(&mut self, vao: RawVertexArray);

    fn use_program(&mut self, program: Option<RawProgram>);

    fn set_capability(&mut self, capability: Capability, enabled: bool);
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn front_face(&mut self, clockwise: bool);

    /// Resizes the default (screen) framebuffer, in physical pixels.
    fn resize_drawing_buffer(&mut self, width: u32, height: u32);

    /// Submits all recorded commands.
    fn flush(&mut self);

    /// Detaches the presentation surface. No further frames reach the screen.
    fn remove_surface(&mut self) {}
}
