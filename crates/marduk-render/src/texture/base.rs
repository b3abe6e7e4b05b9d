use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::ContextId;
use crate::coords::Rect;
use crate::device::RawTexture;

static NEXT_TEXTURE_UID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`BaseTexture`]; stable for its whole life.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureUid(u64);

/// CPU-side pixels of a logical texture (RGBA8, row-major, no padding).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSource {
    width: u32,
    height: u32,
    pixels: Option<Vec<u8>>,
}

impl TextureSource {
    /// Wraps raw RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "pixel buffer does not match {width}x{height} RGBA8"
        );
        Self {
            width,
            height,
            pixels: Some(pixels),
        }
    }

    /// Copies packed RGBA pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: &[[u8; 4]]) -> Self {
        Self::from_rgba8(width, height, bytemuck::cast_slice(pixels).to_vec())
    }

    /// Storage without initial contents (render textures).
    pub fn uninitialized(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: None,
        }
    }

    /// A single transparent pixel.
    pub fn transparent_pixel() -> Self {
        Self::from_rgba8(1, 1, vec![0; 4])
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }
}

/// GPU-side representation of a logical texture in one context generation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GlTexture {
    pub texture: RawTexture,
    /// Value of the owner's dirty id at the last upload.
    pub dirty_id: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
struct BaseTextureState {
    source: TextureSource,
    dirty_id: u32,
    touched: u64,
    gl_textures: HashMap<ContextId, GlTexture>,
}

/// Engine-level texture resource, compared by identity.
///
/// Pixel data stays on the CPU side; GPU copies are created lazily per
/// context generation and may be evicted and recreated at any time.
#[derive(Debug)]
pub struct BaseTexture {
    uid: TextureUid,
    render_target: bool,
    state: RefCell<BaseTextureState>,
}

impl BaseTexture {
    pub fn new(source: TextureSource) -> Rc<Self> {
        Rc::new(Self::with_kind(source, false))
    }

    pub(crate) fn new_render_target(width: u32, height: u32) -> Rc<Self> {
        Rc::new(Self::with_kind(TextureSource::uninitialized(width, height), true))
    }

    fn with_kind(source: TextureSource, render_target: bool) -> Self {
        Self {
            uid: TextureUid(NEXT_TEXTURE_UID.fetch_add(1, Ordering::Relaxed)),
            render_target,
            state: RefCell::new(BaseTextureState {
                source,
                dirty_id: 0,
                touched: 0,
                gl_textures: HashMap::new(),
            }),
        }
    }

    #[inline]
    pub fn uid(&self) -> TextureUid {
        self.uid
    }

    pub fn width(&self) -> u32 {
        self.state.borrow().source.width
    }

    pub fn height(&self) -> u32 {
        self.state.borrow().source.height
    }

    /// A texture with no area cannot be uploaded.
    pub fn is_valid(&self) -> bool {
        let state = self.state.borrow();
        state.source.width > 0 && state.source.height > 0
    }

    /// Backs an off-screen render target; such textures are never collected.
    #[inline]
    pub fn is_render_target(&self) -> bool {
        self.render_target
    }

    /// Marks the pixels as changed; the next bind re-uploads them.
    pub fn update(&self) {
        let mut state = self.state.borrow_mut();
        state.dirty_id = state.dirty_id.wrapping_add(1);
    }

    /// Replaces the pixels and marks the texture dirty.
    pub fn set_source(&self, source: TextureSource) {
        self.state.borrow_mut().source = source;
        self.update();
    }

    pub fn source(&self) -> TextureSource {
        self.state.borrow().source.clone()
    }

    #[inline]
    pub fn dirty_id(&self) -> u32 {
        self.state.borrow().dirty_id
    }

    /// GC frame count at the most recent bind.
    #[inline]
    pub fn touched(&self) -> u64 {
        self.state.borrow().touched
    }

    pub(crate) fn touch(&self, frame: u64) {
        self.state.borrow_mut().touched = frame;
    }

    /// Returns true if a GPU copy exists for `context`.
    pub fn has_gl_texture(&self, context: ContextId) -> bool {
        self.state.borrow().gl_textures.contains_key(&context)
    }

    pub(crate) fn gl_texture(&self, context: ContextId) -> Option<GlTexture> {
        self.state.borrow().gl_textures.get(&context).copied()
    }

    pub(crate) fn set_gl_texture(&self, context: ContextId, gl: GlTexture) {
        self.state.borrow_mut().gl_textures.insert(context, gl);
    }

    pub(crate) fn take_gl_texture(&self, context: ContextId) -> Option<GlTexture> {
        self.state.borrow_mut().gl_textures.remove(&context)
    }

    pub(crate) fn with_source<R>(&self, f: impl FnOnce(&TextureSource, u32) -> R) -> R {
        let state = self.state.borrow();
        f(&state.source, state.dirty_id)
    }

    pub(crate) fn resize_source(&self, width: u32, height: u32) {
        self.set_source(TextureSource::uninitialized(width, height));
    }
}

/// Anything that resolves to a [`BaseTexture`].
pub trait TextureLike {
    fn base_texture(&self) -> &Rc<BaseTexture>;
}

impl TextureLike for Rc<BaseTexture> {
    fn base_texture(&self) -> &Rc<BaseTexture> {
        self
    }
}

/// A view onto a region of a base texture.
#[derive(Debug, Clone)]
pub struct Texture {
    base: Rc<BaseTexture>,
    frame: Rect,
}

impl Texture {
    /// View covering the whole base texture.
    pub fn new(base: Rc<BaseTexture>) -> Self {
        let frame = Rect::from_size(base.width() as f32, base.height() as f32);
        Self { base, frame }
    }

    pub fn with_frame(base: Rc<BaseTexture>, frame: Rect) -> Self {
        Self { base, frame }
    }

    #[inline]
    pub fn frame(&self) -> Rect {
        self.frame
    }
}

impl TextureLike for Texture {
    fn base_texture(&self) -> &Rc<BaseTexture> {
        &self.base
    }
}

/// Off-screen render destination backed by a logical texture.
#[derive(Debug, Clone)]
pub struct RenderTexture {
    base: Rc<BaseTexture>,
    frame: Rect,
}

impl RenderTexture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            base: BaseTexture::new_render_target(width, height),
            frame: Rect::from_size(width as f32, height as f32),
        }
    }

    /// Changes the storage size; the GPU copy follows on the next bind.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.base.resize_source(width, height);
        self.frame = Rect::from_size(width as f32, height as f32);
    }

    #[inline]
    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn width(&self) -> u32 {
        self.base.width()
    }

    pub fn height(&self) -> u32 {
        self.base.height()
    }
}

impl TextureLike for RenderTexture {
    fn base_texture(&self) -> &Rc<BaseTexture> {
        &self.base
    }
}
