use crate::coords::Matrix;
use crate::device::GraphicsDriver;
use crate::object_renderer::ObjectRendererId;
use crate::texture::RenderTexture;

use super::Renderer;
use super::events::RendererEvent;

/// The root of a scene as seen by the renderer.
pub trait DisplayObject<D: GraphicsDriver> {
    /// Refreshes world transforms before drawing.
    fn update_transform(&mut self) {}

    /// Issues the object's draws, typically through object renderers.
    fn render(&mut self, renderer: &mut Renderer<D>);
}

/// Per-frame options for [`Renderer::render`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameOptions<'a> {
    /// Render texture to draw into; the screen when `None`.
    pub target: Option<&'a RenderTexture>,

    /// Overrides `RendererOptions::clear_before_render` for this frame.
    pub clear: Option<bool>,

    /// View transform of the target for this frame.
    pub transform: Option<Matrix>,

    pub skip_update_transform: bool,
}

impl<'a> FrameOptions<'a> {
    pub fn to_texture(target: &'a RenderTexture) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }
}

impl<D: GraphicsDriver> Renderer<D> {
    /// Renders `object` into the screen or a render texture.
    ///
    /// Does nothing, and emits nothing, while the context is lost. A loss
    /// noticed during the draw skips the rest of the frame.
    pub fn render<O>(&mut self, object: &mut O, frame: FrameOptions<'_>)
    where
        O: DisplayObject<D> + ?Sized,
    {
        if !self.gpu_available() {
            log::trace!("context lost; frame skipped");
            return;
        }

        self.rendering_to_screen = frame.target.is_none();
        self.emit(RendererEvent::PreRender);
        self.res.slots.reset_round_robin();

        if !frame.skip_update_transform {
            object.update_transform();
        }

        self.bind_render_texture(frame.target, frame.transform);
        self.set_object_renderer(ObjectRendererId::EMPTY);

        if frame.clear.unwrap_or(self.options.clear_before_render) {
            self.clear(None);
        }

        object.render(self);
        self.flush();

        if !self.gpu_available() {
            log::debug!("context lost mid-frame");
            return;
        }

        if self.res.gc.tick() {
            let res = &mut self.res;
            res.gc.run(&mut self.driver, &mut res.textures, &mut res.slots);
        }
        self.driver.flush();
        self.emit(RendererEvent::PostRender);
    }
}
