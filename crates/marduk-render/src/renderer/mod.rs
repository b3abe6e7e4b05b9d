//! The renderer: owns the driver and every GPU-side manager, and runs frames.
//!
//! Operations are split by concern:
//! - `textures`: slot binding, disposal, garbage collection
//! - `dispatch`: object renderer switching
//! - `targets`: render target activation, transforms, resizing
//! - `gpu_state`: blend state, vertex arrays, shaders
//! - `frame`: the per-frame entry point

mod dispatch;
mod events;
mod frame;
mod gpu_state;
mod options;
mod resources;
mod targets;
mod textures;

use crate::context::{ContextAttributes, ContextId, ContextLifecycle, ContextLostEvent};
use crate::device::{DriverCapabilities, GraphicsDriver, WgpuDriver, WgpuInit};
use crate::error::{RendererError, Result};
use crate::object_renderer::{ObjectRenderer, ObjectRendererId, ObjectRenderers};
use crate::shader::ProgramProvider;
use crate::target::TargetKey;

pub use events::{ListenerId, RendererEvent};
pub use frame::{DisplayObject, FrameOptions};
pub use gpu_state::VertexArrayObject;
pub use options::RendererOptions;

use events::Listeners;
use resources::GpuResources;

/// GPU resource and render-state coordinator for one graphics context.
pub struct Renderer<D: GraphicsDriver> {
    driver: D,
    options: RendererOptions,
    context: ContextLifecycle,

    /// Logical screen size.
    screen: (f32, f32),

    res: GpuResources,
    object_renderers: ObjectRenderers<D>,
    program_provider: Option<Box<dyn ProgramProvider>>,
    listeners: Listeners,

    rendering_to_screen: bool,
}

impl Renderer<WgpuDriver> {
    /// Acquires a wgpu device and builds a renderer on it.
    pub fn create(options: RendererOptions) -> Result<Self> {
        options.validate()?;
        let init = WgpuInit {
            drawing_buffer_size: options.physical_size(),
            ..WgpuInit::default()
        };
        let driver = pollster::block_on(WgpuDriver::new(init))?;
        Self::new(driver, options)
    }
}

impl<D: GraphicsDriver> Renderer<D> {
    pub fn new(driver: D, options: RendererOptions) -> Result<Self> {
        Self::with_object_renderers(driver, options, Vec::new())
    }

    /// Builds a renderer with object renderers installed before the first
    /// context notification.
    pub fn with_object_renderers(
        mut driver: D,
        options: RendererOptions,
        object_renderers: Vec<(String, Box<dyn ObjectRenderer<D>>)>,
    ) -> Result<Self> {
        validate_capabilities(driver.capabilities())?;
        options.validate()?;

        let context = ContextLifecycle::new(options.context_attributes());
        let screen = (options.width, options.height);
        let res = GpuResources::init(&mut driver, context.current(), &options, screen, options.gc);

        let mut registry = ObjectRenderers::new();
        for (name, renderer) in object_renderers {
            registry.register(name, renderer);
        }

        let mut renderer = Self {
            driver,
            options,
            context,
            screen,
            res,
            object_renderers: registry,
            program_provider: None,
            listeners: Listeners::default(),
            rendering_to_screen: true,
        };
        renderer.announce_context();
        log::info!(
            "renderer ready: {:?}, {} texture unit(s)",
            renderer.context_id(),
            renderer.res.slots.len()
        );
        Ok(renderer)
    }

    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Direct driver access. Call [`flush`](Self::flush) before and
    /// [`reset`](Self::reset) after issuing unmanaged GPU work.
    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    #[inline]
    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    #[inline]
    pub fn context_id(&self) -> ContextId {
        self.context.current()
    }

    #[inline]
    pub fn context_attributes(&self) -> ContextAttributes {
        self.context.attributes()
    }

    #[inline]
    pub fn is_context_lost(&self) -> bool {
        !self.context.is_usable()
    }

    #[inline]
    pub fn screen_size(&self) -> (f32, f32) {
        self.screen
    }

    /// Whether the last [`render`](Self::render) drew to the screen.
    #[inline]
    pub fn is_rendering_to_screen(&self) -> bool {
        self.rendering_to_screen
    }

    pub fn set_program_provider(&mut self, provider: Box<dyn ProgramProvider>) {
        self.program_provider = Some(provider);
    }

    /// Subscribes to renderer events.
    pub fn on(&mut self, listener: impl FnMut(&RendererEvent) + 'static) -> ListenerId {
        self.listeners.add(Box::new(listener))
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Host notification that the context was lost.
    ///
    /// Takes over restoration timing from the host and turns every GPU
    /// operation into a no-op until [`handle_context_restored`](Self::handle_context_restored).
    pub fn handle_context_lost(&mut self, event: &mut ContextLostEvent) {
        event.prevent_default();
        self.context.mark_lost();
    }

    /// Host notification that the context is back.
    ///
    /// Every handle from the previous generation is dropped unseen, then the
    /// full initialization runs against a new context id. If the driver is
    /// still lost afterwards the renderer stays lost and issues no calls.
    pub fn handle_context_restored(&mut self) {
        self.res.forget();
        self.object_renderers.set_current(ObjectRendererId::EMPTY);

        if self.driver.is_context_lost() && !self.driver.restore_context() {
            log::warn!("graphics context could not be restored");
            self.context.mark_lost();
            return;
        }

        let context = self.context.begin_generation();
        let gc = self.res.gc.settings();
        self.res = GpuResources::init(&mut self.driver, context, &self.options, self.screen, gc);
        self.announce_context();
    }

    /// Re-synchronizes tracked state with the driver after unmanaged GPU use.
    pub fn reset(&mut self) {
        if !self.gpu_available() {
            return;
        }
        self.flush();

        let context = self.context.current();
        self.res.slots.invalidate_active_unit();
        for unit in 0..self.res.slots.len() {
            self.res.slots.bind_placeholder(&mut self.driver, context, unit);
        }
        self.res.targets.activate(&mut self.driver, TargetKey::Screen);
        self.res.state.reset_to_default(&mut self.driver);
    }

    /// Tears the renderer down and hands back the driver.
    ///
    /// With `remove_surface`, the presentation surface is detached too.
    pub fn destroy(mut self, remove_surface: bool) -> D {
        let usable = self.gpu_available();
        if usable {
            self.flush();
        }

        for id in self.object_renderers.ids() {
            self.with_object_renderer(id, |r, this| r.destroy(this));
        }

        if usable {
            self.res.destroy(&mut self.driver);
            if let Some(provider) = self.program_provider.as_deref_mut() {
                self.res.shaders.destroy_all(provider);
            }
            self.driver.use_program(None);
            self.driver.flush();
        } else {
            self.res.forget();
        }

        self.listeners.clear();
        if remove_surface {
            self.driver.remove_surface();
        }
        if self.driver.capabilities().lose_context_extension {
            self.driver.lose_context();
        }
        log::debug!("renderer {:?} destroyed", self.context.current());
        self.driver
    }

    /// Checks for a loss the host has not reported yet.
    pub(crate) fn gpu_available(&mut self) -> bool {
        if self.context.is_usable() && self.driver.is_context_lost() {
            self.context.mark_lost();
        }
        self.context.is_usable()
    }

    pub(crate) fn emit(&mut self, event: RendererEvent) {
        self.listeners.emit(event);
    }

    /// Tells listeners and object renderers about the current context, then
    /// sizes the screen.
    fn announce_context(&mut self) {
        if self.driver.is_context_lost() {
            self.context.mark_lost();
            return;
        }

        let context = self.context.current();
        self.emit(RendererEvent::Context(context));
        for id in self.object_renderers.ids() {
            self.with_object_renderer(id, |r, this| r.context_changed(this, context));
        }

        let (width, height) = self.screen;
        self.resize(width, height);
    }
}

fn validate_capabilities(caps: DriverCapabilities) -> Result<()> {
    if caps.max_texture_units == 0 {
        return Err(RendererError::Config(
            "graphics context reports no texture units".into(),
        ));
    }
    if !caps.vertex_array_objects {
        return Err(RendererError::Config(
            "graphics context lacks vertex array objects".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::device::{DriverCall, RecordingDriver};

    pub(crate) fn renderer(units: usize) -> Renderer<RecordingDriver> {
        let mut r = Renderer::new(RecordingDriver::new(units), RendererOptions::default())
            .expect("renderer");
        r.driver_mut().clear_calls();
        r
    }

    #[test]
    fn zero_texture_units_is_a_configuration_error() {
        let driver = RecordingDriver::with_capabilities(DriverCapabilities {
            max_texture_units: 0,
            vertex_array_objects: true,
            lose_context_extension: true,
        });
        let err = Renderer::new(driver, RendererOptions::default()).err();
        assert!(matches!(err, Some(RendererError::Config(_))));
    }

    #[test]
    fn missing_vertex_arrays_is_a_configuration_error() {
        let driver = RecordingDriver::with_capabilities(DriverCapabilities {
            max_texture_units: 4,
            vertex_array_objects: false,
            lose_context_extension: true,
        });
        assert!(Renderer::new(driver, RendererOptions::default()).is_err());
    }

    #[test]
    fn construction_binds_a_placeholder_to_every_unit() {
        let r = Renderer::new(RecordingDriver::new(4), RendererOptions::default()).unwrap();
        let slots = r.texture_slots();
        assert!((0..4).all(|u| slots.is_vacant(u)));
        assert!((0..4).all(|u| slots.get(u).has_gl_texture(r.context_id())));
        assert!(r
            .driver()
            .calls()
            .contains(&DriverCall::ResizeDrawingBuffer { width: 800, height: 600 }));
    }

    #[test]
    fn loss_event_is_taken_over() {
        let mut r = renderer(2);
        let mut event = ContextLostEvent::new();
        r.handle_context_lost(&mut event);
        assert!(event.default_prevented());
        assert!(r.is_context_lost());
    }

    #[test]
    fn restore_issues_a_new_context_and_notifies() {
        let mut r = renderer(2);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        r.on(move |e| log.borrow_mut().push(*e));

        let old = r.context_id();
        r.driver_mut().simulate_context_loss();
        r.handle_context_lost(&mut ContextLostEvent::new());
        r.handle_context_restored();

        assert_ne!(r.context_id(), old);
        assert!(!r.is_context_lost());
        assert_eq!(*seen.borrow(), vec![RendererEvent::Context(r.context_id())]);
    }

    #[test]
    fn failed_restore_stays_lost_without_driver_work() {
        let driver = RecordingDriver::with_capabilities(DriverCapabilities {
            max_texture_units: 2,
            vertex_array_objects: true,
            lose_context_extension: false,
        });
        let mut r = Renderer::new(driver, RendererOptions::default()).unwrap();
        let old = r.context_id();
        r.driver_mut().simulate_context_loss();
        r.handle_context_lost(&mut ContextLostEvent::new());
        r.driver_mut().clear_calls();

        r.handle_context_restored();
        assert_eq!(r.driver().calls(), &[DriverCall::RestoreContext]);
        assert!(r.is_context_lost());
        assert_eq!(r.context_id(), old);
    }

    struct ContextLog(Rc<RefCell<Vec<ContextId>>>);

    impl ObjectRenderer<RecordingDriver> for ContextLog {
        fn context_changed(&mut self, _: &mut Renderer<RecordingDriver>, context: ContextId) {
            self.0.borrow_mut().push(context);
        }
    }

    #[test]
    fn object_renderers_follow_the_context_across_restore() {
        let mut r = renderer(2);
        let seen = Rc::new(RefCell::new(Vec::new()));
        r.register_object_renderer("mesh", Box::new(ContextLog(seen.clone())));
        let old = r.context_id();

        r.driver_mut().simulate_context_loss();
        r.handle_context_lost(&mut ContextLostEvent::new());
        r.handle_context_restored();

        assert_eq!(*seen.borrow(), vec![old, r.context_id()]);
    }

    #[test]
    fn reset_rebinds_placeholders_and_root() {
        let mut r = renderer(2);
        r.reset();
        let calls = r.driver().calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, DriverCall::BindTexture(_))).count(), 2);
        assert!(calls.contains(&DriverCall::BindFramebuffer(None)));
        assert!(calls.contains(&DriverCall::BindVertexArray(None)));
    }

    #[test]
    fn destroy_releases_everything() {
        let r = renderer(2);
        let driver = r.destroy(true);
        assert_eq!(driver.count_calls(|c| matches!(c, DriverCall::DeleteTexture(_))), 1);
        assert!(driver.calls().contains(&DriverCall::RemoveSurface));
        assert!(driver.calls().contains(&DriverCall::LoseContext));
        assert_eq!(driver.invalid_handle_uses(), 0);
    }
}
