use crate::context::ContextId;
use crate::device::{GraphicsDriver, RawTexture, RawVertexArray, TextureUpload};
use crate::shader::ShaderManager;
use crate::state::RenderState;
use crate::target::{RenderTarget, RenderTargets, TargetKey};
use crate::texture::{
    BaseTexture, GcSettings, GlTexture, TextureGc, TextureManager, TextureSlots, TextureSource,
};

use super::options::RendererOptions;

/// Every GPU-side manager of one context generation.
///
/// Built from scratch on construction and again after each restoration.
pub(crate) struct GpuResources {
    pub slots: TextureSlots,
    pub textures: TextureManager,
    pub gc: TextureGc,
    pub shaders: ShaderManager,
    pub state: RenderState,
    pub targets: RenderTargets,
    pub vertex_arrays: Vec<RawVertexArray>,
    pub placeholder: RawTexture,
}

impl GpuResources {
    pub fn init<D: GraphicsDriver>(
        driver: &mut D,
        context: ContextId,
        options: &RendererOptions,
        screen: (f32, f32),
        gc: GcSettings,
    ) -> Self {
        if driver.is_context_lost() && !driver.restore_context() {
            log::warn!("graphics context is still lost; GPU work is deferred");
        }

        let units = driver.capabilities().max_texture_units;
        log::debug!("initializing {context:?} with {units} texture unit(s)");

        let mut state = RenderState::new();
        state.reset_to_default(driver);

        // One 1x1 transparent GPU texture backs every unit's placeholder.
        let pixel = TextureSource::transparent_pixel();
        let placeholder = driver.create_texture();
        let gl = GlTexture {
            texture: placeholder,
            dirty_id: 0,
            width: 1,
            height: 1,
        };
        let placeholders = (0..units)
            .map(|_| {
                let texture = BaseTexture::new(pixel.clone());
                texture.set_gl_texture(context, gl);
                texture
            })
            .collect();

        let mut slots = TextureSlots::new(placeholders);
        slots.activate(driver, 0);
        driver.bind_texture(placeholder);
        driver.upload_texture(
            placeholder,
            &TextureUpload {
                width: 1,
                height: 1,
                pixels: pixel.pixels(),
                premultiplied_alpha: options.premultiplied_alpha,
            },
        );

        let mut targets = RenderTargets::new(RenderTarget::root(
            screen.0,
            screen.1,
            options.resolution,
            options.background(),
        ));
        targets.activate(driver, TargetKey::Screen);

        for unit in 0..units {
            slots.bind_placeholder(driver, context, unit);
        }

        Self {
            slots,
            textures: TextureManager::new(context, options.premultiplied_alpha),
            gc: TextureGc::new(gc),
            shaders: ShaderManager::new(context),
            state,
            targets,
            vertex_arrays: Vec::new(),
            placeholder,
        }
    }

    /// Drops every handle without calling the driver. The objects died with
    /// the context.
    pub fn forget(&mut self) {
        self.textures.forget_all();
        self.shaders.forget_all();
        self.vertex_arrays.clear();
    }

    /// Deletes every GPU object this generation owns. Programs are released
    /// by the caller.
    pub fn destroy<D: GraphicsDriver>(&mut self, driver: &mut D) {
        self.textures.destroy_all(driver, &mut self.slots);
        self.targets.destroy_all(driver);
        for vao in self.vertex_arrays.drain(..) {
            driver.delete_vertex_array(vao);
        }
        driver.delete_texture(self.placeholder);
    }
}
