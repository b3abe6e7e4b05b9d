use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::paint::Color;

use super::driver::{
    BlendFactor, Capability, DriverCapabilities, GraphicsDriver, RawFramebuffer, RawProgram,
    RawTexture, RawVertexArray, TextureUpload,
};

/// Initialization parameters for [`WgpuDriver`].
#[derive(Debug, Clone)]
pub struct WgpuInit {
    /// Adapter preference.
    pub power_preference: wgpu::PowerPreference,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Initial size of the screen framebuffer, in physical pixels.
    pub drawing_buffer_size: (u32, u32),
}

impl Default for WgpuInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_limits: wgpu::Limits::default(),
            drawing_buffer_size: (800, 600),
        }
    }
}

/// Fixed-function state last requested through the driver.
///
/// Batch renderers read this to pick a matching render pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PipelineState {
    pub blend: bool,
    pub blend_func: (BlendFactor, BlendFactor),
    pub depth_test: bool,
    pub cull_face: bool,
    pub front_face_clockwise: bool,
    pub program: Option<RawProgram>,
    pub vertex_array: Option<RawVertexArray>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            blend: false,
            blend_func: (BlendFactor::One, BlendFactor::Zero),
            depth_test: false,
            cull_face: false,
            front_face_clockwise: false,
            program: None,
            vertex_array: None,
        }
    }
}

/// [`GraphicsDriver`] backed by a wgpu device.
///
/// wgpu has no global binding state, so unit bindings, the bound framebuffer
/// and fixed-function toggles are tracked here and exposed to batch renderers
/// that build bind groups and pipelines from them. Clears are encoded as
/// render passes and submitted on [`flush`](GraphicsDriver::flush).
pub struct WgpuDriver {
    init: WgpuInit,

    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Set from the device-lost callback.
    lost: Arc<AtomicBool>,

    next_name: u32,
    textures: HashMap<RawTexture, wgpu::Texture>,
    framebuffers: HashMap<RawFramebuffer, RawTexture>,
    vertex_arrays: HashSet<RawVertexArray>,

    /// Screen framebuffer. `None` once the surface has been removed.
    backbuffer: Option<wgpu::Texture>,
    bound_framebuffer: Option<RawFramebuffer>,
    viewport: (i32, i32, u32, u32),

    active_unit: usize,
    units: Vec<Option<RawTexture>>,
    pipeline: PipelineState,

    pending: Vec<wgpu::CommandBuffer>,
}

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

impl WgpuDriver {
    /// Acquires an adapter and device.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: WgpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let (adapter, device, queue) = acquire_device(&instance, &init).await?;
        let lost = watch_device_loss(&device);
        let max_units = device.limits().max_sampled_textures_per_shader_stage as usize;

        let (w, h) = init.drawing_buffer_size;
        let backbuffer = make_texture(&device, w, h, "marduk backbuffer");

        Ok(Self {
            init,
            instance,
            adapter,
            device,
            queue,
            lost,
            next_name: 1,
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            vertex_arrays: HashSet::new(),
            backbuffer: Some(backbuffer),
            bound_framebuffer: None,
            viewport: (0, 0, w, h),
            active_unit: 0,
            units: vec![None; max_units],
            pipeline: PipelineState::default(),
            pending: Vec::new(),
        })
    }

    /// Returns the adapter the device was requested from.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Texture currently bound on `unit`.
    pub fn bound_texture(&self, unit: usize) -> Option<&wgpu::Texture> {
        let raw = self.units.get(unit).copied().flatten()?;
        self.textures.get(&raw)
    }

    /// Color texture of the bound framebuffer (the backbuffer for the screen).
    pub fn render_attachment(&self) -> Option<&wgpu::Texture> {
        match self.bound_framebuffer {
            Some(fb) => self
                .framebuffers
                .get(&fb)
                .and_then(|color| self.textures.get(color)),
            None => self.backbuffer.as_ref(),
        }
    }

    /// Viewport rectangle `(x, y, width, height)` in physical pixels.
    pub fn viewport_rect(&self) -> (i32, i32, u32, u32) {
        self.viewport
    }

    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline
    }

    /// Queues an externally recorded command buffer for the next flush.
    pub fn push_commands(&mut self, commands: wgpu::CommandBuffer) {
        self.pending.push(commands);
    }

    fn next_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name = self.next_name.wrapping_add(1);
        name
    }

    fn forget_objects(&mut self) {
        self.textures.clear();
        self.framebuffers.clear();
        self.vertex_arrays.clear();
        self.units.iter_mut().for_each(|u| *u = None);
        self.bound_framebuffer = None;
        self.pipeline = PipelineState::default();
        self.pending.clear();
    }

    fn lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }
}

async fn acquire_device(
    instance: &wgpu::Instance,
    init: &WgpuInit,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("marduk-render device"),
            required_features: wgpu::Features::empty(),
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;

    Ok((adapter, device, queue))
}

fn watch_device_loss(device: &wgpu::Device) -> Arc<AtomicBool> {
    let lost = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&lost);
    device.set_device_lost_callback(move |reason, message| {
        log::warn!("wgpu device lost ({reason:?}): {message}");
        flag.store(true, Ordering::Release);
    });
    lost
}

/// Scales the color channels of straight-alpha RGBA8 pixels by their alpha.
fn premultiply(pixels: &[u8]) -> Vec<u8> {
    let mut out = pixels.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
    out
}

fn make_texture(device: &wgpu::Device, width: u32, height: u32, label: &str) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

impl GraphicsDriver for WgpuDriver {
    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities {
            max_texture_units: self.units.len(),
            vertex_array_objects: true,
            lose_context_extension: true,
        }
    }

    fn is_context_lost(&self) -> bool {
        self.lost()
    }

    fn restore_context(&mut self) -> bool {
        match pollster::block_on(acquire_device(&self.instance, &self.init)) {
            Ok((adapter, device, queue)) => {
                self.lost = watch_device_loss(&device);
                self.adapter = adapter;
                self.device = device;
                self.queue = queue;
                self.forget_objects();

                let (w, h) = self.init.drawing_buffer_size;
                if self.backbuffer.is_some() {
                    self.backbuffer = Some(make_texture(&self.device, w, h, "marduk backbuffer"));
                }
                log::debug!("wgpu device restored");
                true
            }
            Err(e) => {
                log::warn!("wgpu device restore failed: {e:#}");
                false
            }
        }
    }

    fn lose_context(&mut self) -> bool {
        self.device.destroy();
        self.lost.store(true, Ordering::Release);
        true
    }

    fn create_texture(&mut self) -> RawTexture {
        let raw = RawTexture(self.next_name());
        if !self.lost() {
            let texture = make_texture(&self.device, 1, 1, "marduk texture");
            self.textures.insert(raw, texture);
        }
        raw
    }

    fn upload_texture(&mut self, texture: RawTexture, upload: &TextureUpload<'_>) {
        if self.lost() {
            return;
        }
        let Some(existing) = self.textures.get(&texture) else {
            log::warn!("upload to unknown texture {texture:?}");
            return;
        };

        let width = upload.width.max(1);
        let height = upload.height.max(1);
        let size = existing.size();
        if size.width != width || size.height != height {
            let resized = make_texture(&self.device, width, height, "marduk texture");
            self.textures.insert(texture, resized);
        }

        let Some(pixels) = upload.pixels else { return };
        let pixels = if upload.premultiplied_alpha {
            Cow::Owned(premultiply(pixels))
        } else {
            Cow::Borrowed(pixels)
        };
        let Some(target) = self.textures.get(&texture) else { return };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn delete_texture(&mut self, texture: RawTexture) {
        if let Some(t) = self.textures.remove(&texture) {
            t.destroy();
        }
        for unit in self.units.iter_mut() {
            if *unit == Some(texture) {
                *unit = None;
            }
        }
    }

    fn active_texture(&mut self, unit: usize) {
        self.active_unit = unit;
    }

    fn bind_texture(&mut self, texture: RawTexture) {
        if let Some(slot) = self.units.get_mut(self.active_unit) {
            *slot = Some(texture);
        }
    }

    fn create_framebuffer(&mut self, color: RawTexture) -> RawFramebuffer {
        let fb = RawFramebuffer(self.next_name());
        self.framebuffers.insert(fb, color);
        fb
    }

    fn delete_framebuffer(&mut self, framebuffer: RawFramebuffer) {
        self.framebuffers.remove(&framebuffer);
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<RawFramebuffer>) {
        self.bound_framebuffer = framebuffer;
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
    }

    fn clear(&mut self, color: Color) {
        if self.lost() {
            return;
        }
        let Some(target) = self.render_attachment() else { return };
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("marduk clear encoder"),
            });

        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("marduk clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.pending.push(encoder.finish());
    }

    fn create_vertex_array(&mut self) -> RawVertexArray {
        let vao = RawVertexArray(self.next_name());
        self.vertex_arrays.insert(vao);
        vao
    }

    fn bind_vertex_array(&mut self, vao: Option<RawVertexArray>) {
        self.pipeline.vertex_array = vao.filter(|v| self.vertex_arrays.contains(v));
    }

    fn delete_vertex_array(&mut self, vao: RawVertexArray) {
        self.vertex_arrays.remove(&vao);
        if self.pipeline.vertex_array == Some(vao) {
            self.pipeline.vertex_array = None;
        }
    }

    fn use_program(&mut self, program: Option<RawProgram>) {
        self.pipeline.program = program;
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        match capability {
            Capability::Blend => self.pipeline.blend = enabled,
            Capability::DepthTest => self.pipeline.depth_test = enabled,
            Capability::CullFace => self.pipeline.cull_face = enabled,
        }
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.pipeline.blend_func = (src, dst);
    }

    fn front_face(&mut self, clockwise: bool) {
        self.pipeline.front_face_clockwise = clockwise;
    }

    fn resize_drawing_buffer(&mut self, width: u32, height: u32) {
        self.init.drawing_buffer_size = (width, height);
        if self.lost() || self.backbuffer.is_none() {
            return;
        }
        // wgpu rejects zero-sized textures; keep the old buffer until a real size arrives.
        if width == 0 || height == 0 {
            return;
        }
        if let Some(old) = self.backbuffer.replace(make_texture(
            &self.device,
            width,
            height,
            "marduk backbuffer",
        )) {
            old.destroy();
        }
    }

    fn flush(&mut self) {
        if self.lost() {
            self.pending.clear();
            return;
        }
        if !self.pending.is_empty() {
            self.queue.submit(self.pending.drain(..));
        }
    }

    fn remove_surface(&mut self) {
        if let Some(backbuffer) = self.backbuffer.take() {
            backbuffer.destroy();
        }
    }
}
