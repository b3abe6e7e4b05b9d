//! Graphics driver seam.
//!
//! The renderer core talks to the GPU only through [`GraphicsDriver`]:
//! - [`WgpuDriver`] runs on a wgpu device
//! - [`RecordingDriver`] records calls for headless use and tests

mod driver;
mod recording;
mod wgpu_driver;

pub use driver::{
    BlendFactor, Capability, DriverCapabilities, GraphicsDriver, RawFramebuffer, RawProgram,
    RawTexture, RawVertexArray, TextureUpload,
};
pub use recording::{DriverCall, RecordingDriver};
pub use wgpu_driver::{PipelineState, WgpuDriver, WgpuInit};
