//! Marduk render core.
//!
//! GPU resource and render-state coordination for a 2D retained-mode scene:
//! texture unit binding, texture upload and garbage collection, render
//! targets, object renderer dispatch, state deduplication, and recovery from
//! context loss.
//!
//! All GPU access goes through a [`device::GraphicsDriver`]; [`renderer::Renderer`]
//! is the entry point.

pub mod context;
pub mod coords;
pub mod device;
pub mod error;
pub mod logging;
pub mod object_renderer;
pub mod paint;
pub mod renderer;
pub mod shader;
pub mod state;
pub mod target;
pub mod texture;

pub use error::{RendererError, Result};
pub use renderer::{DisplayObject, FrameOptions, Renderer, RendererEvent, RendererOptions};
