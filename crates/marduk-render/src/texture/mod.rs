//! Logical textures and their GPU residency.
//!
//! - [`BaseTexture`]: engine-level resource, identity-keyed
//! - [`TextureSlots`]: which texture occupies each hardware unit
//! - [`TextureManager`]: upload / re-upload / delete per context generation
//! - [`TextureGc`]: evicts GPU copies of textures that went unused

mod base;
mod gc;
mod manager;
mod slots;

pub use base::{
    BaseTexture, GlTexture, RenderTexture, Texture, TextureLike, TextureSource, TextureUid,
};
pub use gc::{GcMode, GcSettings, TextureGc};
pub use manager::TextureManager;
pub use slots::TextureSlots;
