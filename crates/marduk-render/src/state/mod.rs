//! Render state deduplication.
//!
//! [`RenderState`] is the single owner of blend/depth/cull state, the bound
//! vertex array and the active program. Callers request states; only
//! differences reach the driver.

mod blend;
mod manager;

pub use blend::BlendMode;
pub use manager::{RenderState, StateDesc};
