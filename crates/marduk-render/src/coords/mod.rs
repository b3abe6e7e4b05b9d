//! Geometry types for render-target frames and projections.
//!
//! Canonical CPU space:
//! - Origin top-left
//! - +X right, +Y down
//!
//! Render targets map their frame to clip space with a projection matrix.

mod matrix;
mod rect;

pub use matrix::Matrix;
pub use rect::Rect;
