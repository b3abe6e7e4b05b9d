//! Color model used for clears and render-target backgrounds.

mod color;

pub use color::Color;
