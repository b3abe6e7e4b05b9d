use crate::device::BlendFactor;

/// Compositing operation for premultiplied colors.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Multiply,
    Screen,
    /// Source replaces destination.
    None,
}

impl BlendMode {
    /// `(src, dst)` factors, assuming premultiplied source colors.
    pub fn factors(self) -> (BlendFactor, BlendFactor) {
        match self {
            BlendMode::Normal => (BlendFactor::One, BlendFactor::OneMinusSrcAlpha),
            BlendMode::Add => (BlendFactor::One, BlendFactor::DstAlpha),
            BlendMode::Multiply => (BlendFactor::DstColor, BlendFactor::OneMinusSrcAlpha),
            BlendMode::Screen => (BlendFactor::One, BlendFactor::OneMinusSrcColor),
            BlendMode::None => (BlendFactor::One, BlendFactor::Zero),
        }
    }
}
