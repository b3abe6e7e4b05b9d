use thiserror::Error;

/// Failures surfaced while constructing a renderer.
///
/// Context loss is not an error: it is tracked as state and turns GPU work
/// into no-ops until the context is restored.
#[derive(Debug, Error)]
pub enum RendererError {
    /// The graphics context or the options cannot support the renderer.
    #[error("invalid renderer configuration: {0}")]
    Config(String),

    /// The GPU device could not be acquired.
    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RendererError>;
