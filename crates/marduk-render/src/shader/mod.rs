//! Program caching. Compilation is delegated to a [`ProgramProvider`].

mod manager;

pub use manager::{ProgramProvider, Shader, ShaderManager};
