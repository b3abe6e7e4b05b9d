//! Context generations and loss tracking.
//!
//! A context generation spans from creation (or restoration) to the next
//! loss. Every GPU handle is only meaningful within the generation that
//! created it.

mod id;
mod lifecycle;

pub use id::{ContextId, ContextIds};
pub use lifecycle::{ContextAttributes, ContextLifecycle, ContextLostEvent, ContextStatus};
