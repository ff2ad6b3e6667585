//! Incremental content loading for the folder view.
//!
//! - `ContentLoader` - navigation-driven loads, visible rows, flags
//! - `EnumerationSession` - cancelable batch draining of one source
//! - `LoadingTimer` - debounced loading indicator

pub mod controller;
pub mod session;
pub mod timer;

pub use controller::{ContentEvent, ContentLoader, ContentLoaderBuilder};
pub use session::{Batch, EnumerationSession, GenerationGate, Liveness, SessionState};
pub use timer::LoadingTimer;
