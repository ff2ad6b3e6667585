pub mod config;
pub mod loader;
pub mod messaging;
pub mod models;
pub mod source;

pub use config::LoaderConfig;
pub use loader::{ContentEvent, ContentLoader};
pub use messaging::{BusMessage, MessageBus, Navigator};
pub use models::{Library, MediaHandle, MediaType, NavigationTarget, RawEntry, VisibleItem};
