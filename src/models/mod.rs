pub mod media_item;
pub mod target;
pub mod visible_item;

pub use media_item::*;
pub use target::*;
pub use visible_item::*;
