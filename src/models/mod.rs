pub mod entry;
pub mod event;
pub mod price;

pub use entry::*;
pub use event::*;
pub use price::*;
