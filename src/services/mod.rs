pub mod catalog;
pub mod media;
pub mod rooms;
pub mod selector;

pub use catalog::{Catalog, TmdbCatalog};
pub use rooms::{RoomRegistry, RoomService};
pub use selector::{MovieSelector, SelectorSettings};
