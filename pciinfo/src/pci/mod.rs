mod flags;
mod listing;
mod resolve;
mod resource;

pub use flags::{ResourceFlags, ResourceKind};
pub use listing::{parse_listing, parse_size_line};
pub use resource::PciResource;

pub(crate) use resolve::find;
pub(crate) use resource::{bar_exists, bar_physical_address, bar_size, resources};
