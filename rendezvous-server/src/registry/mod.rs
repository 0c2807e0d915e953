mod hub;
mod hub_command;
mod hub_handle;
mod room_registry;

pub use hub::*;
pub use hub_command::*;
pub use hub_handle::*;
pub use room_registry::*;
