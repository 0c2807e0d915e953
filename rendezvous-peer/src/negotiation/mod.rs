mod negotiator;
mod negotiator_handle;
mod negotiator_input;
mod session;
mod state;

pub use negotiator::*;
pub use negotiator_handle::*;
pub use negotiator_input::*;
pub use session::*;
pub use state::*;
