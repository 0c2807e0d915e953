pub mod relay_server;

pub use mock_signaling::*;
pub use relay_server::*;
pub use signal_helpers::*;
