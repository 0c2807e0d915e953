mod config;
mod error;
mod media;
mod negotiation;
mod signal_sink;
mod transport;

pub use config::*;
pub use error::*;
pub use media::*;
pub use negotiation::*;
pub use signal_sink::*;
pub use transport::*;
