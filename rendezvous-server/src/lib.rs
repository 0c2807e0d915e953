mod app;
mod config;
mod control;
mod error;
mod metrics;
mod registry;
mod signaling;

pub use app::*;
pub use config::*;
pub use control::*;
pub use error::*;
pub use metrics::*;
pub use registry::*;
pub use signaling::*;
