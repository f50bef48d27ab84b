pub mod clock;
pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::parse_config;
pub use error::{Error, Result};
pub use registry::parse_route_registry;
pub use types::*;
