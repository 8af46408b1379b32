mod client;

mod config;
pub use config::{DEFAULT_TIMEOUT, HttpConfig};

mod consul;
pub use consul::ConsulClient;

mod marathon;
pub use marathon::MarathonClient;
