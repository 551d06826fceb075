//! HTTP request handlers for the Room Service.

pub mod metrics;
pub mod socket;
pub mod token;

pub use metrics::metrics_handler;
pub use socket::ws_handler;
pub use token::get_token;
