pub mod apibase;
pub mod client;
pub mod credentials;
pub mod logging;
pub mod metrics;
pub mod render;
pub mod session;
pub mod state;
pub mod urls;
