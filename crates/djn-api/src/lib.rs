// djn-api: Async Rust client for the Cluster Gateway and the dashboard backend

pub mod backend;
pub mod error;
pub mod gateway;
pub mod models;
pub mod transport;

pub use backend::BackendClient;
pub use error::Error;
pub use gateway::GatewayClient;
pub use transport::TransportConfig;
