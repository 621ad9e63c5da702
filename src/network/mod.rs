// Re-export network modules
pub mod api_client;
pub mod config;

// Re-export commonly used items
pub use api_client::{ApiClient, Backend, RequestBody, RequestOptions};
pub use config::ApiConfig;
