pub mod http;
pub mod transport;

pub use http::{
    resolve_url, ConnectionSettings, HttpClient, DEFAULT_API_PORT, DEFAULT_API_VERSION,
};
pub use transport::{ApiResponse, Method, Transport};
