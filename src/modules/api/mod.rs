pub mod auth;
pub mod error;
pub mod gateway;
pub mod interviews;
pub mod journal;
pub mod request;
pub mod todos;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{classify, ApiError};
pub use gateway::Gateway;
pub use request::{ApiRequest, ApiResponse, AuthMode};
pub use transport::{HttpTransport, Transport};
