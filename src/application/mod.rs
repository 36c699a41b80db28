// Application layer - use cases and orchestration over the repository

pub mod error;
mod response;
mod service;
mod session;

pub use error::*;
pub use response::*;
pub use service::*;
pub use session::*;
