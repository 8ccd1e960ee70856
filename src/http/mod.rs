//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware stack)
//!     → request.rs (request ID, span, body extraction)
//!     → issues::handlers / health
//!     → response.rs (success envelope, error mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{IssueBody, UuidRequestId, X_REQUEST_ID};
pub use response::{ApiError, Outcome};
pub use server::{AppState, HttpServer};
