//! Issue tracker service library.

pub mod config;
pub mod health;
pub mod http;
pub mod issues;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::TrackerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::{InMemoryIssueStore, IssueStore, MongoIssueStore};
