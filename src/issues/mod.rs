//! Issue service.
//!
//! # Data Flow
//! ```text
//! /api/issues/{project}
//!     → handlers.rs (one handler per method)
//!     → form.rs / filter.rs (allow-listed request fields → typed values)
//!     → model.rs (Issue, NewIssue, IssueChanges)
//!     → store::IssueStore
//! ```

pub mod filter;
pub mod form;
pub mod handlers;
pub mod model;

pub use filter::{FilterError, IssueFilter};
pub use form::{InvalidValue, IssueForm, ValidationError};
pub use model::{Issue, IssueChanges, IssueId, NewIssue};
