//! Administrative console for a research-collaboration platform.
//!
//! The crate owns the list controller shared by every admin table (filter,
//! sort, paginate, guarded row actions), the bulk user import wizard with its
//! cancellable status poller, and the adapters that reach the platform.

pub mod application;
pub mod config;
pub mod console;
pub mod domain;
pub mod infra;
pub mod presentation;
