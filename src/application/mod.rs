//! Application layer: list controllers, the action machine and the import wizard.

pub mod actions;
pub mod api;
pub mod bulk_import;
pub mod controller;
pub mod error;
pub mod filter;
pub mod listing;
pub mod pagination;
pub mod polling;
pub mod resources;
pub mod toasts;
