//! Console presentation.

pub mod views;
