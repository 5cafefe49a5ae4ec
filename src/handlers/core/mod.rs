//! Core handler infrastructure.
//!
//! - [`context`]: the per-message [`Context`] and the [`Handler`] trait
//! - [`registry`]: message-type dispatch

pub mod context;
pub mod registry;

pub use context::{Context, Handler};
pub use registry::Registry;
