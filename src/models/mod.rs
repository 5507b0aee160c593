//! Data models for the inspection backend.
//!
//! JSON field names are camelCase to match the web client.

mod account;
mod family;
mod form;
mod record;
mod service;

pub use account::*;
pub use family::*;
pub use form::*;
pub use record::*;
pub use service::*;
