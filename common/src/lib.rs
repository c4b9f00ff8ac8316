//! Quotation Service Common Types
//!
//! This crate contains shared types used across the quotation service,
//! including identifiers, the closed currency set, and the quotation request
//! entity with its lifecycle.

pub mod identifiers;
pub mod currency;
pub mod request;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use currency::*;
pub use request::*;
pub use error::*;
pub use time::*;
