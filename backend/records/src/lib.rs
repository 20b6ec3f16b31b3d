//! # Records
//!
//! Shared shapes of the clinic backend.
//!
//! - [`models`]: documents as they live in the store, one JSON document per id
//! - [`payloads`]: request bodies accepted by the HTTP API
//!
//! Dates are kept the way the clinic writes them: `DD/MM/YYYY` for days and
//! `HH:MM` for times, both in clinic local time. Creation stamps are UTC.

pub mod models;
pub mod payloads;

pub use models::*;
pub use payloads::*;
