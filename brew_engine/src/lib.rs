#![forbid(unsafe_code)]

//! Brewhouse planning kernel.
//!
//! Pure functions over the three brewery stores (sales ledger, tank
//! store, bottled inventory). No file I/O and no clock reads: callers
//! load the stores and inject "now".

/// Store format version. Bumped when a persisted layout changes.
pub const FORMAT_VERSION: u32 = 1;

pub mod arithmetic;
pub mod error;
pub mod serde_fields;
pub mod domain;
pub mod calendar;
pub mod state;
pub mod ledger;
pub mod forecast;
pub mod invariants;
pub mod transitions;
pub mod inventory;
pub mod levels;
pub mod recommend;
pub mod engine;
