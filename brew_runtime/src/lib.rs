#![forbid(unsafe_code)]

//! Brewhouse runtime.
//!
//! Wraps the planning kernel with JSON stores on disk, baseline reset,
//! CSV sales import and configuration.
//!
//! No planning logic lives here: forecasts, transitions, levels and
//! recommendations are all delegated to the kernel.

pub mod error;
pub mod config;
pub mod store;
pub mod baseline;
pub mod sales_csv;
pub mod brewhouse;
