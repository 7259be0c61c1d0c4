//! Turns an address checklist into a clustered completion map.
//!
//! Rows are validated ([`data`]), merged per rounded coordinate
//! ([`grouping`]), summarised ([`aggregate`]) and turned into one marker per
//! location ([`marker`]). The viewer clusters those markers on its own; the
//! rule it must follow lives in [`cluster`] and shares [`bucket`] with the
//! markers.

pub mod aggregate;
pub mod bucket;
pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod grouping;
pub mod html;
pub mod marker;
pub mod processing;
pub mod publish;
pub mod render;
pub mod server;
pub mod types;
