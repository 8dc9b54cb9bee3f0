//! Parser for the NASA NeoWs `feed` endpoint.
//!
//! The feed is keyed by date rather than being a flat list, so it is read as
//! a loose `serde_json::Value` and flattened by hand into [`Asteroid`]
//! records.
//!
//! [`Asteroid`]: crate::model::Asteroid

mod parser;

pub use parser::{parse_feed, parse_value};
