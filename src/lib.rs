//! Slogan voting backend.
//!
//! Voters pick up to a configured number of slogans from a catalog loaded
//! from a spreadsheet, save drafts, and submit one final ballot each; the
//! admin surface tallies finalized ballots and exports rankings.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod session;
pub mod tally;

pub use errors::{Error, Result, ValidationError};
