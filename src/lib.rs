//! towbill: invoices and job records for a heavy-duty towing company.
//!
//! The invoice calculator lives in [`calc`], the data model in [`model`] and document rendering
//! in [`render`]. [`http`] serves the REST API and [`commands`] implements the CLI.

pub mod args;
mod auth;
pub mod calc;
pub mod commands;
mod config;
mod db;
mod error;
pub mod http;
pub mod model;
pub mod render;
mod utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::{Error, ErrorType, IntoResult, Result};
