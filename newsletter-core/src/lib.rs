//! Core logic for the newsletter automation.
//!
//! This crate holds everything that does not talk to the network directly:
//! - `extract` turns spreadsheet rows into upcoming `EventRecord`s
//! - `markup` renders event blocks and splices them into a previous campaign's HTML
//! - `pipeline` drives a full run against the `service` collaborator traits

pub mod artifacts;
pub mod config;
pub mod error;
pub mod event;
pub mod extract;
pub mod markers;
pub mod markup;
pub mod pipeline;
pub mod schedule;
pub mod sections;
pub mod service;
pub mod table;
pub mod verify;

pub use error::{NewsletterError, NewsletterResult};
pub use event::EventRecord;
