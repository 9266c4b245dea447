//! Campaign markup: event block rendering, region location and splicing.
//!
//! All functions here work on the raw HTML string. No parse tree is built;
//! regions are found relative to known anchors with depth-counted scans over
//! `<table` tokens, and edits are byte-range replacements.

pub mod blocks;
pub mod locate;
pub mod splice;

pub use blocks::{DIVIDER_HTML, escape_html, render_event_block, render_events};
pub use locate::RegionBounds;
pub use splice::{MissingAnchor, SpliceReport, splice_document};
