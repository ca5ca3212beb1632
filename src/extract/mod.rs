//! The three extraction routines. Each fetches one public source and
//! persists a raw intermediate file; reconciliation and joining happen in
//! [`crate::process`], so a stage can be re-run without touching the
//! others.

pub mod education;
pub mod elections;
pub mod gdp;

use scraper::ElementRef;

/// Concatenated text of an element's text nodes, outer whitespace trimmed.
pub(crate) fn cell_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
