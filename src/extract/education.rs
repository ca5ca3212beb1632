//! Education-level CSV download.
//!
//! The agency export changes delimiter and encoding between revisions, so
//! the body is written byte-for-byte and resolved later by
//! [`crate::tabular::read_delimited`].

use crate::fetch::{self, HttpClient};
use crate::output;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

pub const EDUCATION_URL: &str = "https://www.ine.es/jaxiT3/files/t/es/csv_bd/69774.csv?nocab=1";

pub async fn extract<C: HttpClient>(client: &C, dir: &Path) -> Result<u64> {
    info!(url = EDUCATION_URL, "downloading education CSV");

    let bytes = fetch::fetch_bytes(client, EDUCATION_URL).await?;
    let path = dir.join(output::RAW_EDUCATION_FILE);
    fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    info!(bytes = bytes.len(), path = %path.display(), "education download done");

    Ok(bytes.len() as u64)
}
