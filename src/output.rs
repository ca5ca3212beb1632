//! Persistence for the pipeline's fixed flat files.
//!
//! Every stage writes to and reads from the working directory under these
//! names; re-running a single stage only needs the files before it.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;
use tracing::info;

pub const RAW_ELECTIONS_FILE: &str = "raw_elections.csv";
pub const RAW_GDP_FILE: &str = "raw_gdp.csv";
pub const RAW_EDUCATION_FILE: &str = "raw_education.csv";
pub const MERGED_FILE: &str = "merged_regions.csv";
pub const CHART_FILE: &str = "vote_vs_socioeconomics.png";

/// Writes serializable records as a headed CSV file, replacing any
/// previous run's output.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads every record of a headed CSV file written by [`write_records`].
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }

    Ok(records)
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
