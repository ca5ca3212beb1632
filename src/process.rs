//! Region-level aggregation and the three-way merge.
//!
//! Reads the three raw files, lifts every label onto the canonical
//! [`Ccaa`] taxonomy, and inner-joins on it. Regions that fail to
//! reconcile are reported and dropped, never invented.

use crate::extract::elections::SeatRow;
use crate::output;
use crate::regions::{self, Ccaa};
use crate::tabular::{self, Table};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    #[serde(rename = "PP")]
    Pp,
    #[serde(rename = "PSOE")]
    Psoe,
    #[serde(rename = "Empate")]
    Tie,
}

impl Winner {
    pub fn label(&self) -> &'static str {
        match self {
            Winner::Pp => "PP",
            Winner::Psoe => "PSOE",
            Winner::Tie => "Empate",
        }
    }
}

/// Seat totals for one region after summing its provinces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionSeats {
    pub seats_pp: u32,
    pub seats_psoe: u32,
}

impl RegionSeats {
    /// Strictly more seats wins; equality is a tie, never rounded away.
    pub fn winner(&self) -> Winner {
        if self.seats_pp > self.seats_psoe {
            Winner::Pp
        } else if self.seats_psoe > self.seats_pp {
            Winner::Psoe
        } else {
            Winner::Tie
        }
    }
}

/// One row of the merged output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub ccaa: String,
    pub seats_pp: u32,
    pub seats_psoe: u32,
    pub winner: Winner,
    pub gdp_per_capita: f64,
    pub pct_higher_education: f64,
}

/// What happened during the merge, logged as JSON at the end of the run.
#[derive(Debug, Serialize)]
pub struct MergeSummary {
    pub regions_merged: usize,
    pub regions_lost: Vec<String>,
    pub provinces_ignored: Vec<String>,
}

/// Runs the full processing stage against the raw files in `dir` and
/// writes the merged CSV there.
pub fn run(dir: &Path) -> Result<MergeSummary> {
    let seat_rows: Vec<SeatRow> = output::read_records(&dir.join(output::RAW_ELECTIONS_FILE))
        .context("could not read the raw election file; run the extract stage first")?;
    let (elections, ignored) = aggregate_elections(&seat_rows);
    if !ignored.is_empty() {
        warn!(provinces = ?ignored, "provinces without a region mapping were dropped");
    }
    info!(regions = elections.len(), "election aggregation done");

    let gdp_table = tabular::read_delimited(&dir.join(output::RAW_GDP_FILE))?;
    let gdp = gdp_by_region(&gdp_table)?;
    info!(regions = gdp.len(), "GDP table processed");

    let education_table = tabular::read_delimited(&dir.join(output::RAW_EDUCATION_FILE))?;
    let education = education_by_region(&education_table);
    info!(regions = education.len(), "education table processed");

    let (records, lost) = merge(&elections, &gdp, &education);
    if !lost.is_empty() {
        warn!(regions = ?lost, "regions lost at the join; check their source labels");
    }
    if records.is_empty() {
        bail!("merge produced no regions; the raw files do not share any region labels");
    }

    output::write_records(&dir.join(output::MERGED_FILE), &records)?;

    // Eyeball sample; a bad join is obvious on the big three.
    for record in records.iter().filter(|r| {
        matches!(
            r.ccaa.as_str(),
            "Comunidad de Madrid" | "Cataluña" | "Andalucía"
        )
    }) {
        info!(
            ccaa = %record.ccaa,
            seats_pp = record.seats_pp,
            seats_psoe = record.seats_psoe,
            winner = record.winner.label(),
            "merged row"
        );
    }

    let summary = MergeSummary {
        regions_merged: records.len(),
        regions_lost: lost,
        provinces_ignored: ignored,
    };
    output::print_json(&summary)?;

    Ok(summary)
}

/// Sums province seat rows into per-region totals. Provinces missing from
/// the lookup are returned separately for reporting.
pub fn aggregate_elections(rows: &[SeatRow]) -> (BTreeMap<Ccaa, RegionSeats>, Vec<String>) {
    let mut by_region: BTreeMap<Ccaa, RegionSeats> = BTreeMap::new();
    let mut ignored: Vec<String> = Vec::new();

    for row in rows {
        let province = row.province.trim();
        match Ccaa::from_province(province) {
            Some(ccaa) => {
                let seats = by_region.entry(ccaa).or_default();
                seats.seats_pp += row.seats_pp;
                seats.seats_psoe += row.seats_psoe;
            }
            None => {
                if !ignored.iter().any(|p| p == province) {
                    ignored.push(province.to_string());
                }
            }
        }
    }

    (by_region, ignored)
}

/// Average percentage of the target education level per repaired region
/// label, restricted to the 25-64 bracket and the most recent period.
pub fn education_by_region(table: &Table) -> BTreeMap<String, f64> {
    let headers = &table.headers;
    let region_col = tabular::find_column(headers, &["comunidad", "autónoma"]).unwrap_or(1);
    let level_col = tabular::find_column(headers, &["nivel"]).unwrap_or(0);
    let value_col = tabular::find_column(headers, &["total", "valor"])
        .unwrap_or(headers.len().saturating_sub(1));
    let age_col = tabular::find_column(headers, &["edad"]);
    let period_col = headers.iter().position(|h| h == "Periodo");

    // Level and age filters first; the latest period is whatever the
    // surviving rows still carry.
    let candidates: Vec<&Vec<String>> = table
        .rows
        .iter()
        .filter(|row| {
            let Some(level) = row.get(level_col) else {
                return false;
            };
            let level_lower = level.to_lowercase();
            if !level_lower.contains("superior") && !level_lower.contains("5-8") {
                return false;
            }
            match age_col {
                Some(col) => row.get(col).is_some_and(|age| age.contains("25 a 64")),
                None => true,
            }
        })
        .collect();

    let latest = period_col.and_then(|col| {
        candidates
            .iter()
            .filter_map(|row| row.get(col))
            .max()
            .cloned()
    });

    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for row in candidates {
        if let (Some(col), Some(latest)) = (period_col, latest.as_ref()) {
            if row.get(col) != Some(latest) {
                continue;
            }
        }
        let Some(raw_region) = row.get(region_col) else {
            continue;
        };
        let Some(value) = row.get(value_col).and_then(|v| tabular::parse_locale_number(v)) else {
            continue;
        };
        let entry = sums
            .entry(regions::repair_region_label(raw_region))
            .or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(region, (sum, n))| (region, sum / n as f64))
        .collect()
}

/// GDP value per repaired region label. The region sits in the first
/// column; the value column is `Valor` when the header says so, otherwise
/// the first column that is neither the region nor a `Nota` footnote.
pub fn gdp_by_region(table: &Table) -> Result<BTreeMap<String, f64>> {
    let headers = &table.headers;
    let region_col = 0;
    let value_col = match headers.iter().position(|h| h == "Valor") {
        Some(col) => col,
        None => headers
            .iter()
            .enumerate()
            .position(|(i, h)| i != region_col && h != "Nota")
            .context("GDP table has no value column besides the region and note columns")?,
    };

    let mut by_region: BTreeMap<String, f64> = BTreeMap::new();
    for row in &table.rows {
        let Some(raw_region) = row.get(region_col) else {
            continue;
        };
        if raw_region.is_empty() {
            continue;
        }
        let Some(value) = row.get(value_col).and_then(|v| tabular::parse_locale_number(v)) else {
            continue;
        };
        by_region.insert(regions::repair_region_label(raw_region), value);
    }

    Ok(by_region)
}

/// Inner join of the three sources on the canonical region name. A region
/// survives only when all three sources have it; the rest are returned for
/// reporting, not failure.
pub fn merge(
    elections: &BTreeMap<Ccaa, RegionSeats>,
    gdp: &BTreeMap<String, f64>,
    education: &BTreeMap<String, f64>,
) -> (Vec<MergedRecord>, Vec<String>) {
    let mut records = Vec::new();
    let mut lost = Vec::new();

    for (ccaa, seats) in elections {
        let name = ccaa.name();
        match (gdp.get(name), education.get(name)) {
            (Some(&gdp_value), Some(&education_value)) => records.push(MergedRecord {
                ccaa: name.to_string(),
                seats_pp: seats.seats_pp,
                seats_psoe: seats.seats_psoe,
                winner: seats.winner(),
                gdp_per_capita: gdp_value,
                pct_higher_education: education_value,
            }),
            _ => lost.push(name.to_string()),
        }
    }

    (records, lost)
}
