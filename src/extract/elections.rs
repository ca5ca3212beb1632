//! Seat-table extractor for the national election results page.
//!
//! The page renders one seat table whose party columns are not at stable
//! positions: label-only header cells pad the front and the party headers
//! are sometimes just logos. Party identification therefore goes through
//! header text plus logo alt text, while the data columns themselves are
//! read at fixed offsets.

use crate::fetch::{self, HttpClient};
use crate::output;
use crate::tabular;
use anyhow::{Result, bail};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

pub const ELECTIONS_URL: &str =
    "https://elpais.com/espana/elecciones/generales/escanos-por-provincia/";

/// The election source serves an error page to default library agents.
pub const BROWSER_UA: &str = "Mozilla/5.0";

// Data rows are assumed to be [province, PP, PSOE, ...] no matter how many
// label-only cells pad the header row. The page has never shipped another
// party ahead of these two; if it ever does, these offsets are the place
// to make column detection drive the data indices too.
const PP_DATA_COLUMN: usize = 1;
const PSOE_DATA_COLUMN: usize = 2;

/// One province's seat counts as scraped, before region aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatRow {
    pub province: String,
    pub seats_pp: u32,
    pub seats_psoe: u32,
}

/// Fetches the results page and writes the raw per-province seat file.
pub async fn extract<C: HttpClient>(client: &C, dir: &Path) -> Result<usize> {
    info!(url = ELECTIONS_URL, "extracting election seats");

    let bytes = fetch::fetch_bytes(client, ELECTIONS_URL).await?;
    let html = tabular::decode_text(&bytes);
    let rows = parse_seat_table(&html)?;

    let path = dir.join(output::RAW_ELECTIONS_FILE);
    output::write_records(&path, &rows)?;
    info!(provinces = rows.len(), path = %path.display(), "election extraction done");

    Ok(rows.len())
}

/// Parses the first table of the results page into per-province seat rows.
///
/// Returns an error when the table or either party header is missing;
/// individual rows that fail to parse are skipped instead.
pub fn parse_seat_table(html: &str) -> Result<Vec<SeatRow>> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table").expect("invalid table selector");
    let th_sel = Selector::parse("th").expect("invalid th selector");
    let img_sel = Selector::parse("img").expect("invalid img selector");
    let tr_sel = Selector::parse("tr").expect("invalid tr selector");
    let cell_sel = Selector::parse("td, th").expect("invalid cell selector");
    let span_sel = Selector::parse("span").expect("invalid span selector");

    let Some(table) = document.select(&table_sel).next() else {
        bail!("no table found in the election results page");
    };

    // Header cells: text plus any embedded logo's alt, uppercased. Body
    // province cells are also th elements, which is fine; only the first
    // occurrence of each party matters.
    let mut headers = Vec::new();
    for th in table.select(&th_sel) {
        let mut text = super::cell_text(&th).to_uppercase();
        if let Some(img) = th.select(&img_sel).next() {
            if let Some(alt) = img.value().attr("alt") {
                text = format!("{text} {}", alt.to_uppercase());
            }
        }
        headers.push(text);
    }

    let pp_header = headers
        .iter()
        .position(|h| h.contains("PP") || h.contains("POPULAR"));
    let psoe_header = headers
        .iter()
        .position(|h| h.contains("PSOE") || h.contains("SOCIALISTA"));
    let (Some(pp_header), Some(psoe_header)) = (pp_header, psoe_header) else {
        bail!("party header cells not found (looked for PP/POPULAR and PSOE/SOCIALISTA)");
    };

    let first_party = if pp_header < psoe_header { "PP" } else { "PSOE" };
    info!(first_party, "detected party header order");

    let mut rows = Vec::new();
    for tr in table.select(&tr_sel) {
        let cells: Vec<ElementRef> = tr.select(&cell_sel).collect();
        // Short rows are header or decoration.
        if cells.len() < 3 {
            continue;
        }

        let province = clean_province_name(&super::cell_text(&cells[0]));
        if province.is_empty() {
            continue;
        }
        let upper = province.to_uppercase();
        if upper.contains("TOTAL") || upper.contains("PROVINCIA") || upper.contains("PARTIDOS") {
            continue;
        }

        let seats_pp = seat_count(&cells, PP_DATA_COLUMN, &span_sel);
        let seats_psoe = seat_count(&cells, PSOE_DATA_COLUMN, &span_sel);

        // A province where both main parties took nothing is an extraction
        // miss, not a result.
        if seats_pp == 0 && seats_psoe == 0 {
            debug!(province = %province, "dropping row with two zero counts");
            continue;
        }

        rows.push(SeatRow {
            province,
            seats_pp,
            seats_psoe,
        });
    }

    if rows.is_empty() {
        bail!("seat table parsed to zero usable rows; column indices may be off");
    }

    Ok(rows)
}

/// Seat count for one cell, ordered attempts: count the visual marker
/// spans if the cell has any, else parse the text as a number, else 0.
/// An out-of-range column also reads as 0.
fn seat_count(cells: &[ElementRef], idx: usize, span_sel: &Selector) -> u32 {
    let Some(cell) = cells.get(idx) else {
        return 0;
    };

    let markers = cell.select(span_sel).count();
    if markers > 0 {
        return markers as u32;
    }

    super::cell_text(cell).parse().unwrap_or(0)
}

/// `"Madrid(37)"` → `"Madrid"`; seat annotations and pipe-separated extras
/// are not part of the name.
fn clean_province_name(raw: &str) -> String {
    raw.split(['(', '|']).next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <html><body><table>
      <thead>
        <tr>
          <th>Provincia (Escaños)</th>
          <th>Partidos</th>
          <th><img src="pp.svg" alt="PP"></th>
          <th><img src="psoe.svg" alt="PSOE"></th>
        </tr>
      </thead>
      <tbody>
        <tr><th>Madrid(37)</th><td><span></span><span></span><span></span></td><td><span></span></td><td>2</td></tr>
        <tr><th>Sevilla(12)</th><td>4</td><td>6</td><td>1</td></tr>
        <tr><th>TOTAL</th><td>137</td><td>121</td><td>0</td></tr>
        <tr><th>Fantasma</th><td>0</td><td>0</td><td>0</td></tr>
        <tr><th>Corta</th><td>1</td></tr>
      </tbody>
    </table></body></html>
    "#;

    #[test]
    fn test_parse_seat_table_counts_spans_and_digits() {
        let rows = parse_seat_table(FIXTURE).unwrap();
        assert_eq!(rows.len(), 2);

        // Data column 1 under the province, markers counted.
        assert_eq!(rows[0].province, "Madrid");
        assert_eq!(rows[0].seats_pp, 3);
        assert_eq!(rows[0].seats_psoe, 1);

        // Digit text fallback.
        assert_eq!(rows[1].province, "Sevilla");
        assert_eq!(rows[1].seats_pp, 4);
        assert_eq!(rows[1].seats_psoe, 6);
    }

    #[test]
    fn test_parse_seat_table_skips_totals_and_dead_rows() {
        let rows = parse_seat_table(FIXTURE).unwrap();
        assert!(rows.iter().all(|r| r.province != "TOTAL"));
        assert!(rows.iter().all(|r| r.province != "Fantasma"));
        assert!(rows.iter().all(|r| r.province != "Corta"));
    }

    #[test]
    fn test_parse_seat_table_no_table() {
        let err = parse_seat_table("<html><body><p>mantenimiento</p></body></html>")
            .unwrap_err()
            .to_string();
        assert!(err.contains("no table"));
    }

    #[test]
    fn test_parse_seat_table_missing_party_headers() {
        let html = r#"
        <table>
          <tr><th>Provincia</th><th>Vox</th><th>Sumar</th></tr>
          <tr><td>Madrid</td><td>5</td><td>4</td></tr>
        </table>
        "#;
        let err = parse_seat_table(html).unwrap_err().to_string();
        assert!(err.contains("party header"));
    }

    #[test]
    fn test_parse_seat_table_text_headers_without_logos() {
        let html = r#"
        <table>
          <tr><th>Provincia</th><th>Partido Popular</th><th>Partido Socialista</th></tr>
          <tr><td>Cuenca</td><td>2</td><td>1</td></tr>
        </table>
        "#;
        let rows = parse_seat_table(html).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].seats_pp, 2);
        assert_eq!(rows[0].seats_psoe, 1);
    }

    #[test]
    fn test_clean_province_name() {
        assert_eq!(clean_province_name("Madrid(37)"), "Madrid");
        assert_eq!(clean_province_name("Las Palmas (8)"), "Las Palmas");
        assert_eq!(clean_province_name("Lugo|detalle"), "Lugo");
        assert_eq!(clean_province_name("  Soria  "), "Soria");
        assert_eq!(clean_province_name(""), "");
    }

    #[test]
    fn test_two_cell_rows_are_skipped() {
        let html = r#"
        <table>
          <tr><th>Provincia</th><th>PP</th><th>PSOE</th></tr>
          <tr><td>Teruel</td><td>3</td></tr>
          <tr><td>Huesca</td><td>1</td><td>2</td></tr>
        </table>
        "#;
        let rows = parse_seat_table(html).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].province, "Huesca");
    }
}
