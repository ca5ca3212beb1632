//! Delimited-file reading for tables whose delimiter and encoding drift
//! between downloads. Reading is an ordered list of attempts, not a format
//! negotiation; the first attempt that produces a real multi-column table
//! wins.

use anyhow::{Context, Result, anyhow};
use encoding_rs::WINDOWS_1252;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A fully string-typed table. Numeric interpretation happens at use sites
/// via [`parse_locale_number`].
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy)]
enum SourceEncoding {
    Utf8,
    Windows1252,
}

/// Attempt order mirrors what the agency actually ships: tab-separated
/// UTF-8 exports first, then the legacy semicolon/Windows-1252 form, then
/// plain comma CSVs.
static READ_ATTEMPTS: &[(u8, SourceEncoding)] = &[
    (b'\t', SourceEncoding::Utf8),
    (b';', SourceEncoding::Windows1252),
    (b',', SourceEncoding::Utf8),
    (b';', SourceEncoding::Utf8),
];

/// Reads a delimited file by trying each (delimiter, encoding) pair in
/// order until one yields at least two columns.
pub fn read_delimited(path: &Path) -> Result<Table> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    for &(delimiter, encoding) in READ_ATTEMPTS {
        let Some(text) = decode(&bytes, encoding) else {
            continue;
        };
        match parse_delimited(&text, delimiter) {
            Ok(table) if table.headers.len() >= 2 => {
                debug!(
                    path = %path.display(),
                    delimiter = %(delimiter as char),
                    ?encoding,
                    columns = table.headers.len(),
                    rows = table.rows.len(),
                    "delimited read succeeded"
                );
                return Ok(table);
            }
            Ok(_) => continue,
            Err(e) => {
                debug!(delimiter = %(delimiter as char), ?encoding, error = %e, "read attempt failed");
                continue;
            }
        }
    }

    Err(anyhow!(
        "no delimiter/encoding combination produced a multi-column table from {}",
        path.display()
    ))
}

fn decode(bytes: &[u8], encoding: SourceEncoding) -> Option<String> {
    match encoding {
        SourceEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
        SourceEncoding::Windows1252 => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            Some(text.into_owned())
        }
    }
}

/// Decodes page bytes as UTF-8, falling back to Windows-1252 for the older
/// agency pages that never moved off it.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

fn parse_delimited(text: &str, delimiter: u8) -> Result<Table> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .has_headers(false)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return Err(anyhow!("empty table"));
    }

    let headers = rows.remove(0);
    Ok(Table { headers, rows })
}

/// Writes a table as plain comma-separated UTF-8, the one format the
/// pipeline's own intermediate files use.
pub fn write_delimited(path: &Path, table: &Table) -> Result<()> {
    // Scraped tables occasionally have ragged rows; keep them as-is.
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// First header containing any of the candidates, case-insensitively.
/// Callers fall back to fixed positional indices when nothing matches.
pub fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let lower = h.to_lowercase();
        candidates.iter().any(|c| lower.contains(&c.to_lowercase()))
    })
}

/// Converts the agency's locale numerics: `.` is a thousands separator and
/// `,` the decimal point, so `"12.345,67"` is 12345.67. Returns `None` for
/// anything that still fails to parse after the swap.
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace('.', "").replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn write_temp(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = env::temp_dir().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_read_tab_separated_utf8() {
        let path = write_temp(
            "ccaa_scraper_test_tab.csv",
            "Comunidad\tValor\nAndalucía\t21.091\n".as_bytes(),
        );
        let table = read_delimited(&path).unwrap();
        assert_eq!(table.headers, vec!["Comunidad", "Valor"]);
        assert_eq!(table.cell(0, 0), Some("Andalucía"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_semicolon_windows1252() {
        // "Andalucía;21,5" with the í as a single 0xED byte.
        let mut bytes = b"Comunidad;Valor\nAndaluc".to_vec();
        bytes.push(0xED);
        bytes.extend_from_slice(b"a;21,5\n");
        let path = write_temp("ccaa_scraper_test_semicolon.csv", &bytes);

        let table = read_delimited(&path).unwrap();
        assert_eq!(table.headers.len(), 2);
        assert_eq!(table.cell(0, 0), Some("Andalucía"));
        assert_eq!(table.cell(0, 1), Some("21,5"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_comma_fallback() {
        let path = write_temp(
            "ccaa_scraper_test_comma.csv",
            b"region,value\nCantabria,9\n",
        );
        let table = read_delimited(&path).unwrap();
        assert_eq!(table.headers, vec!["region", "value"]);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_strips_bom() {
        let path = write_temp(
            "ccaa_scraper_test_bom.csv",
            "\u{feff}a\tb\n1\t2\n".as_bytes(),
        );
        let table = read_delimited(&path).unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_single_column_is_an_error() {
        let path = write_temp("ccaa_scraper_test_single.csv", b"lonely\nvalue\n");
        assert!(read_delimited(&path).is_err());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_find_column() {
        let headers: Vec<String> = ["Nivel de formación", "Comunidades y Ciudades Autónomas", "Total"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(find_column(&headers, &["comunidad", "autónoma"]), Some(1));
        assert_eq!(find_column(&headers, &["nivel"]), Some(0));
        assert_eq!(find_column(&headers, &["total", "valor"]), Some(2));
        assert_eq!(find_column(&headers, &["edad"]), None);
    }

    #[test]
    fn test_parse_locale_number() {
        assert_eq!(parse_locale_number("12.345,67"), Some(12345.67));
        assert_eq!(parse_locale_number("0,5"), Some(0.5));
        assert_eq!(parse_locale_number("21.091"), Some(21091.0));
        assert_eq!(parse_locale_number(" 47,3 "), Some(47.3));
        assert_eq!(parse_locale_number(""), None);
        assert_eq!(parse_locale_number(".."), None);
        assert_eq!(parse_locale_number("n/d"), None);
    }
}
