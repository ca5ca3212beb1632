//! GDP-per-capita extractor for the statistics agency's operation page.
//!
//! The page embeds several presentation tables; the first one carries the
//! latest per-region figures. It is persisted as-is, minus placeholder
//! columns, and all the heuristic work happens downstream in
//! [`crate::process`].

use crate::fetch::{self, HttpClient};
use crate::output;
use crate::tabular::{self, Table};
use anyhow::{Result, bail};
use scraper::{Html, Selector};
use std::path::Path;
use tracing::info;

pub const GDP_URL: &str = "https://www.ine.es/dyngs/INEbase/es/operacion.htm?c=Estadistica_C&cid=1254736167628&menu=ultiDatos&idp=1254735576581";

/// Fetches the operation page and writes the first table to the raw GDP
/// file, unmodified except for placeholder columns.
pub async fn extract<C: HttpClient>(client: &C, dir: &Path) -> Result<usize> {
    info!(url = GDP_URL, "extracting GDP table");

    let bytes = fetch::fetch_bytes(client, GDP_URL).await?;
    let html = tabular::decode_text(&bytes);
    let table = drop_unnamed_columns(parse_first_table(&html)?);

    let path = dir.join(output::RAW_GDP_FILE);
    tabular::write_delimited(&path, &table)?;
    info!(rows = table.rows.len(), path = %path.display(), "GDP extraction done");

    Ok(table.rows.len())
}

/// First `<table>` of the page as a header row plus data rows.
pub fn parse_first_table(html: &str) -> Result<Table> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table").expect("invalid table selector");
    let tr_sel = Selector::parse("tr").expect("invalid tr selector");
    let cell_sel = Selector::parse("td, th").expect("invalid cell selector");

    let Some(table) = document.select(&table_sel).next() else {
        bail!("no table found in the GDP page");
    };

    let mut grid: Vec<Vec<String>> = Vec::new();
    for tr in table.select(&tr_sel) {
        let cells: Vec<String> = tr.select(&cell_sel).map(|c| super::cell_text(&c)).collect();
        if cells.is_empty() {
            continue;
        }
        grid.push(cells);
    }

    if grid.is_empty() {
        bail!("GDP table has no rows");
    }

    let headers = grid.remove(0);
    Ok(Table {
        headers,
        rows: grid,
    })
}

/// Drops columns whose header cell is blank, the layout-only placeholders
/// the page pads its tables with.
pub fn drop_unnamed_columns(table: Table) -> Table {
    let keep: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.trim().is_empty())
        .map(|(i, _)| i)
        .collect();

    if keep.len() == table.headers.len() {
        return table;
    }

    let headers = keep.iter().map(|&i| table.headers[i].clone()).collect();
    let rows = table
        .rows
        .iter()
        .map(|row| keep.iter().filter_map(|&i| row.get(i).cloned()).collect())
        .collect();

    Table { headers, rows }
}
