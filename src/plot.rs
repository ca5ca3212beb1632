//! Scatter chart of the merged dataset: GDP per capita against the share
//! of higher education, one point per region, colored by the winning
//! party. Pure rendering; every decision was already made upstream.

use crate::output;
use crate::process::{MergedRecord, Winner};
use anyhow::{Context, Result, bail};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::path::{Path, PathBuf};
use tracing::info;

/// Party colors as the original press charts use them.
pub const PP_COLOR: RGBColor = RGBColor(0x00, 0x55, 0xA7);
pub const PSOE_COLOR: RGBColor = RGBColor(0xE3, 0x06, 0x13);
pub const TIE_COLOR: RGBColor = RGBColor(0x80, 0x80, 0x80);

const GUIDE_COLOR: RGBColor = RGBColor(0x90, 0x90, 0x90);

const WIDTH: u32 = 1400;
const HEIGHT: u32 = 1000;

pub fn winner_color(winner: Winner) -> RGBColor {
    match winner {
        Winner::Pp => PP_COLOR,
        Winner::Psoe => PSOE_COLOR,
        Winner::Tie => TIE_COLOR,
    }
}

/// Reads the merged file from `dir` and renders the chart next to it.
pub fn render(dir: &Path) -> Result<PathBuf> {
    let records: Vec<MergedRecord> = output::read_records(&dir.join(output::MERGED_FILE))
        .context("could not read the merged file; run the process stage first")?;
    if records.is_empty() {
        bail!("merged dataset is empty, nothing to plot");
    }

    let out_path = dir.join(output::CHART_FILE);
    draw(&records, &out_path)?;
    info!(regions = records.len(), path = %out_path.display(), "chart rendered");

    Ok(out_path)
}

fn draw(records: &[MergedRecord], out_path: &Path) -> Result<()> {
    let root = BitMapBackend::new(out_path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_min, x_max) = padded_range(records.iter().map(|r| r.gdp_per_capita));
    let (y_min, y_max) = padded_range(records.iter().map(|r| r.pct_higher_education));

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Nivel socioeconómico y voto (PP vs PSOE)",
            ("sans-serif", 34),
        )
        .margin(24)
        .x_label_area_size(70)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("PIB per cápita (€)")
        .y_desc("% población 25-64 con educación superior")
        .label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 20))
        .draw()?;

    // Mean reference lines split the chart into quadrants.
    let mean_x = records.iter().map(|r| r.gdp_per_capita).sum::<f64>() / records.len() as f64;
    let mean_y =
        records.iter().map(|r| r.pct_higher_education).sum::<f64>() / records.len() as f64;
    chart.draw_series(DashedLineSeries::new(
        [(mean_x, y_min), (mean_x, y_max)],
        8,
        6,
        GUIDE_COLOR.stroke_width(1),
    ))?;
    chart.draw_series(DashedLineSeries::new(
        [(x_min, mean_y), (x_max, mean_y)],
        8,
        6,
        GUIDE_COLOR.stroke_width(1),
    ))?;

    for winner in [Winner::Pp, Winner::Psoe, Winner::Tie] {
        let group: Vec<&MergedRecord> = records.iter().filter(|r| r.winner == winner).collect();
        if group.is_empty() {
            continue;
        }
        let color = winner_color(winner);

        chart
            .draw_series(group.iter().map(|r| {
                let pos = (r.gdp_per_capita, r.pct_higher_education);
                EmptyElement::at(pos)
                    + Circle::new((0, 0), 8, color.filled())
                    + Text::new(r.ccaa.clone(), (12, -16), ("sans-serif", 15).into_font())
            }))?
            .label(winner.label())
            .legend(move |(x, y)| Circle::new((x + 10, y), 6, color.filled()));

        // Black point edges, drawn over the fills.
        chart.draw_series(group.iter().map(|r| {
            Circle::new(
                (r.gdp_per_capita, r.pct_higher_education),
                8,
                BLACK.stroke_width(1),
            )
        }))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .label_font(("sans-serif", 16))
        .draw()?;

    let footnote_style = TextStyle::from(("sans-serif", 14).into_font()).color(&GUIDE_COLOR);
    root.draw_text(
        "Fuente: El País, INE",
        &footnote_style,
        (WIDTH as i32 - 190, HEIGHT as i32 - 26),
    )?;

    root.present()?;
    Ok(())
}

/// Axis range with a small pad so edge points and their labels stay inside
/// the plot area.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    let pad = ((max - min) * 0.08).max(1.0);
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winner_colors_are_distinct() {
        let colors = [
            winner_color(Winner::Pp),
            winner_color(Winner::Psoe),
            winner_color(Winner::Tie),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in colors.iter().skip(i + 1) {
                assert_ne!(a.rgb(), b.rgb());
            }
        }
    }

    #[test]
    fn test_padded_range_pads_both_sides() {
        let (min, max) = padded_range([10.0, 20.0].into_iter());
        assert!(min < 10.0);
        assert!(max > 20.0);
    }

    #[test]
    fn test_padded_range_degenerate_single_value() {
        let (min, max) = padded_range([5.0].into_iter());
        assert!(min < 5.0 && max > 5.0);
    }
}
