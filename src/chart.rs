//! Dashboard image generation.
//!
//! Renders one composite 2×2 image for a dataset: type distribution pie,
//! average-parameter bars, per-type count bars, and a trend chart over
//! the first ten records. The image is produced entirely in memory as a
//! tightly packed RGB buffer — no temporary files — so the report
//! renderer can embed it directly and a live dashboard client can blit
//! it straight into a texture.
//!
//! Failure here is never fatal: [`render_dashboard`] logs the error and
//! returns `None`, and callers carry on without a visualization.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::EquipError;
use crate::model::{Dataset, DatasetStats, EquipmentRecord};

/// How many leading records feed the trend panel.
const TREND_RECORDS: usize = 10;

/// Slice/bar palette, cycled when a dataset has more types than entries.
const PALETTE: [RGBColor; 8] = [
    RGBColor(52, 152, 219),
    RGBColor(231, 76, 60),
    RGBColor(46, 204, 113),
    RGBColor(155, 89, 182),
    RGBColor(241, 196, 15),
    RGBColor(26, 188, 156),
    RGBColor(230, 126, 34),
    RGBColor(149, 165, 166),
];

const FLOWRATE_COLOR: RGBColor = RGBColor(52, 152, 219);
const PRESSURE_COLOR: RGBColor = RGBColor(231, 76, 60);
const TEMPERATURE_COLOR: RGBColor = RGBColor(46, 204, 113);

/// An in-memory dashboard image: 8-bit RGB, row-major, no padding.
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Render the four-panel dashboard for a dataset.
///
/// Returns `None` when image generation fails for any reason; the error
/// is logged and the caller treats the missing image as a normal
/// outcome.
pub fn render_dashboard(dataset: &Dataset, width: u32, height: u32) -> Option<ChartImage> {
    match draw_dashboard(dataset, width, height) {
        Ok(image) => Some(image),
        Err(e) => {
            let err = EquipError::ChartRender(e.to_string());
            tracing::warn!(error = %err, "continuing without visualization");
            None
        }
    }
}

fn draw_dashboard(dataset: &Dataset, width: u32, height: u32) -> anyhow::Result<ChartImage> {
    anyhow::ensure!(
        width >= 320 && height >= 240,
        "dashboard dimensions {width}x{height} below minimum 320x240"
    );

    let mut pixels = vec![0_u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let titled = root.titled("Equipment Analysis Dashboard", ("sans-serif", 24))?;
        let panels = titled.split_evenly((2, 2));
        let [pie, averages, counts, trend] = panels.as_slice() else {
            anyhow::bail!("2x2 split produced {} panels", panels.len());
        };

        draw_type_pie(pie, &dataset.stats)?;
        draw_average_bars(averages, &dataset.stats)?;
        draw_count_bars(counts, &dataset.stats)?;
        draw_trend_lines(trend, &dataset.records)?;

        root.present()?;
    }

    Ok(ChartImage {
        width,
        height,
        pixels,
    })
}

/// Panel A: one slice per equipment type with percentage labels.
fn draw_type_pie(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    stats: &DatasetStats,
) -> anyhow::Result<()> {
    let area = area.titled("Equipment Type Distribution", ("sans-serif", 16))?;

    let entries = stats.ordered_distribution();
    if entries.is_empty() {
        return Ok(());
    }

    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.32;

    let sizes: Vec<f64> = entries.iter().map(|(_, count)| *count as f64).collect();
    let labels: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
    let colors: Vec<RGBColor> = PALETTE.iter().cycle().take(entries.len()).copied().collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style(("sans-serif", 14).into_font());
    pie.percentages(("sans-serif", 12).into_font().color(&BLACK));
    area.draw(&pie)?;

    Ok(())
}

/// Panel B: one bar per average parameter, value printed above the bar.
fn draw_average_bars(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    stats: &DatasetStats,
) -> anyhow::Result<()> {
    let bars = [
        ("Flowrate", stats.avg_flowrate, FLOWRATE_COLOR),
        ("Pressure", stats.avg_pressure, PRESSURE_COLOR),
        ("Temperature", stats.avg_temperature, TEMPERATURE_COLOR),
    ];

    let low = bars.iter().map(|b| b.1).fold(0.0_f64, f64::min);
    let high = bars.iter().map(|b| b.1).fold(0.0_f64, f64::max);
    let (y_min, y_max) = padded_range(low, high);

    let mut chart = ChartBuilder::on(area)
        .caption("Average Parameters", ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(16)
        .y_label_area_size(44)
        .build_cartesian_2d(0.0_f64..3.0_f64, y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_labels(5)
        .draw()?;

    let label_style = TextStyle::from(("sans-serif", 13).into_font())
        .pos(Pos::new(HPos::Center, VPos::Bottom));

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, value, color))| {
        let x = i as f64;
        Rectangle::new([(x + 0.2, 0.0), (x + 0.8, *value)], color.filled())
    }))?;
    chart.draw_series(bars.iter().enumerate().map(|(i, (name, value, _))| {
        let x = i as f64 + 0.5;
        let y = value.max(0.0) + (y_max - y_min) * 0.02;
        Text::new(format!("{name} {value:.1}"), (x, y), label_style.clone())
    }))?;

    Ok(())
}

/// Panel C: horizontal per-type count bars, labelled at the bar end.
fn draw_count_bars(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    stats: &DatasetStats,
) -> anyhow::Result<()> {
    let entries = stats.ordered_distribution();
    if entries.is_empty() {
        return Ok(());
    }

    let max_count = entries.iter().map(|(_, c)| *c).max().unwrap_or(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption("Equipment Count by Type", ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(28)
        .y_label_area_size(16)
        .build_cartesian_2d(0.0_f64..max_count * 1.35, 0.0_f64..entries.len() as f64)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(0)
        .x_labels(5)
        .draw()?;

    let label_style = TextStyle::from(("sans-serif", 13).into_font())
        .pos(Pos::new(HPos::Left, VPos::Center));

    chart.draw_series(entries.iter().enumerate().map(|(i, (_, count))| {
        let y = i as f64;
        Rectangle::new(
            [(0.0, y + 0.15), (*count as f64, y + 0.85)],
            RGBColor(155, 89, 182).filled(),
        )
    }))?;
    chart.draw_series(entries.iter().enumerate().map(|(i, (name, count))| {
        Text::new(
            format!("{name} ({count})"),
            (*count as f64 + max_count * 0.03, i as f64 + 0.5),
            label_style.clone(),
        )
    }))?;

    Ok(())
}

/// Panel D: flowrate/pressure/temperature across the first ten records in
/// stored order. Left blank when the dataset has no records.
fn draw_trend_lines(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    records: &[EquipmentRecord],
) -> anyhow::Result<()> {
    let window: Vec<&EquipmentRecord> = records.iter().take(TREND_RECORDS).collect();
    if window.is_empty() {
        return Ok(());
    }

    let all_values = window
        .iter()
        .flat_map(|r| [r.flowrate, r.pressure, r.temperature]);
    let low = all_values.clone().fold(f64::INFINITY, f64::min);
    let high = all_values.fold(f64::NEG_INFINITY, f64::max);
    let (y_min, y_max) = padded_range(low, high);

    let x_max = (window.len() as f64 - 1.0).max(1.0);

    let mut chart = ChartBuilder::on(area)
        .caption("Parameter Trends (First 10 Records)", ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(28)
        .y_label_area_size(44)
        .build_cartesian_2d(0.0_f64..x_max, y_min..y_max)?;

    chart.configure_mesh().x_labels(window.len()).y_labels(5).draw()?;

    let series: [(&str, fn(&EquipmentRecord) -> f64, RGBColor); 3] = [
        ("Flowrate", |r| r.flowrate, FLOWRATE_COLOR),
        ("Pressure", |r| r.pressure, PRESSURE_COLOR),
        ("Temperature", |r| r.temperature, TEMPERATURE_COLOR),
    ];

    for (name, value_of, color) in series {
        let points: Vec<(f64, f64)> = window
            .iter()
            .enumerate()
            .map(|(i, r)| (i as f64, value_of(r)))
            .collect();
        chart
            .draw_series(LineSeries::new(points, &color).point_size(3))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.4))
        .draw()?;

    Ok(())
}

/// A drawable y-range around `[low, high]`: includes zero for bar
/// baselines, never collapses to a zero span.
fn padded_range(low: f64, high: f64) -> (f64, f64) {
    let low = low.min(0.0);
    let high = high.max(0.0);
    let span = high - low;
    if span <= f64::EPSILON {
        return (low - 1.0, high + 1.0);
    }
    (low - span * 0.05, high + span * 0.15)
}
