//! PDF report assembly.
//!
//! Renders one persisted dataset into a paginated document with a fixed
//! section order: header, summary statistics, type distribution,
//! dashboard image (when available), record listing, footer. Rendering
//! reads the dataset and nothing else — stored data is never touched —
//! and every generation gets a unique artifact name so repeated requests
//! never overwrite each other.

use chrono::Utc;
use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use uuid::Uuid;

use crate::chart::ChartImage;
use crate::error::{EquipError, Result};
use crate::model::{Dataset, DatasetStats};

/// The record listing shows at most this many rows, then one ellipsis
/// row signalling truncation.
const LISTING_LIMIT: usize = 20;

const NAME_WIDTH: usize = 20;
const TYPE_WIDTH: usize = 15;

/// Letter page, portrait, in millimetres.
const PAGE_WIDTH: f64 = 215.9;
const PAGE_HEIGHT: f64 = 279.4;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 18.0;
const MARGIN_LEFT: f64 = 20.0;

/// Resolution the dashboard image is embedded at.
const IMAGE_DPI: f64 = 150.0;

/// A fully rendered report, kept in memory so any storage or transport
/// layer can take it from here.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    /// Unique stored name, safe against repeated generation.
    pub file_name: String,
    /// Suggested download name derived from the source filename.
    pub download_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Render the report document for a dataset.
///
/// A missing chart image is a normal outcome (the visualization section
/// is omitted); any failure assembling the document itself is a `Render`
/// error scoped to this request.
pub fn render_report(dataset: &Dataset, chart: Option<&ChartImage>) -> Result<ReportArtifact> {
    let generated_at = Utc::now();

    let mut writer = PageWriter::new("Equipment Analysis Report")?;

    // 1. Header
    writer.title("Equipment Analysis Report");
    writer.gap(6.0);
    writer.heading("Dataset Information");
    writer.key_value("Filename:", &dataset.filename);
    writer.key_value(
        "Upload Date:",
        &dataset.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    writer.key_value("Total Equipment:", &dataset.stats.total_count.to_string());

    // 2. Summary statistics
    writer.gap(6.0);
    writer.heading("Summary Statistics");
    writer.table_row3(("Parameter", "Average Value", "Unit"), true);
    for (name, value, unit) in [
        ("Flowrate", dataset.stats.avg_flowrate, "m³/h"),
        ("Pressure", dataset.stats.avg_pressure, "bar"),
        ("Temperature", dataset.stats.avg_temperature, "°C"),
    ] {
        writer.table_row3((name, format!("{value:.2}").as_str(), unit), false);
    }

    // 3. Distribution table
    writer.gap(6.0);
    writer.heading("Equipment Type Distribution");
    writer.table_row3(("Equipment Type", "Count", "Percentage"), true);
    for row in distribution_rows(&dataset.stats) {
        let [name, count, percentage] = row;
        writer.table_row3((name.as_str(), count.as_str(), percentage.as_str()), false);
    }

    // 4. Visualization (omitted entirely when chart generation failed)
    if let Some(image) = chart {
        writer.gap(6.0);
        writer.heading("Data Visualization");
        writer.embed_image(image)?;
    }

    // 5. Record listing, on a fresh page.
    writer.new_page();
    writer.heading("Equipment Details");
    writer.gap(2.0);
    writer.table_row5(["Name", "Type", "Flowrate", "Pressure", "Temp"], true);
    for row in listing_rows(dataset) {
        let [name, kind, flowrate, pressure, temperature] = row;
        writer.table_row5(
            [
                name.as_str(),
                kind.as_str(),
                flowrate.as_str(),
                pressure.as_str(),
                temperature.as_str(),
            ],
            false,
        );
    }

    // 6. Footer
    writer.gap(10.0);
    writer.footer(&format!(
        "Generated on {} | equipscope",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    let bytes = writer.finish()?;
    tracing::info!(
        dataset = %dataset.id,
        size = bytes.len(),
        "report rendered"
    );

    Ok(ReportArtifact {
        file_name: artifact_name(dataset, &generated_at),
        download_name: format!("report_{}.pdf", dataset.filename),
        content_type: "application/pdf",
        bytes,
    })
}

/// Distribution table rows: type, count, percentage of total to one
/// decimal place. Empty when the total count is zero — no division ever
/// happens for a degenerate dataset.
fn distribution_rows(stats: &DatasetStats) -> Vec<[String; 3]> {
    if stats.total_count == 0 {
        return Vec::new();
    }
    stats
        .ordered_distribution()
        .into_iter()
        .map(|(name, count)| {
            let percentage = count as f64 / stats.total_count as f64 * 100.0;
            [name, count.to_string(), format!("{percentage:.1}%")]
        })
        .collect()
}

/// Listing rows: the first twenty records with truncated text columns,
/// plus one ellipsis row when more exist. The "more data" signal is
/// never silently dropped.
fn listing_rows(dataset: &Dataset) -> Vec<[String; 5]> {
    let mut rows: Vec<[String; 5]> = dataset
        .records
        .iter()
        .take(LISTING_LIMIT)
        .map(|record| {
            [
                truncate(&record.name, NAME_WIDTH),
                truncate(&record.equipment_type, TYPE_WIDTH),
                format!("{:.1}", record.flowrate),
                format!("{:.1}", record.pressure),
                format!("{:.1}", record.temperature),
            ]
        })
        .collect();

    if dataset.records.len() > LISTING_LIMIT {
        rows.push(std::array::from_fn(|_| "...".to_owned()));
    }
    rows
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn artifact_name(dataset: &Dataset, generated_at: &chrono::DateTime<Utc>) -> String {
    // Timestamp for humans, random suffix so two generations within the
    // same second still get distinct names.
    let suffix = Uuid::new_v4().simple().to_string();
    let short_suffix = suffix.get(..8).unwrap_or("0");
    format!(
        "report_{}_{}_{}.pdf",
        dataset.id,
        generated_at.format("%Y%m%d_%H%M%S"),
        short_suffix
    )
}

fn pdf_err(err: printpdf::Error) -> EquipError {
    EquipError::Render(err.to_string())
}

/// Cursor-based page writer: tracks the distance from the page top and
/// starts a new page whenever a section would cross the bottom margin.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f64,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: MARGIN_TOP,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = MARGIN_TOP;
    }

    fn ensure(&mut self, needed: f64) {
        if self.y + needed > PAGE_HEIGHT - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn gap(&mut self, height: f64) {
        self.y += height;
    }

    fn baseline(&self) -> Mm {
        Mm((PAGE_HEIGHT - self.y) as f32)
    }

    fn title(&mut self, text: &str) {
        self.ensure(14.0);
        self.y += 12.0;
        self.layer
            .use_text(text, 22.0, Mm((MARGIN_LEFT + 30.0) as f32), self.baseline(), &self.bold);
    }

    fn heading(&mut self, text: &str) {
        self.ensure(10.0);
        self.y += 9.0;
        self.layer
            .use_text(text, 15.0, Mm(MARGIN_LEFT as f32), self.baseline(), &self.bold);
        self.y += 2.0;
    }

    fn key_value(&mut self, key: &str, value: &str) {
        self.ensure(6.0);
        self.y += 6.0;
        self.layer
            .use_text(key, 11.0, Mm(MARGIN_LEFT as f32), self.baseline(), &self.bold);
        self.layer
            .use_text(value, 11.0, Mm((MARGIN_LEFT + 50.0) as f32), self.baseline(), &self.regular);
    }

    fn table_row3(&mut self, cells: (&str, &str, &str), header: bool) {
        self.ensure(6.0);
        self.y += 6.0;
        let font = if header { &self.bold } else { &self.regular };
        let (a, b, c) = cells;
        self.layer.use_text(a, 11.0, Mm(MARGIN_LEFT as f32), self.baseline(), font);
        self.layer
            .use_text(b, 11.0, Mm((MARGIN_LEFT + 65.0) as f32), self.baseline(), font);
        self.layer
            .use_text(c, 11.0, Mm((MARGIN_LEFT + 115.0) as f32), self.baseline(), font);
    }

    fn table_row5(&mut self, cells: [&str; 5], header: bool) {
        self.ensure(6.0);
        self.y += 6.0;
        let font = if header { &self.bold } else { &self.regular };
        let columns = [0.0, 48.0, 88.0, 120.0, 152.0];
        for (text, offset) in cells.iter().zip(columns) {
            self.layer
                .use_text(*text, 10.0, Mm((MARGIN_LEFT + offset) as f32), self.baseline(), font);
        }
    }

    fn footer(&mut self, text: &str) {
        self.ensure(6.0);
        self.y += 6.0;
        self.layer
            .use_text(text, 9.0, Mm(MARGIN_LEFT as f32), self.baseline(), &self.regular);
    }

    fn embed_image(&mut self, image: &ChartImage) -> Result<()> {
        let width_mm = f64::from(image.width) / IMAGE_DPI * 25.4;
        let height_mm = f64::from(image.height) / IMAGE_DPI * 25.4;

        self.ensure(height_mm + 4.0);
        self.y += height_mm + 2.0;

        let rgb = RgbImage::from_raw(image.width, image.height, image.pixels.clone())
            .ok_or_else(|| EquipError::Render("chart buffer does not match its dimensions".to_owned()))?;
        let pdf_image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(rgb));

        let x = (PAGE_WIDTH - width_mm).max(0.0) / 2.0;
        pdf_image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x as f32)),
                translate_y: Some(self.baseline()),
                dpi: Some(IMAGE_DPI as f32),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc.save_to_bytes().map_err(pdf_err)
    }
}
