//! Elements that flow through a document: paragraphs, spacers, tables and images.
//!
//! Report authors collect their content in a [`Story`] from
//! [`crate::document::DocumentContent::write`]; `genpdf` lays the elements out
//! into pages when the report is built.

use std::path::Path;

use genpdf::elements::{Break, FrameCellDecorator, Image, Paragraph, TableLayout};
use genpdf::error::{Context as _, Error};
use genpdf::style::Style;
use genpdf::{Alignment, Element, Margins, Scale};
use image::GenericImageView;

use crate::config::mm_from_f64;
use crate::error::ReportError;

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const CELL_PADDING_MM: f64 = 1.0;

/// Ordered list of elements making up the body of a flowing document.
#[derive(Default)]
pub struct Story {
    elements: Vec<Box<dyn Element>>,
}

impl Story {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Appends any `genpdf` element.
    pub fn push<E: Element + 'static>(&mut self, element: E) {
        self.elements.push(Box::new(element));
    }

    /// Appends a paragraph rendered with `style`.
    pub fn paragraph(&mut self, text: impl Into<String>, style: Style) {
        self.push(Paragraph::new(text.into()).styled(style));
    }

    /// Appends vertical space measured in lines.
    pub fn spacer(&mut self, lines: f64) {
        self.push(Break::new(lines));
    }

    pub(crate) fn into_elements(self) -> Vec<StoryElement> {
        self.elements.into_iter().map(StoryElement).collect()
    }
}

/// A story entry that can be handed to `genpdf` by value.
pub(crate) struct StoryElement(Box<dyn Element>);

impl Element for StoryElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: genpdf::render::Area<'_>,
        style: Style,
    ) -> Result<genpdf::RenderResult, Error> {
        self.0.render(context, area, style)
    }
}

/// Builds a framed table with a bold header row.
///
/// Rows shorter than the header are padded with empty cells; longer rows are
/// rejected.
pub fn data_table<H, R, C>(header: &[H], rows: R, style: Style) -> Result<TableLayout, ReportError>
where
    H: AsRef<str>,
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: AsRef<str>,
{
    let columns = header.len();
    let mut table = TableLayout::new(vec![1; columns]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let header_style = style.bold();
    let mut header_row = table.row();
    for title in header {
        header_row.push_element(cell(title.as_ref(), header_style));
    }
    header_row.push()?;

    for (index, values) in rows.into_iter().enumerate() {
        let mut values: Vec<String> = values
            .into_iter()
            .map(|value| value.as_ref().to_owned())
            .collect();
        if values.len() > columns {
            return Err(ReportError::Layout(Error::new(
                format!(
                    "Table row {} has {} cells but the header has {}",
                    index + 1,
                    values.len(),
                    columns
                ),
                genpdf::error::ErrorKind::InvalidData,
            )));
        }
        values.resize(columns, String::new());

        let mut row = table.row();
        for value in values {
            row.push_element(cell(&value, style));
        }
        row.push()?;
    }

    Ok(table)
}

fn cell(text: &str, style: Style) -> impl Element {
    Paragraph::new(text.to_owned())
        .styled(style)
        .padded(Margins::all(mm_from_f64(CELL_PADDING_MM)))
}

fn decode_image_from_bytes(bytes: &[u8]) -> Result<image::DynamicImage, Error> {
    image::load_from_memory(bytes).context("Failed to decode image from provided bytes")
}

fn decode_image_from_path(path: &Path) -> Result<image::DynamicImage, Error> {
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// Natural width of `image` in millimetres at the default resolution.
fn natural_width_mm(image: &image::DynamicImage) -> f64 {
    let (px_width, _) = image.dimensions();
    MM_PER_INCH * f64::from(px_width) / DEFAULT_IMAGE_DPI
}

fn scaled_image(
    dynamic: image::DynamicImage,
    width_mm: Option<f64>,
    alignment: Alignment,
) -> Result<Image, ReportError> {
    let natural = natural_width_mm(&dynamic);
    let mut image = Image::from_dynamic_image(dynamic)?;
    image.set_alignment(alignment);

    if let Some(width) = width_mm {
        if natural > f64::EPSILON {
            let scale = width / natural;
            image.set_scale(Scale::new(scale, scale));
        }
    }

    Ok(image)
}

/// Decodes an image (for example a company logo) from memory.
///
/// `width_mm` rescales the image keeping its aspect ratio.
pub fn image_from_bytes(
    bytes: impl AsRef<[u8]>,
    width_mm: Option<f64>,
    alignment: Alignment,
) -> Result<Image, ReportError> {
    let dynamic = decode_image_from_bytes(bytes.as_ref())?;
    scaled_image(dynamic, width_mm, alignment)
}

/// Loads an image from disk; see [`image_from_bytes`].
pub fn image_from_path(
    path: impl AsRef<Path>,
    width_mm: Option<f64>,
    alignment: Alignment,
) -> Result<Image, ReportError> {
    let dynamic = decode_image_from_path(path.as_ref())?;
    scaled_image(dynamic, width_mm, alignment)
}
