//! PDF reports drawn directly on a [`Canvas`].

use std::io::Write;

use log::debug;

use crate::buffer::ReportBuffer;
use crate::canvas::{Canvas, PdfSink};
use crate::config::ReportSettings;
use crate::error::ReportError;
use crate::numbering::PageNumberFooter;
use crate::report::{Report, PDF_CONTENT_TYPE};

/// Body of a canvas report.
pub trait CanvasContent {
    /// Draws the report. Pages are ended with [`Canvas::show_page`]; the last
    /// page is shown automatically when it holds any drawing.
    fn write(&mut self, canvas: &mut Canvas, settings: &ReportSettings) -> Result<(), ReportError>;
}

impl<F> CanvasContent for F
where
    F: FnMut(&mut Canvas, &ReportSettings) -> Result<(), ReportError>,
{
    fn write(&mut self, canvas: &mut Canvas, settings: &ReportSettings) -> Result<(), ReportError> {
        self(canvas, settings)
    }
}

/// A PDF report with full manual control over the page.
pub struct CanvasReport<C> {
    filename: String,
    title: String,
    settings: ReportSettings,
    page_numbers: bool,
    content: C,
    buffer: ReportBuffer,
}

impl<C: CanvasContent> CanvasReport<C> {
    /// Creates an unnumbered report drawn by `content` with default settings.
    pub fn new(filename: impl Into<String>, content: C) -> Self {
        let filename = filename.into();
        Self {
            title: filename.clone(),
            filename,
            settings: ReportSettings::default(),
            page_numbers: false,
            content,
            buffer: ReportBuffer::new(),
        }
    }

    /// Sets the title stored in the PDF metadata. Defaults to the filename.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the page size and margins.
    pub fn with_settings(mut self, settings: ReportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Stamps every page with `"Página i of N"` at the bottom-right margin corner.
    pub fn with_page_numbers(mut self, enabled: bool) -> Self {
        self.page_numbers = enabled;
        self
    }

    /// Title stored in the PDF metadata.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Page size and margins used for every page.
    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Whether pages get a `"Página X of N"` label.
    pub fn has_page_numbers(&self) -> bool {
        self.page_numbers
    }
}

impl<C: CanvasContent> Report for CanvasReport<C> {
    fn content_type(&self) -> &str {
        PDF_CONTENT_TYPE
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn build(&mut self) -> Result<Vec<u8>, ReportError> {
        let mut buffer = self.buffer.take()?;

        let sink = PdfSink::new(self.title.clone());
        let page_size = self.settings.page_size;
        let mut canvas = if self.page_numbers {
            let footer = PageNumberFooter::from_margins(&self.settings.margins);
            Canvas::numbered(sink, page_size, footer)
        } else {
            Canvas::new(sink, page_size)
        };

        self.content.write(&mut canvas, &self.settings)?;
        let pages = canvas.page_number() - usize::from(canvas.current_page().is_blank());
        buffer.write_all(&canvas.save()?)?;
        let bytes = buffer.close()?;

        debug!(
            "Built canvas report '{}' ({} page(s), {} bytes)",
            self.filename,
            pages,
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use lopdf::content::Content;
    use lopdf::{Document, Object};

    use super::CanvasReport;
    use crate::canvas::{Canvas, Font};
    use crate::config::{PageSize, ReportSettings};
    use crate::error::ReportError;
    use crate::report::Report;

    fn three_pages(canvas: &mut Canvas, settings: &ReportSettings) -> Result<(), ReportError> {
        let left = settings.margins.left_mm();
        let top = settings.page_size.height_mm - settings.margins.top_mm();
        for page in 1..=3 {
            canvas.set_font(Font::HelveticaBold, 14);
            canvas.draw_string(left, top, format!("Sección {page}"));
            canvas.line(left, top - 4.0, left + 80.0, top - 4.0);
            canvas.show_page()?;
        }
        Ok(())
    }

    fn page_texts(pdf: &[u8]) -> Vec<Vec<String>> {
        let document = Document::load_mem(pdf).expect("valid pdf");
        document
            .get_pages()
            .values()
            .map(|page_id| {
                let raw = document.get_page_content(*page_id).expect("page content");
                let content = Content::decode(&raw).expect("decodable content");
                content
                    .operations
                    .iter()
                    .filter(|op| op.operator == "Tj")
                    .filter_map(|op| match op.operands.first() {
                        Some(Object::String(bytes, _)) => {
                            Some(String::from_utf8_lossy(bytes).into_owned())
                        }
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn declares_pdf_metadata() {
        let report = CanvasReport::new("mayor.pdf", three_pages)
            .with_settings(ReportSettings::default().with_page_size(PageSize::A4))
            .with_page_numbers(true);

        assert_eq!(report.content_type(), "application/pdf");
        assert_eq!(report.filename(), "mayor.pdf");
        assert_eq!(report.title(), "mayor.pdf");
        assert_eq!(report.settings().page_size, PageSize::A4);
        assert!(report.has_page_numbers());
    }

    #[test]
    fn builds_every_drawn_page() {
        let mut report = CanvasReport::new("mayor.pdf", three_pages);
        let pdf = report.build().unwrap();

        assert!(pdf.starts_with(b"%PDF"));
        let document = Document::load_mem(&pdf).unwrap();
        assert_eq!(document.get_pages().len(), 3);
    }

    #[test]
    fn numbered_report_labels_each_page() {
        let mut report = CanvasReport::new("mayor.pdf", three_pages).with_page_numbers(true);
        let pdf = report.build().unwrap();

        let labels: Vec<usize> = page_texts(&pdf)
            .iter()
            .map(|texts| texts.iter().filter(|text| text.contains(" of 3")).count())
            .collect();
        assert_eq!(labels, vec![1, 1, 1]);
    }

    #[test]
    fn plain_report_has_no_labels() {
        let mut report = CanvasReport::new("mayor.pdf", three_pages);
        let pdf = report.build().unwrap();
        assert!(page_texts(&pdf)
            .iter()
            .flatten()
            .all(|text| !text.contains(" of ")));
    }

    #[test]
    fn second_build_is_rejected() {
        let mut report = CanvasReport::new("mayor.pdf", three_pages);
        assert!(report.build().is_ok());
        assert!(matches!(report.build(), Err(ReportError::AlreadyBuilt)));
    }
}
