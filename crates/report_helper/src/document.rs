//! PDF reports whose body flows through pages automatically.
//!
//! A decorated [`DocumentReport`] prints the report title and subtitle at the
//! top of the first page, a one-line `"title - subtitle"` header on the
//! following pages, the firm line in the footer of every page and a
//! `"Página X of N"` label once the page count is known. A blank report only
//! applies the page margins.

use genpdf::elements::{LinearLayout, Paragraph};
use genpdf::{Alignment, Element as _};
use log::debug;

use crate::buffer::ReportBuffer;
use crate::builder::DocumentBuilder;
use crate::config::{mm_from_f64, ReportSettings};
use crate::error::ReportError;
use crate::flowables::Story;
use crate::fonts;
use crate::numbering::{stamp_page_numbers, PageNumberFooter};
use crate::report::{Report, PDF_CONTENT_TYPE};
use crate::styles::StyleSheet;

const FOOTER_HEIGHT_MM: f64 = 8.0;
const HEADER_GAP_MM: f64 = 4.0;

/// Body of a flowing document.
pub trait DocumentContent {
    /// Appends the report body to `story`.
    fn write(&mut self, story: &mut Story, styles: &StyleSheet) -> Result<(), ReportError>;
}

impl<F> DocumentContent for F
where
    F: FnMut(&mut Story, &StyleSheet) -> Result<(), ReportError>,
{
    fn write(&mut self, story: &mut Story, styles: &StyleSheet) -> Result<(), ReportError> {
        self(story, styles)
    }
}

/// Text drawn in the page header and footer of decorated documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentHeader {
    pub title: String,
    pub subtitle: String,
    pub firm: String,
}

impl DocumentHeader {
    /// Header line used from the second page on.
    pub fn running_title(&self) -> String {
        format!("{} - {}", self.title, self.subtitle)
    }
}

/// A flowing-document PDF report.
pub struct DocumentReport<C> {
    filename: String,
    header: DocumentHeader,
    settings: ReportSettings,
    styles: StyleSheet,
    blank: bool,
    content: C,
    buffer: ReportBuffer,
}

impl<C: DocumentContent> DocumentReport<C> {
    /// Creates a decorated report using the default settings.
    pub fn new(filename: impl Into<String>, content: C) -> Self {
        Self {
            filename: filename.into(),
            header: DocumentHeader::default(),
            settings: ReportSettings::default(),
            styles: StyleSheet::sample(),
            blank: false,
            content,
            buffer: ReportBuffer::new(),
        }
    }

    /// Creates a report without header, footer or page numbers.
    pub fn blank(filename: impl Into<String>, content: C) -> Self {
        Self::new(filename, content).with_blank(true)
    }

    /// Switches between a decorated and a blank document.
    pub fn with_blank(mut self, blank: bool) -> Self {
        self.blank = blank;
        self
    }

    /// Sets the page size and margins.
    pub fn with_settings(mut self, settings: ReportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the paragraph styles.
    pub fn with_styles(mut self, styles: StyleSheet) -> Self {
        self.styles = styles;
        self
    }

    /// Sets the title printed on the first page and in the running header.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.header.title = title.into();
        self
    }

    /// Sets the subtitle printed under the title.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.header.subtitle = subtitle.into();
        self
    }

    /// Sets the firm line printed in every footer.
    pub fn with_firm(mut self, firm: impl Into<String>) -> Self {
        self.header.firm = firm.into();
        self
    }

    /// Report title.
    pub fn title(&self) -> &str {
        &self.header.title
    }

    /// Report subtitle.
    pub fn subtitle(&self) -> &str {
        &self.header.subtitle
    }

    /// Firm line shown in the footer.
    pub fn firm(&self) -> &str {
        &self.header.firm
    }

    /// Whether the document skips the header, footer and page numbers.
    pub fn is_blank(&self) -> bool {
        self.blank
    }

    /// Page size and margins used for every page.
    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    fn document_builder(&self) -> DocumentBuilder {
        let builder = DocumentBuilder::new()
            .with_title(self.header.title.clone())
            .with_paper_size(self.settings.page_size.to_genpdf())
            .with_margins(self.settings.margins.to_genpdf());

        if self.blank {
            return builder;
        }

        let header = self.header.clone();
        let styles = self.styles;
        let firm = self.header.firm.clone();
        let footer_style = styles.normal;

        builder
            .with_header(move |page| {
                let mut layout = LinearLayout::vertical();
                if page == 1 {
                    layout.push(Paragraph::new(header.title.clone()).styled(styles.heading1));
                    layout.push(Paragraph::new(header.subtitle.clone()).styled(styles.heading2));
                } else {
                    layout.push(
                        Paragraph::new(header.running_title()).styled(styles.body_text.bold()),
                    );
                }
                layout
            })
            .with_header_gap(mm_from_f64(HEADER_GAP_MM))
            .with_footer(mm_from_f64(FOOTER_HEIGHT_MM), move |_| {
                Paragraph::new(firm.clone())
                    .aligned(Alignment::Right)
                    .styled(footer_style)
            })
    }
}

impl<C: DocumentContent> Report for DocumentReport<C> {
    fn content_type(&self) -> &str {
        PDF_CONTENT_TYPE
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn build(&mut self) -> Result<Vec<u8>, ReportError> {
        let mut buffer = self.buffer.take()?;

        let mut story = Story::new();
        self.content.write(&mut story, &self.styles)?;

        let font_family = fonts::default_font_family()?;
        let mut document = self.document_builder().build(font_family);
        document.set_font_size(self.styles.normal.font_size());
        for element in story.into_elements() {
            document.push(element);
        }

        document.render(&mut buffer)?;
        let mut bytes = buffer.close()?;

        if !self.blank {
            let footer = PageNumberFooter::from_margins(&self.settings.margins);
            bytes = stamp_page_numbers(&bytes, &footer)?;
        }

        debug!(
            "Built document report '{}' ({} bytes, blank: {})",
            self.filename,
            bytes.len(),
            self.blank
        );
        Ok(bytes)
    }
}
