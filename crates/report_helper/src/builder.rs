//! `genpdf` documents with margins, a per-page header and a footer band.

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::render::Area;
use genpdf::style::Style;
use genpdf::{Context, Document, Element, Margins, Mm, PageDecorator, Position, Size};

#[cfg(feature = "hyphenation")]
use genpdf::hyphenation;

/// Produces the header or footer element for a 1-based page number.
type PageElementFactory = Box<dyn Fn(usize) -> Box<dyn Element>>;

fn boxed_factory<F, E>(factory: F) -> PageElementFactory
where
    F: Fn(usize) -> E + 'static,
    E: Element + 'static,
{
    Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>)
}

/// Builder for report documents.
///
/// Without a header or footer the result only applies the margins, which is
/// what blank reports use.
#[derive(Default)]
pub struct DocumentBuilder {
    title: Option<String>,
    paper_size: Option<Size>,
    margins: Option<Margins>,
    header: Option<PageElementFactory>,
    header_gap: Mm,
    footer: Option<FooterBand>,
    #[cfg(feature = "hyphenation")]
    hyphenator: Option<hyphenation::Standard>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Renders `header(page)` at the top of every page, above the body.
    pub fn with_header<F, E>(mut self, header: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.header = Some(boxed_factory(header));
        self
    }

    /// Space between the header and the body.
    pub fn with_header_gap(mut self, gap: impl Into<Mm>) -> Self {
        self.header_gap = gap.into();
        self
    }

    /// Reserves a band of `height` at the bottom of every page and renders
    /// `footer(page)` into it.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterBand {
            height: height.into(),
            factory: boxed_factory(footer),
        });
        self
    }

    #[cfg(feature = "hyphenation")]
    pub fn with_hyphenator(mut self, hyphenator: hyphenation::Standard) -> Self {
        self.hyphenator = Some(hyphenator);
        self
    }

    pub fn has_header(&self) -> bool {
        self.header.is_some()
    }

    pub fn has_footer(&self) -> bool {
        self.footer.is_some()
    }

    /// Builds a document using `font_family` as its default font.
    pub fn build(self, font_family: FontFamily<FontData>) -> Document {
        let mut document = Document::new(font_family);

        if let Some(title) = self.title {
            document.set_title(title);
        }
        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }

        document.set_page_decorator(ReportPageDecorator {
            page: 0,
            margins: self.margins,
            header: self.header,
            header_gap: self.header_gap,
            footer: self.footer,
        });

        #[cfg(feature = "hyphenation")]
        if let Some(hyphenator) = self.hyphenator {
            document.set_hyphenator(hyphenator);
        }

        document
    }
}

struct FooterBand {
    height: Mm,
    factory: PageElementFactory,
}

struct ReportPageDecorator {
    page: usize,
    margins: Option<Margins>,
    header: Option<PageElementFactory>,
    header_gap: Mm,
    footer: Option<FooterBand>,
}

impl ReportPageDecorator {
    /// Draws the header and moves the body below it.
    fn render_header(&self, context: &Context, area: &mut Area<'_>, style: Style) -> Result<(), Error> {
        let Some(header) = &self.header else {
            return Ok(());
        };

        let rendered = header(self.page).render(context, area.clone(), style)?;
        area.add_offset(Position::new(0, rendered.size.height + self.header_gap));
        Ok(())
    }

    /// Draws the footer at the bottom of `area` and shrinks the body above it.
    fn render_footer(&self, context: &Context, area: &mut Area<'_>, style: Style) -> Result<(), Error> {
        let Some(footer) = &self.footer else {
            return Ok(());
        };

        let body_height = area.size().height;
        if footer.height > body_height {
            return Err(Error::new(
                format!("Page {} has no room left for the footer band", self.page),
                ErrorKind::InvalidData,
            ));
        }
        let body_height = body_height - footer.height;

        let mut band = area.clone();
        band.add_offset(Position::new(0, body_height));
        let rendered = (footer.factory)(self.page).render(context, band, style)?;
        if rendered.has_more {
            return Err(Error::new(
                format!("Footer of page {} overflows its band", self.page),
                ErrorKind::PageSizeExceeded,
            ));
        }

        area.set_height(body_height);
        Ok(())
    }
}

impl PageDecorator for ReportPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: Area<'a>,
        style: Style,
    ) -> Result<Area<'a>, Error> {
        self.page += 1;

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }
        self.render_header(context, &mut area, style)?;
        self.render_footer(context, &mut area, style)?;

        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use genpdf::elements::Paragraph;

    use super::DocumentBuilder;

    #[test]
    fn blank_builder_has_no_decoration() {
        let builder = DocumentBuilder::new().with_title("Notas");
        assert!(!builder.has_header());
        assert!(!builder.has_footer());
    }

    #[test]
    fn decorated_builder_keeps_header_and_footer() {
        let builder = DocumentBuilder::new()
            .with_header(|page| Paragraph::new(format!("Encabezado {page}")))
            .with_footer(8, |_| Paragraph::new("Firma"));
        assert!(builder.has_header());
        assert!(builder.has_footer());
    }
}
