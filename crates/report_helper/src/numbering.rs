//! "Página X of N" footers.
//!
//! Numbered canvases draw the footer themselves when they replay their
//! captured pages. Flowing documents are paginated by `genpdf`, so their
//! second pass happens on the rendered bytes: [`stamp_page_numbers`] reopens
//! the PDF with `lopdf`, counts the pages and appends a small content stream
//! with the label to each of them.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use log::debug;

use crate::canvas::{DrawOp, Font, Rgb};
use crate::config::Margins;
use crate::error::ReportError;

const DEFAULT_FOOTER_FONT_SIZE: u8 = 10;
const FOOTER_FONT_RESOURCE: &str = "FPageNo";
const POINTS_PER_MM: f64 = 72.0 / 25.4;
const MAX_PAGE_TREE_DEPTH: usize = 64;

/// Footer text for page `page` of `total`.
pub fn page_label(page: usize, total: usize) -> String {
    format!("Página {page} of {total}")
}

/// Position and size of the page-number footer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageNumberFooter {
    /// Distance of the label from the left page edge, in millimetres.
    pub x_mm: f64,
    /// Distance of the baseline from the bottom page edge, in millimetres.
    pub y_mm: f64,
    pub font_size: u8,
}

impl PageNumberFooter {
    pub fn new(x_mm: f64, y_mm: f64) -> Self {
        Self {
            x_mm,
            y_mm,
            font_size: DEFAULT_FOOTER_FONT_SIZE,
        }
    }

    /// Places the label at (right margin, bottom margin).
    pub fn from_margins(margins: &Margins) -> Self {
        Self::new(margins.right_mm(), margins.bottom_mm())
    }

    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = font_size;
        self
    }

    pub(crate) fn draw_op(&self, page: usize, total: usize) -> DrawOp {
        DrawOp::Text {
            x: self.x_mm,
            y: self.y_mm,
            text: page_label(page, total),
            font: Font::Helvetica,
            font_size: self.font_size,
            color: Rgb::BLACK,
        }
    }

    fn operations(&self, page: usize, total: usize) -> Vec<Operation> {
        let x = (self.x_mm * POINTS_PER_MM).round() as i64;
        let y = (self.y_mm * POINTS_PER_MM).round() as i64;

        vec![
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(FOOTER_FONT_RESOURCE.as_bytes().to_vec()),
                    Object::Integer(i64::from(self.font_size)),
                ],
            ),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
            Operation::new(
                "Tj",
                vec![Object::string_literal(encode_win_ansi(&page_label(
                    page, total,
                )))],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]
    }
}

impl Default for PageNumberFooter {
    fn default() -> Self {
        Self::from_margins(&Margins::default())
    }
}

/// Encodes text for a WinAnsi Type1 font. Characters outside Latin-1 become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Adds a page-number footer to every page of `pdf`.
///
/// Documents without pages are returned unchanged.
pub fn stamp_page_numbers(pdf: &[u8], footer: &PageNumberFooter) -> Result<Vec<u8>, ReportError> {
    let mut document = Document::load_mem(pdf)?;
    let pages = document.get_pages();
    let total = pages.len();

    if total == 0 {
        return Ok(pdf.to_vec());
    }

    let font_id = document.add_object(footer_font());

    for (index, page_id) in pages.values().copied().enumerate() {
        let mut content = b"\n".to_vec();
        content.extend(
            Content {
                operations: footer.operations(index + 1, total),
            }
            .encode()?,
        );
        let stream_id = document.add_object(Stream::new(Dictionary::new(), content));

        let mut resources = effective_resources(&document, page_id)?;
        let mut fonts = match resources.get(b"Font") {
            Ok(fonts) => resolve_dictionary(&document, fonts)?.clone(),
            Err(_) => Dictionary::new(),
        };
        fonts.set(FOOTER_FONT_RESOURCE, Object::Reference(font_id));
        resources.set("Font", Object::Dictionary(fonts));

        let page = document.get_object_mut(page_id)?.as_dict_mut()?;
        let contents = match page.get(b"Contents").ok().cloned() {
            Some(Object::Array(mut streams)) => {
                streams.push(Object::Reference(stream_id));
                Object::Array(streams)
            }
            Some(existing @ Object::Reference(_)) => {
                Object::Array(vec![existing, Object::Reference(stream_id)])
            }
            _ => Object::Reference(stream_id),
        };
        page.set("Contents", contents);
        page.set("Resources", Object::Dictionary(resources));
    }

    let mut buffer = Vec::new();
    document.save_to(&mut buffer).map_err(ReportError::from)?;
    debug!("Stamped page numbers on {} page(s)", total);
    Ok(buffer)
}

fn footer_font() -> Dictionary {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    font
}

fn resolve_dictionary<'a>(
    document: &'a Document,
    object: &'a Object,
) -> Result<&'a Dictionary, ReportError> {
    match object {
        Object::Reference(id) => Ok(document.get_dictionary(*id)?),
        other => Ok(other.as_dict()?),
    }
}

/// Resources of a page, following inheritance through the page tree.
fn effective_resources(document: &Document, page_id: ObjectId) -> Result<Dictionary, ReportError> {
    let mut node_id = page_id;

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let node = document.get_dictionary(node_id)?;
        if let Ok(resources) = node.get(b"Resources") {
            return Ok(resolve_dictionary(document, resources)?.clone());
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => node_id = *parent,
            _ => break,
        }
    }

    Ok(Dictionary::new())
}

#[cfg(test)]
mod tests {
    use lopdf::content::Content;
    use lopdf::{Dictionary, Document, Object};

    use super::{encode_win_ansi, page_label, stamp_page_numbers, PageNumberFooter};
    use crate::canvas::Canvas;
    use crate::config::{Margins, PageSize};

    fn canvas_pdf(pages: usize) -> Vec<u8> {
        let mut canvas = Canvas::pdf("stamping", PageSize::A4);
        for page in 1..=pages {
            canvas.draw_string(20.0, 270.0, format!("Contenido {page}"));
            canvas.show_page().unwrap();
        }
        canvas.save().unwrap()
    }

    fn drawn_strings(document: &Document, page_id: lopdf::ObjectId) -> Vec<Vec<u8>> {
        let data = document.get_page_content(page_id).unwrap();
        Content::decode(&data)
            .unwrap()
            .operations
            .into_iter()
            .filter(|operation| operation.operator == "Tj")
            .filter_map(|operation| match operation.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn label_format() {
        assert_eq!(page_label(3, 7), "Página 3 of 7");
    }

    #[test]
    fn encodes_accents_as_latin1() {
        assert_eq!(encode_win_ansi("Pá"), vec![b'P', 0xE1]);
        assert_eq!(encode_win_ansi("€"), vec![b'?']);
    }

    #[test]
    fn footer_origin_follows_margins() {
        let footer = PageNumberFooter::from_margins(&Margins::new(2.0, 1.5, 3.0, 2.5));
        assert_eq!(footer.x_mm, 25.0);
        assert_eq!(footer.y_mm, 15.0);
    }

    #[test]
    fn stamps_one_label_per_page() {
        let stamped = stamp_page_numbers(&canvas_pdf(3), &PageNumberFooter::default()).unwrap();
        let document = Document::load_mem(&stamped).unwrap();
        let pages = document.get_pages();
        assert_eq!(pages.len(), 3);

        for (index, page_id) in pages.values().enumerate() {
            let strings = drawn_strings(&document, *page_id);
            let expected = encode_win_ansi(&page_label(index + 1, 3));
            let labels = strings
                .iter()
                .filter(|bytes| bytes.starts_with(&encode_win_ansi("Página")))
                .collect::<Vec<_>>();
            assert_eq!(labels, vec![&expected]);
        }
    }

    #[test]
    fn stamped_pages_reference_the_footer_font() {
        let stamped = stamp_page_numbers(&canvas_pdf(2), &PageNumberFooter::default()).unwrap();
        let document = Document::load_mem(&stamped).unwrap();

        for page_id in document.get_pages().values() {
            let page = document.get_dictionary(*page_id).unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
            assert!(fonts.has(b"FPageNo"));
        }
    }

    #[test]
    fn document_without_pages_is_unchanged() {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", Object::Integer(0));
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = document.add_object(catalog);
        document.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).unwrap();

        let stamped = stamp_page_numbers(&bytes, &PageNumberFooter::default()).unwrap();
        assert_eq!(stamped, bytes);
    }
}
