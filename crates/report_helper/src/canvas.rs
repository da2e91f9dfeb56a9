//! Coordinate-based drawing surface with optional deferred page numbering.
//!
//! A [`Canvas`] records drawing operations for the page being drawn into a
//! [`PageState`]. When the page is shown, the state is either committed to
//! the [`PageSink`] immediately or, for numbered canvases, captured and kept
//! until [`Canvas::save`]. Only then is the page count known, so every
//! captured page is replayed with a `"Página i of N"` footer before being
//! committed.
//!
//! Coordinates are millimetres measured from the bottom-left corner of the
//! page, as in PDF user space.

use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::mem;

use log::debug;
use printpdf::{IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, Point};

use crate::config::PageSize;
use crate::error::ReportError;
use crate::numbering::PageNumberFooter;

const DEFAULT_FONT_SIZE: u8 = 12;
const DEFAULT_LINE_WIDTH: f64 = 1.0;
const LAYER_NAME: &str = "Layer 1";

/// Base-14 fonts available without embedding font files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Font {
    #[default]
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    Courier,
    CourierBold,
}

impl Font {
    fn builtin(self) -> printpdf::BuiltinFont {
        use printpdf::BuiltinFont;

        match self {
            Self::Helvetica => BuiltinFont::Helvetica,
            Self::HelveticaBold => BuiltinFont::HelveticaBold,
            Self::HelveticaOblique => BuiltinFont::HelveticaOblique,
            Self::HelveticaBoldOblique => BuiltinFont::HelveticaBoldOblique,
            Self::TimesRoman => BuiltinFont::TimesRoman,
            Self::TimesBold => BuiltinFont::TimesBold,
            Self::TimesItalic => BuiltinFont::TimesItalic,
            Self::Courier => BuiltinFont::Courier,
            Self::CourierBold => BuiltinFont::CourierBold,
        }
    }
}

/// RGB colour with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Builds a colour from 8-bit channels.
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
        )
    }

    fn to_printpdf(self) -> printpdf::Color {
        printpdf::Color::Rgb(printpdf::Rgb::new(self.r, self.g, self.b, None))
    }
}

/// Drawing parameters applied to newly recorded operations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphicsState {
    pub font: Font,
    pub font_size: u8,
    pub fill_color: Rgb,
    pub stroke_color: Rgb,
    pub line_width: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            font: Font::default(),
            font_size: DEFAULT_FONT_SIZE,
            fill_color: Rgb::BLACK,
            stroke_color: Rgb::BLACK,
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

/// A single recorded drawing operation with its graphics state resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text {
        x: f64,
        y: f64,
        text: String,
        font: Font,
        font_size: u8,
        color: Rgb,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Rgb,
        width: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Rgb>,
        stroke: Option<(Rgb, f64)>,
    },
}

/// Snapshot of everything drawn on one page.
#[derive(Clone, Debug, PartialEq)]
pub struct PageState {
    number: usize,
    size: PageSize,
    ops: Vec<DrawOp>,
}

impl PageState {
    fn new(number: usize, size: PageSize) -> Self {
        Self {
            number,
            size,
            ops: Vec::new(),
        }
    }

    /// 1-based position of the page in the document.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn is_blank(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterates over the strings drawn on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Destination of finished pages.
pub trait PageSink {
    /// Commits a finished page to the output.
    fn commit_page(&mut self, page: &PageState) -> Result<(), ReportError>;

    /// Finishes the output and returns the encoded bytes.
    fn finish(self) -> Result<Vec<u8>, ReportError>
    where
        Self: Sized;
}

/// Writes committed pages into a PDF document through `printpdf`.
pub struct PdfSink {
    document: PdfDocumentReference,
    fonts: HashMap<Font, IndirectFontRef>,
    pages: usize,
}

impl PdfSink {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            document: PdfDocument::empty(title),
            fonts: HashMap::new(),
            pages: 0,
        }
    }

    fn font(&mut self, font: Font) -> Result<IndirectFontRef, ReportError> {
        if let Some(font_ref) = self.fonts.get(&font) {
            return Ok(font_ref.clone());
        }

        let font_ref = self
            .document
            .add_builtin_font(font.builtin())
            .map_err(ReportError::canvas)?;
        self.fonts.insert(font, font_ref.clone());
        Ok(font_ref)
    }
}

impl PageSink for PdfSink {
    fn commit_page(&mut self, page: &PageState) -> Result<(), ReportError> {
        let size = page.size();
        let (page_index, layer_index) =
            self.document
                .add_page(Mm(size.width_mm), Mm(size.height_mm), LAYER_NAME);
        let layer = self.document.get_page(page_index).get_layer(layer_index);

        for op in page.ops() {
            match op {
                DrawOp::Text {
                    x,
                    y,
                    text,
                    font,
                    font_size,
                    color,
                } => {
                    let font_ref = self.font(*font)?;
                    layer.set_fill_color(color.to_printpdf());
                    layer.use_text(text.as_str(), (*font_size).into(), Mm(*x), Mm(*y), &font_ref);
                }
                DrawOp::Line {
                    from,
                    to,
                    color,
                    width,
                } => {
                    layer.set_outline_color(color.to_printpdf());
                    layer.set_outline_thickness(*width);
                    layer.add_shape(Line {
                        points: vec![
                            (Point::new(Mm(from.0), Mm(from.1)), false),
                            (Point::new(Mm(to.0), Mm(to.1)), false),
                        ],
                        is_closed: false,
                        has_fill: false,
                        has_stroke: true,
                        is_clipping_path: false,
                    });
                }
                DrawOp::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                } => {
                    if let Some(color) = fill {
                        layer.set_fill_color(color.to_printpdf());
                    }
                    if let Some((color, line_width)) = stroke {
                        layer.set_outline_color(color.to_printpdf());
                        layer.set_outline_thickness(*line_width);
                    }
                    layer.add_shape(Line {
                        points: vec![
                            (Point::new(Mm(*x), Mm(*y)), false),
                            (Point::new(Mm(x + width), Mm(*y)), false),
                            (Point::new(Mm(x + width), Mm(y + height)), false),
                            (Point::new(Mm(*x), Mm(y + height)), false),
                        ],
                        is_closed: true,
                        has_fill: fill.is_some(),
                        has_stroke: stroke.is_some(),
                        is_clipping_path: false,
                    });
                }
            }
        }

        self.pages += 1;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        let mut bytes = Vec::new();
        {
            let mut writer = BufWriter::new(&mut bytes);
            self.document
                .save(&mut writer)
                .map_err(ReportError::canvas)?;
            writer.flush()?;
        }
        debug!("Saved canvas document with {} page(s)", self.pages);
        Ok(bytes)
    }
}

/// Captured pages of a numbered canvas, waiting for the final page count.
#[derive(Debug)]
struct DeferredPages {
    footer: PageNumberFooter,
    saved_page_states: Vec<PageState>,
}

/// Low-level drawing surface.
pub struct Canvas<S: PageSink = PdfSink> {
    sink: S,
    page_size: PageSize,
    state: GraphicsState,
    state_stack: Vec<GraphicsState>,
    current: PageState,
    deferred: Option<DeferredPages>,
}

impl Canvas<PdfSink> {
    /// Creates a canvas writing a PDF with the given document title.
    pub fn pdf(title: impl Into<String>, page_size: PageSize) -> Self {
        Self::new(PdfSink::new(title), page_size)
    }
}

impl<S: PageSink> Canvas<S> {
    /// Creates a canvas that commits every page as soon as it is shown.
    pub fn new(sink: S, page_size: PageSize) -> Self {
        Self {
            sink,
            page_size,
            state: GraphicsState::default(),
            state_stack: Vec::new(),
            current: PageState::new(1, page_size),
            deferred: None,
        }
    }

    /// Creates a canvas that defers every page until [`Canvas::save`] and
    /// stamps it with a `"Página i of N"` footer.
    pub fn numbered(sink: S, page_size: PageSize, footer: PageNumberFooter) -> Self {
        let mut canvas = Self::new(sink, page_size);
        canvas.deferred = Some(DeferredPages {
            footer,
            saved_page_states: Vec::new(),
        });
        canvas
    }

    pub fn is_numbered(&self) -> bool {
        self.deferred.is_some()
    }

    /// 1-based number of the page currently being drawn.
    pub fn page_number(&self) -> usize {
        self.current.number
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// The page currently being drawn.
    pub fn current_page(&self) -> &PageState {
        &self.current
    }

    pub fn graphics_state(&self) -> GraphicsState {
        self.state
    }

    pub fn set_font(&mut self, font: Font, size: u8) {
        self.state.font = font;
        self.state.font_size = size;
    }

    pub fn set_fill_color(&mut self, color: Rgb) {
        self.state.fill_color = color;
    }

    pub fn set_stroke_color(&mut self, color: Rgb) {
        self.state.stroke_color = color;
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    /// Pushes the current graphics state.
    pub fn save_state(&mut self) {
        self.state_stack.push(self.state);
    }

    /// Pops the graphics state saved by the matching [`Canvas::save_state`].
    pub fn restore_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }

    /// Draws a string with its baseline starting at `(x, y)`.
    pub fn draw_string(&mut self, x: f64, y: f64, text: impl Into<String>) {
        self.current.ops.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            font: self.state.font,
            font_size: self.state.font_size,
            color: self.state.fill_color,
        });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.current.ops.push(DrawOp::Line {
            from: (x1, y1),
            to: (x2, y2),
            color: self.state.stroke_color,
            width: self.state.line_width,
        });
    }

    /// Draws a rectangle with its lower-left corner at `(x, y)`.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, stroke: bool, fill: bool) {
        self.current.ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill: fill.then_some(self.state.fill_color),
            stroke: stroke.then_some((self.state.stroke_color, self.state.line_width)),
        });
    }

    /// Ends the current page and starts a fresh one.
    ///
    /// Numbered canvases capture the finished page instead of committing it.
    pub fn show_page(&mut self) -> Result<(), ReportError> {
        let next = PageState::new(self.current.number + 1, self.page_size);
        let page = mem::replace(&mut self.current, next);
        self.state = GraphicsState::default();
        self.state_stack.clear();

        match self.deferred.as_mut() {
            Some(deferred) => {
                deferred.saved_page_states.push(page);
                Ok(())
            }
            None => self.sink.commit_page(&page),
        }
    }

    /// Finishes the document and returns the bytes produced by the sink.
    ///
    /// A current page with drawings is shown first. For numbered canvases the
    /// captured pages are replayed in order, each receiving its footer.
    pub fn save(mut self) -> Result<Vec<u8>, ReportError> {
        if !self.current.is_blank() {
            self.show_page()?;
        }

        if let Some(deferred) = self.deferred.take() {
            let total = deferred.saved_page_states.len();
            debug!("Numbering {} deferred page(s)", total);
            for (index, mut page) in deferred.saved_page_states.into_iter().enumerate() {
                debug_assert_eq!(page.number, index + 1);
                page.ops.push(deferred.footer.draw_op(index + 1, total));
                self.sink.commit_page(&page)?;
            }
        }

        self.sink.finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{Canvas, DrawOp, Font, PageSink, PageState, PdfSink, Rgb};
    use crate::config::PageSize;
    use crate::error::ReportError;
    use crate::numbering::{page_label, PageNumberFooter};

    /// Keeps committed pages in memory.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) pages: Vec<PageState>,
    }

    impl PageSink for RecordingSink {
        fn commit_page(&mut self, page: &PageState) -> Result<(), ReportError> {
            self.pages.push(page.clone());
            Ok(())
        }

        fn finish(self) -> Result<Vec<u8>, ReportError> {
            Ok(self
                .pages
                .iter()
                .flat_map(|page| page.texts().map(str::to_owned).collect::<Vec<_>>())
                .collect::<Vec<_>>()
                .join("\n")
                .into_bytes())
        }
    }

    /// Sink that exposes the committed pages through a shared handle.
    struct SharedSink(Rc<RefCell<Vec<PageState>>>);

    impl PageSink for SharedSink {
        fn commit_page(&mut self, page: &PageState) -> Result<(), ReportError> {
            self.0.borrow_mut().push(page.clone());
            Ok(())
        }

        fn finish(self) -> Result<Vec<u8>, ReportError> {
            Ok(Vec::new())
        }
    }

    fn shared() -> (SharedSink, Rc<RefCell<Vec<PageState>>>) {
        let pages = Rc::new(RefCell::new(Vec::new()));
        (SharedSink(Rc::clone(&pages)), pages)
    }

    fn draw_pages<S: PageSink>(canvas: &mut Canvas<S>, count: usize) {
        for page in 1..=count {
            canvas.draw_string(20.0, 250.0, format!("body {page}"));
            canvas.show_page().unwrap();
        }
    }

    #[test]
    fn numbered_canvas_emits_one_footer_per_page() {
        let (sink, pages) = shared();
        let mut canvas = Canvas::numbered(sink, PageSize::LETTER, PageNumberFooter::default());
        draw_pages(&mut canvas, 3);

        assert!(pages.borrow().is_empty(), "pages must wait for save");
        canvas.save().unwrap();

        let pages = pages.borrow();
        assert_eq!(pages.len(), 3);
        for (index, page) in pages.iter().enumerate() {
            let texts: Vec<_> = page.texts().collect();
            assert_eq!(page.number(), index + 1);
            assert_eq!(texts, vec![format!("body {}", index + 1), page_label(index + 1, 3)]);
        }
    }

    #[test]
    fn footer_reads_pagina_of_total() {
        let (sink, pages) = shared();
        let mut canvas = Canvas::numbered(sink, PageSize::A4, PageNumberFooter::default());
        draw_pages(&mut canvas, 2);
        canvas.save().unwrap();

        let pages = pages.borrow();
        assert_eq!(pages[0].texts().last(), Some("Página 1 of 2"));
        assert_eq!(pages[1].texts().last(), Some("Página 2 of 2"));
    }

    #[test]
    fn footer_uses_configured_origin() {
        let footer = PageNumberFooter::new(15.0, 12.5).with_font_size(8);
        let (sink, pages) = shared();
        let mut canvas = Canvas::numbered(sink, PageSize::LETTER, footer);
        draw_pages(&mut canvas, 1);
        canvas.save().unwrap();

        let pages = pages.borrow();
        match pages[0].ops().last() {
            Some(DrawOp::Text {
                x,
                y,
                font,
                font_size,
                ..
            }) => {
                assert_eq!((*x, *y), (15.0, 12.5));
                assert_eq!(*font, Font::Helvetica);
                assert_eq!(*font_size, 8);
            }
            other => panic!("expected footer text, got {other:?}"),
        }
    }

    #[test]
    fn zero_page_document_commits_nothing() {
        let (sink, pages) = shared();
        let canvas = Canvas::numbered(sink, PageSize::LETTER, PageNumberFooter::default());
        canvas.save().unwrap();
        assert!(pages.borrow().is_empty());

        let canvas = Canvas::new(RecordingSink::default(), PageSize::LETTER);
        assert!(canvas.save().unwrap().is_empty());
    }

    #[test]
    fn immediate_canvas_commits_on_show_page() {
        let (sink, pages) = shared();
        let mut canvas = Canvas::new(sink, PageSize::LETTER);
        canvas.draw_string(10.0, 10.0, "first");
        canvas.show_page().unwrap();
        assert_eq!(pages.borrow().len(), 1);
        assert_eq!(canvas.page_number(), 2);

        canvas.draw_string(10.0, 10.0, "second");
        canvas.save().unwrap();

        let pages = pages.borrow();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].texts().collect::<Vec<_>>(), vec!["second"]);
        assert!(pages.iter().all(|page| !page.texts().any(|t| t.starts_with("Página"))));
    }

    #[test]
    fn save_flushes_pending_page_into_numbering() {
        let (sink, pages) = shared();
        let mut canvas = Canvas::numbered(sink, PageSize::LETTER, PageNumberFooter::default());
        draw_pages(&mut canvas, 1);
        canvas.draw_string(10.0, 10.0, "tail");
        canvas.save().unwrap();

        let pages = pages.borrow();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].texts().last(), Some("Página 2 of 2"));
    }

    #[test]
    fn restore_state_returns_previous_drawing_parameters() {
        let mut canvas = Canvas::new(RecordingSink::default(), PageSize::LETTER);
        canvas.set_font(Font::TimesBold, 18);
        canvas.save_state();
        canvas.set_font(Font::Courier, 8);
        canvas.set_fill_color(Rgb::from_u8(255, 0, 0));
        canvas.restore_state();

        let state = canvas.graphics_state();
        assert_eq!(state.font, Font::TimesBold);
        assert_eq!(state.font_size, 18);
        assert_eq!(state.fill_color, Rgb::BLACK);
    }

    #[test]
    fn show_page_resets_graphics_state() {
        let mut canvas = Canvas::new(RecordingSink::default(), PageSize::LETTER);
        canvas.set_line_width(3.0);
        canvas.line(0.0, 0.0, 10.0, 10.0);
        canvas.show_page().unwrap();
        assert_eq!(canvas.graphics_state().line_width, 1.0);
        assert!(canvas.current_page().is_blank());
    }

    #[test]
    fn pdf_sink_writes_every_committed_page() {
        let mut canvas = Canvas::numbered(
            PdfSink::new("numbered"),
            PageSize::LETTER,
            PageNumberFooter::default(),
        );
        draw_pages(&mut canvas, 3);
        canvas.rect(20.0, 20.0, 50.0, 10.0, true, false);
        let bytes = canvas.save().unwrap();

        let document = lopdf::Document::load_mem(&bytes).expect("parse canvas pdf");
        assert_eq!(document.get_pages().len(), 4);
    }
}
