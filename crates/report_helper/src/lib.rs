//! Building blocks for downloadable reports.
//!
//! Every report implements [`report::Report`]: it writes its content once
//! into a single-use buffer and hands back the finished bytes together with
//! a content type and a filename. Three variants are provided:
//!
//! - [`text::TextReport`] for semicolon-delimited CSV files,
//! - [`canvas_report::CanvasReport`] for PDFs drawn with explicit coordinates,
//! - [`document::DocumentReport`] for PDFs whose content flows through pages.
//!
//! PDF variants can number their pages as `"Página i of N"`, which requires
//! the total page count before any footer is drawn. [`http`] serves reports
//! as attachments.

pub mod buffer;
pub mod builder;
pub mod canvas;
pub mod canvas_report;
pub mod config;
pub mod document;
pub mod error;
pub mod flowables;
pub mod fonts;
pub mod http;
pub mod numbering;
pub mod report;
pub mod samples;
pub mod styles;
pub mod text;

pub use error::ReportError;
pub use report::{Report, ReportFile};
