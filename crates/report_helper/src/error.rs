//! Error type shared by every report variant.

use std::fmt;
use std::io;

/// Errors that can occur while writing, building or delivering a report.
#[derive(Debug)]
pub enum ReportError {
    /// `build` was called on a report whose buffer is already closed.
    AlreadyBuilt,
    /// No usable font family could be loaded for flowing documents.
    FontLoad(genpdf::error::Error),
    /// `genpdf` failed while laying out or rendering the document.
    Layout(genpdf::error::Error),
    /// `printpdf` rejected a canvas operation or failed to serialize.
    Canvas(String),
    /// The rendered PDF could not be reopened for page numbering.
    PostProcess(lopdf::Error),
    /// A CSV row could not be written.
    Csv(csv::Error),
    /// Writing to the report buffer or the output target failed.
    Io(io::Error),
    /// A configuration value could not be parsed.
    Config(String),
    /// A response header could not be encoded.
    Http(String),
}

impl ReportError {
    pub(crate) fn canvas(err: impl fmt::Display) -> Self {
        Self::Canvas(err.to_string())
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<genpdf::error::Error> for ReportError {
    fn from(err: genpdf::error::Error) -> Self {
        Self::Layout(err)
    }
}

impl From<lopdf::Error> for ReportError {
    fn from(err: lopdf::Error) -> Self {
        Self::PostProcess(err)
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<io::Error> for ReportError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyBuilt => write!(f, "Report buffer is closed; build may only run once"),
            Self::FontLoad(err) => write!(f, "Failed to load fonts for the document: {err}"),
            Self::Layout(err) => write!(f, "Failed to render the document: {err}"),
            Self::Canvas(message) => write!(f, "Canvas drawing failed: {message}"),
            Self::PostProcess(err) => write!(f, "Failed to number the rendered pages: {err}"),
            Self::Csv(err) => write!(f, "Failed to write CSV row: {err}"),
            Self::Io(err) => write!(f, "I/O error while writing the report: {err}"),
            Self::Config(message) => write!(f, "Invalid report configuration: {message}"),
            Self::Http(message) => write!(f, "Invalid HTTP response: {message}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FontLoad(err) | Self::Layout(err) => Some(err),
            Self::PostProcess(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::AlreadyBuilt | Self::Canvas(_) | Self::Config(_) | Self::Http(_) => None,
        }
    }
}
