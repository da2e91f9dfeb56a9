//! The contract shared by every downloadable report.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ReportError;

/// MIME type of delimited text reports.
pub const CSV_CONTENT_TYPE: &str = "text/csv";
/// MIME type of PDF reports.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A report produces a finished byte buffer, a content type and a filename.
///
/// Implementations run their content `write` step inside [`Report::build`]
/// and close their buffer before returning, so `build` succeeds at most once
/// per instance. Later calls fail with [`ReportError::AlreadyBuilt`].
pub trait Report {
    /// MIME type announced to HTTP clients.
    fn content_type(&self) -> &str;

    /// Name offered to the client when the report is downloaded.
    fn filename(&self) -> &str;

    /// Writes the content and returns the finished bytes.
    fn build(&mut self) -> Result<Vec<u8>, ReportError>;

    /// Builds the report and packages the bytes together with its metadata.
    fn file(&mut self) -> Result<ReportFile, ReportError> {
        let bytes = self.build()?;
        Ok(ReportFile {
            filename: self.filename().to_owned(),
            content_type: self.content_type().to_owned(),
            bytes,
        })
    }
}

impl<R: Report + ?Sized> Report for Box<R> {
    fn content_type(&self) -> &str {
        (**self).content_type()
    }

    fn filename(&self) -> &str {
        (**self).filename()
    }

    fn build(&mut self) -> Result<Vec<u8>, ReportError> {
        (**self).build()
    }
}

/// A built report ready to be stored or sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ReportFile {
    /// Writes the bytes into `directory` under the report's filename.
    pub fn save_in(&self, directory: impl AsRef<Path>) -> Result<PathBuf, ReportError> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        let path = directory.join(&self.filename);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}
