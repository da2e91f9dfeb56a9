//! Semicolon-delimited text reports.

use std::io::Write;

use log::debug;

use crate::buffer::ReportBuffer;
use crate::error::ReportError;
use crate::report::{Report, CSV_CONTENT_TYPE};

/// UTF-8 byte-order mark written before the first row so spreadsheet
/// applications pick the right encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Field delimiter used by all text reports.
pub const DELIMITER: u8 = b';';

/// Row writer handed to [`TextContent::write`].
pub type RowWriter<'a> = csv::Writer<&'a mut ReportBuffer>;

/// Content of a delimited text report.
pub trait TextContent {
    /// Writes every row of the report.
    fn write(&mut self, rows: &mut RowWriter<'_>) -> Result<(), ReportError>;
}

impl<F> TextContent for F
where
    F: FnMut(&mut RowWriter<'_>) -> Result<(), ReportError>,
{
    fn write(&mut self, rows: &mut RowWriter<'_>) -> Result<(), ReportError> {
        self(rows)
    }
}

/// A `text/csv` report: BOM followed by `;`-delimited, CRLF-terminated rows.
pub struct TextReport<C> {
    filename: String,
    content: C,
    buffer: ReportBuffer,
}

impl<C: TextContent> TextReport<C> {
    /// Creates a report that writes its rows through `content`.
    pub fn new(filename: impl Into<String>, content: C) -> Self {
        Self {
            filename: filename.into(),
            content,
            buffer: ReportBuffer::new(),
        }
    }

    /// The row writer this report was created with.
    pub fn content(&self) -> &C {
        &self.content
    }
}

impl<C: TextContent> Report for TextReport<C> {
    fn content_type(&self) -> &str {
        CSV_CONTENT_TYPE
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn build(&mut self) -> Result<Vec<u8>, ReportError> {
        let mut buffer = self.buffer.take()?;
        buffer.write_all(UTF8_BOM)?;

        {
            let mut rows = csv::WriterBuilder::new()
                .delimiter(DELIMITER)
                .terminator(csv::Terminator::CRLF)
                .flexible(true)
                .from_writer(&mut buffer);
            self.content.write(&mut rows)?;
            rows.flush()?;
        }

        let bytes = buffer.close()?;
        debug!("Built text report '{}' ({} bytes)", self.filename, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::{RowWriter, TextReport, UTF8_BOM};
    use crate::error::ReportError;
    use crate::report::Report;

    fn ledger(rows: &mut RowWriter<'_>) -> Result<(), ReportError> {
        rows.write_record(["Cuenta", "Saldo"])?;
        rows.write_record(["Caja", "1.200,50"])?;
        rows.write_record(["Bancos", "84.000"])?;
        Ok(())
    }

    #[test]
    fn output_starts_with_bom_and_uses_semicolons() {
        let mut report = TextReport::new("ledger.csv", ledger);
        let bytes = report.build().expect("build csv");

        assert!(bytes.starts_with(UTF8_BOM));
        let body = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
        assert_eq!(body, "Cuenta;Saldo\r\nCaja;1.200,50\r\nBancos;84.000\r\n");
    }

    fn notes(rows: &mut RowWriter<'_>) -> Result<(), ReportError> {
        rows.write_record(["a;b", "c"])?;
        Ok(())
    }

    fn nothing(_: &mut RowWriter<'_>) -> Result<(), ReportError> {
        Ok(())
    }

    #[test]
    fn quotes_fields_containing_the_delimiter() {
        let mut report = TextReport::new("notes.csv", notes);
        let bytes = report.build().unwrap();
        assert_eq!(&bytes[UTF8_BOM.len()..], b"\"a;b\";c\r\n");
    }

    #[test]
    fn empty_report_is_only_the_bom() {
        let mut report = TextReport::new("empty.csv", nothing);
        assert_eq!(report.build().unwrap(), UTF8_BOM);
    }

    #[test]
    fn second_build_fails() {
        let mut report = TextReport::new("ledger.csv", ledger);
        report.build().unwrap();
        assert!(matches!(report.build(), Err(ReportError::AlreadyBuilt)));
    }

    #[test]
    fn declares_csv_metadata() {
        let report = TextReport::new("ledger.csv", ledger);
        assert_eq!(report.content_type(), "text/csv");
        assert_eq!(report.filename(), "ledger.csv");
    }
}
