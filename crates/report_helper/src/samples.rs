//! Sample reports over a small chart of accounts.
//!
//! Used by the command line tool and the integration tests. Each function
//! returns a fresh, unbuilt report.

use genpdf::{Alignment, Element as _};

use crate::canvas::{Canvas, Font, Rgb};
use crate::canvas_report::CanvasReport;
use crate::config::ReportSettings;
use crate::document::DocumentReport;
use crate::error::ReportError;
use crate::flowables::{data_table, Story};
use crate::report::Report;
use crate::styles::StyleSheet;
use crate::text::{RowWriter, TextReport};

pub const FIRM: &str = "Contadores Asociados S.A.S. - NIT 900.123.456-7";

const ACCOUNTS: &[(&str, &str, i64)] = &[
    ("1105", "Caja", 120_050),
    ("1110", "Bancos", 8_400_000),
    ("1305", "Clientes", 3_215_475),
    ("1435", "Mercancías no fabricadas por la empresa", 5_010_000),
    ("1524", "Equipo de oficina", 2_300_000),
    ("2205", "Proveedores nacionales", -1_940_300),
    ("2365", "Retención en la fuente", -214_500),
    ("2408", "IVA por pagar", -610_725),
    ("3115", "Aportes sociales", -10_000_000),
    ("4135", "Comercio al por mayor y al por menor", -7_860_000),
    ("5105", "Gastos de personal", 1_420_000),
    ("5135", "Servicios", 160_000),
];

const MONTHS: &[&str] = &[
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

const LINE_HEIGHT_MM: f64 = 6.0;

/// Formats an amount in cents as `1.234.567,89`.
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let digits = (cents / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{}{},{:02}", sign, grouped, cents % 100)
}

/// One row per account and month, the way a yearly ledger lists them.
fn ledger_rows() -> impl Iterator<Item = [String; 4]> {
    MONTHS.iter().flat_map(|month| {
        ACCOUNTS.iter().map(move |(code, name, balance)| {
            [
                (*month).to_owned(),
                (*code).to_owned(),
                (*name).to_owned(),
                format_amount(*balance),
            ]
        })
    })
}

fn write_ledger(rows: &mut RowWriter<'_>) -> Result<(), ReportError> {
    rows.write_record(["Mes", "Cuenta", "Nombre", "Saldo"])?;
    for row in ledger_rows() {
        rows.write_record(&row)?;
    }
    Ok(())
}

/// Yearly ledger as a semicolon-delimited text file.
pub fn ledger_csv() -> impl Report {
    TextReport::new("libro_mayor.csv", write_ledger)
}

fn draw_ledger(canvas: &mut Canvas, settings: &ReportSettings) -> Result<(), ReportError> {
    let page = settings.page_size;
    let left = settings.margins.left_mm();
    let right = page.width_mm - settings.margins.right_mm();
    let top = page.height_mm - settings.margins.top_mm();
    // Keep clear of the page-number label.
    let bottom = settings.margins.bottom_mm() + 2.0 * LINE_HEIGHT_MM;

    let heading = |canvas: &mut Canvas| {
        canvas.set_font(Font::HelveticaBold, 14);
        canvas.draw_string(left, top, "Libro mayor");
        canvas.set_stroke_color(Rgb::from_u8(40, 90, 160));
        canvas.set_line_width(0.8);
        canvas.line(left, top - 2.0, right, top - 2.0);
        canvas.set_font(Font::Helvetica, 9);
        top - 2.0 * LINE_HEIGHT_MM
    };

    let mut y = heading(canvas);
    for (index, [month, code, name, balance]) in ledger_rows().enumerate() {
        if y < bottom {
            canvas.show_page()?;
            y = heading(canvas);
        }

        if index % 2 == 0 {
            canvas.save_state();
            canvas.set_fill_color(Rgb::from_u8(235, 240, 248));
            canvas.rect(left, y - 1.5, right - left, LINE_HEIGHT_MM, false, true);
            canvas.restore_state();
        }

        canvas.draw_string(left + 1.0, y, month);
        canvas.draw_string(left + 30.0, y, code);
        canvas.draw_string(left + 48.0, y, name);
        canvas.draw_string(right - 35.0, y, balance);
        y -= LINE_HEIGHT_MM;
    }

    Ok(())
}

/// The yearly ledger drawn on a canvas, numbered `"Página i of N"`.
pub fn ledger_canvas(settings: ReportSettings) -> impl Report {
    CanvasReport::new("libro_mayor_canvas.pdf", draw_ledger)
        .with_title("Libro mayor")
        .with_settings(settings)
        .with_page_numbers(true)
}

fn write_balance(story: &mut Story, styles: &StyleSheet) -> Result<(), ReportError> {
    story.paragraph(
        "Saldos de cierre por cuenta y mes. Los valores negativos corresponden a \
         saldos de naturaleza crédito.",
        styles.body_text,
    );
    story.spacer(1.0);

    let table = data_table(
        &["Mes", "Cuenta", "Nombre", "Saldo"],
        ledger_rows(),
        styles.normal,
    )?;
    story.push(table);
    story.spacer(1.0);

    let total: i64 = ACCOUNTS.iter().map(|(_, _, balance)| balance).sum();
    story.push(
        genpdf::elements::Paragraph::new(format!("Diferencia: {}", format_amount(total)))
            .aligned(Alignment::Right)
            .styled(styles.body_text.bold()),
    );
    Ok(())
}

/// Year-end balance as a decorated flowing document.
pub fn balance_document(settings: ReportSettings) -> impl Report {
    DocumentReport::new("balance_general.pdf", write_balance)
        .with_settings(settings)
        .with_title("Balance General")
        .with_subtitle("Ejercicio 2024")
        .with_firm(FIRM)
}

fn write_notes(story: &mut Story, styles: &StyleSheet) -> Result<(), ReportError> {
    story.paragraph("Notas a los estados financieros", styles.heading1);
    for (number, (code, name, _)) in ACCOUNTS.iter().enumerate() {
        story.paragraph(format!("Nota {}. {} ({})", number + 1, name, code), styles.heading2);
        story.paragraph(
            format!(
                "La cuenta {} se presenta por su valor en libros al cierre del ejercicio.",
                code
            ),
            styles.body_text,
        );
    }
    Ok(())
}

/// Notes to the statements without header, footer or page numbers.
pub fn notes_document(settings: ReportSettings) -> impl Report {
    DocumentReport::blank("notas.pdf", write_notes).with_settings(settings)
}

/// Every sample report in the order the CLI renders them.
pub fn all(settings: ReportSettings) -> Vec<Box<dyn Report>> {
    vec![
        Box::new(ledger_csv()),
        Box::new(ledger_canvas(settings)),
        Box::new(balance_document(settings)),
        Box::new(notes_document(settings)),
    ]
}

#[cfg(test)]
mod tests {
    use super::{format_amount, ledger_csv, ledger_rows, ACCOUNTS, MONTHS};
    use crate::report::Report;

    #[test]
    fn formats_amounts_with_grouping() {
        assert_eq!(format_amount(0), "0,00");
        assert_eq!(format_amount(120_050), "1.200,50");
        assert_eq!(format_amount(8_400_000), "84.000,00");
        assert_eq!(format_amount(-1_000_000_001), "-10.000.000,01");
    }

    #[test]
    fn ledger_lists_every_account_each_month() {
        assert_eq!(ledger_rows().count(), ACCOUNTS.len() * MONTHS.len());
    }

    #[test]
    fn ledger_csv_has_header_and_rows() {
        let mut report = ledger_csv();
        let bytes = report.build().unwrap();
        let text = std::str::from_utf8(&bytes[3..]).unwrap();

        let mut lines = text.split("\r\n");
        assert_eq!(lines.next(), Some("Mes;Cuenta;Nombre;Saldo"));
        assert_eq!(lines.next(), Some("Enero;1105;Caja;1.200,50"));
        assert_eq!(text.matches("\r\n").count(), 1 + ACCOUNTS.len() * MONTHS.len());
    }
}
