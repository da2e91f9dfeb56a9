//! Page geometry and the settings shared by all PDF reports.
//!
//! Margins are configured in centimetres, the unit used by report
//! authors, and converted to millimetres when handed to the rendering
//! crates. [`ReportSettings::from_env`] lets a deployment override the
//! defaults without recompiling:
//!
//! * `REPORT_HELPER_MARGINS`: `"top,bottom,left,right"` in centimetres.
//! * `REPORT_HELPER_PAGE_SIZE`: `letter`, `a4` or `legal`, optionally
//!   suffixed with `-landscape`.

use std::env;
use std::str::FromStr;

use genpdf::{Mm, Size};

use crate::error::ReportError;

const MARGINS_ENV: &str = "REPORT_HELPER_MARGINS";
const PAGE_SIZE_ENV: &str = "REPORT_HELPER_PAGE_SIZE";
const MM_PER_CM: f64 = 10.0;
const DEFAULT_MARGIN_CM: f64 = 2.0;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Page margins in centimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margins {
    /// Creates margins from explicit centimetre values.
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Uses the same value for all four sides.
    pub fn uniform(cm: f64) -> Self {
        Self::new(cm, cm, cm, cm)
    }

    /// Top margin in millimetres.
    pub fn top_mm(&self) -> f64 {
        self.top * MM_PER_CM
    }

    /// Bottom margin in millimetres.
    pub fn bottom_mm(&self) -> f64 {
        self.bottom * MM_PER_CM
    }

    /// Left margin in millimetres.
    pub fn left_mm(&self) -> f64 {
        self.left * MM_PER_CM
    }

    /// Right margin in millimetres.
    pub fn right_mm(&self) -> f64 {
        self.right * MM_PER_CM
    }

    /// Converts the margins into the `genpdf` representation.
    pub fn to_genpdf(&self) -> genpdf::Margins {
        genpdf::Margins::trbl(
            mm_from_f64(self.top_mm()),
            mm_from_f64(self.right_mm()),
            mm_from_f64(self.bottom_mm()),
            mm_from_f64(self.left_mm()),
        )
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN_CM)
    }
}

impl FromStr for Margins {
    type Err = ReportError;

    /// Parses `"top,bottom,left,right"` in centimetres.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts = value
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<f64>()
                    .ok()
                    .filter(|cm| cm.is_finite() && *cm >= 0.0)
                    .ok_or_else(|| ReportError::config(format!("invalid margin value '{part}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [top, bottom, left, right] => Ok(Self::new(*top, *bottom, *left, *right)),
            _ => Err(ReportError::config(format!(
                "expected four margins (top,bottom,left,right), got '{value}'"
            ))),
        }
    }
}

/// Physical page dimensions in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize::new(215.9, 279.4);
    pub const A4: PageSize = PageSize::new(210.0, 297.0);
    pub const LEGAL: PageSize = PageSize::new(215.9, 355.6);

    pub const fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    /// Returns the same page turned on its side.
    pub const fn landscape(self) -> Self {
        Self::new(self.height_mm, self.width_mm)
    }

    /// Whether the page is wider than it is tall.
    pub fn is_landscape(&self) -> bool {
        self.width_mm > self.height_mm
    }

    /// Converts the page size into the `genpdf` representation.
    pub fn to_genpdf(&self) -> Size {
        Size::new(mm_from_f64(self.width_mm), mm_from_f64(self.height_mm))
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

impl FromStr for PageSize {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let (name, landscape) = match normalized.strip_suffix("-landscape") {
            Some(name) => (name, true),
            None => (normalized.as_str(), false),
        };

        let size = match name {
            "letter" => Self::LETTER,
            "a4" => Self::A4,
            "legal" => Self::LEGAL,
            other => {
                return Err(ReportError::config(format!(
                    "unknown page size '{other}' (expected letter, a4 or legal)"
                )))
            }
        };

        Ok(if landscape { size.landscape() } else { size })
    }
}

/// Geometry applied to every PDF report.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReportSettings {
    pub margins: Margins,
    pub page_size: PageSize,
}

impl ReportSettings {
    /// Settings with the given margins and page size.
    pub fn new(margins: Margins, page_size: PageSize) -> Self {
        Self { margins, page_size }
    }

    /// Replaces the margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Replaces the page size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Reads overrides from the environment, keeping defaults for unset variables.
    pub fn from_env() -> Result<Self, ReportError> {
        let mut settings = Self::default();

        if let Some(value) = non_empty_var(MARGINS_ENV) {
            settings.margins = value.parse()?;
        }

        if let Some(value) = non_empty_var(PAGE_SIZE_ENV) {
            settings.page_size = value.parse()?;
        }

        Ok(settings)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
