//! Font discovery for flowing documents.
//!
//! `genpdf` needs TrueType files for layout. The search order is:
//!
//! 1. `$REPORT_HELPER_FONTS_DIR`
//! 2. `assets/fonts` next to the running executable
//! 3. `assets/fonts` inside this crate
//!
//! Each directory must contain the four Roboto styles. When none does, the
//! Liberation Sans family installed by most Linux distributions is used
//! instead (`$REPORT_HELPER_SYSTEM_FONTS_DIR` overrides its location).

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

use crate::error::ReportError;

const FONTS_DIR_ENV: &str = "REPORT_HELPER_FONTS_DIR";
const SYSTEM_FONTS_DIR_ENV: &str = "REPORT_HELPER_SYSTEM_FONTS_DIR";

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

const FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

const FALLBACK_FAMILY_NAME: &str = "LiberationSans";

const SYSTEM_FONT_DIRECTORIES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/liberation",
];

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        candidates.push(path);
    }

    if let Some(bin_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(bin_dir.join("assets/fonts"));
    }

    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));
    candidates.dedup();
    candidates
}

fn has_family(directory: &Path, family: &str) -> bool {
    ["Regular", "Bold", "Italic", "BoldItalic"]
        .iter()
        .all(|style| directory.join(format!("{family}-{style}.ttf")).is_file())
}

fn resolve_font_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        if has_family(&candidate, DEFAULT_FONT_FAMILY_NAME) {
            return Ok(candidate);
        }

        let missing = FONT_FILES
            .iter()
            .filter(|name| !candidate.join(name).is_file())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        attempts.push(format!("{} (missing {})", candidate.display(), missing));
    }

    Err(Error::new(
        format!(
            "Unable to locate the {} font family. Checked: {}. Set {} to a directory containing {}.",
            DEFAULT_FONT_FAMILY_NAME,
            attempts.join(", "),
            FONTS_DIR_ENV,
            FONT_FILES.join(", ")
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn system_font_directory() -> Option<PathBuf> {
    if let Some(path) = env_path(SYSTEM_FONTS_DIR_ENV) {
        return Some(path);
    }

    SYSTEM_FONT_DIRECTORIES
        .iter()
        .map(PathBuf::from)
        .find(|directory| has_family(directory, FALLBACK_FAMILY_NAME))
}

fn load_family(directory: &Path, family: &str) -> Result<FontFamily<FontData>, Error> {
    fonts::from_files(directory, family, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                family,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Loads the Roboto family, falling back to Liberation Sans when Roboto is missing.
pub fn default_font_family() -> Result<FontFamily<FontData>, ReportError> {
    let bundled = resolve_font_directory()
        .and_then(|directory| load_family(&directory, DEFAULT_FONT_FAMILY_NAME));

    match bundled {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => {
            let Some(directory) = system_font_directory() else {
                warn!("{err}; no system fallback font family found");
                return Err(ReportError::FontLoad(err));
            };

            match load_family(&directory, FALLBACK_FAMILY_NAME) {
                Ok(family) => {
                    warn!(
                        "{} fonts unavailable; using '{}' from {}",
                        DEFAULT_FONT_FAMILY_NAME,
                        FALLBACK_FAMILY_NAME,
                        directory.display()
                    );
                    Ok(family)
                }
                Err(fallback_err) => {
                    debug!("Fallback font load failed after: {err}");
                    Err(ReportError::FontLoad(fallback_err))
                }
            }
        }
        Err(err) => Err(ReportError::FontLoad(err)),
    }
}

/// Indicates whether [`default_font_family`] can find any usable family.
pub fn fonts_available() -> bool {
    resolve_font_directory().is_ok() || system_font_directory().is_some()
}
