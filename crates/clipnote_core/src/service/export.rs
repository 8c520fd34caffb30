//! Export of one note into a downloadable artifact.
//!
//! Pure transform over `(title, content, background, format)`; it never
//! touches the store. Page rasterization for PDF is left to an external
//! renderer, which consumes `print_layout`.

use crate::service::markup::strip_markup;
use crate::store::StoreError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_EXPORT_BACKGROUND: &str = "#ffffff";

static UNSAFE_FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").expect("valid filename regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Word,
    Pdf,
}

impl ExportFormat {
    /// Parses a format selector value; the empty "choose…" option yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "word" => Some(Self::Word),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Word => "doc",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Word => "application/msword",
            Self::Pdf => "application/pdf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub enum ExportError {
    /// The format needs a page renderer; hand it `print_layout` instead.
    RendererRequired(ExportFormat),
    /// Looking up the note to export failed.
    Store(StoreError),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RendererRequired(format) => write!(
                f,
                "`{}` export needs an external page renderer",
                format.extension()
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::RendererRequired(_) => None,
        }
    }
}

impl From<StoreError> for ExportError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Lowercased title with every non-alphanumeric ASCII character as `_`.
pub fn safe_filename(title: &str) -> String {
    UNSAFE_FILENAME_RE
        .replace_all(title, "_")
        .to_ascii_lowercase()
}

pub fn export_note(
    title: &str,
    content: &str,
    background_color: Option<&str>,
    format: ExportFormat,
) -> Result<ExportArtifact, ExportError> {
    let body = match format {
        ExportFormat::Text => strip_markup(content),
        ExportFormat::Word => word_document(title, content, background_color),
        ExportFormat::Pdf => return Err(ExportError::RendererRequired(format)),
    };

    Ok(ExportArtifact {
        filename: format!("{}.{}", safe_filename(title), format.extension()),
        mime_type: format.mime_type(),
        bytes: body.into_bytes(),
    })
}

/// Print-ready HTML for a PDF renderer.
pub fn print_layout(
    title: &str,
    content: &str,
    background_color: Option<&str>,
    foreground: Option<&str>,
) -> String {
    format!(
        "<div style=\"font-family: sans-serif; padding: 20px; background-color: {}; color: {};\">\
         <h1 style=\"border-bottom: 1px solid #ccc; padding-bottom: 10px;\">{}</h1>{}</div>",
        background_color.unwrap_or(DEFAULT_EXPORT_BACKGROUND),
        foreground.unwrap_or("inherit"),
        title,
        content
    )
}

fn word_document(title: &str, content: &str, background_color: Option<&str>) -> String {
    format!(
        "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
         xmlns:w='urn:schemas-microsoft-com:office:word' \
         xmlns='http://www.w3.org/TR/REC-html40'>\
         <head><meta charset='utf-8'></head>\
         <body style=\"background-color: {}; font-family: sans-serif;\">\
         <h1>{}</h1>{}</body></html>",
        background_color.unwrap_or(DEFAULT_EXPORT_BACKGROUND),
        title,
        content
    )
}

#[cfg(test)]
mod tests {
    use super::{export_note, print_layout, safe_filename, ExportError, ExportFormat};

    #[test]
    fn filenames_are_lowercased_and_sanitized() {
        assert_eq!(safe_filename("My Note: Part 2!"), "my_note__part_2_");
        assert_eq!(safe_filename("Café"), "caf_");
    }

    #[test]
    fn text_export_strips_markup() {
        let artifact =
            export_note("Trip", "<p>Pack <b>boots</b></p>", None, ExportFormat::Text).unwrap();
        assert_eq!(artifact.filename, "trip.txt");
        assert_eq!(artifact.mime_type, "text/plain");
        assert_eq!(artifact.bytes, b"Pack boots");
    }

    #[test]
    fn text_export_keeps_plain_comparisons() {
        let artifact = export_note("Math", "3 < 5 and 7 > 2", None, ExportFormat::Text).unwrap();
        assert_eq!(artifact.bytes, b"3 < 5 and 7 > 2");
    }

    #[test]
    fn word_export_embeds_title_and_background() {
        let artifact =
            export_note("Trip", "<p>boots</p>", Some("#fde68a"), ExportFormat::Word).unwrap();
        let html = String::from_utf8(artifact.bytes).unwrap();
        assert_eq!(artifact.filename, "trip.doc");
        assert!(html.contains("background-color: #fde68a"));
        assert!(html.contains("<h1>Trip</h1><p>boots</p>"));
    }

    #[test]
    fn pdf_export_defers_to_renderer() {
        let err = export_note("Trip", "x", None, ExportFormat::Pdf).unwrap_err();
        assert!(matches!(err, ExportError::RendererRequired(ExportFormat::Pdf)));

        let layout = print_layout("Trip", "x", None, Some("#1f2937"));
        assert!(layout.contains("background-color: #ffffff"));
        assert!(layout.contains("color: #1f2937"));
    }

    #[test]
    fn selector_values_map_to_formats() {
        assert_eq!(ExportFormat::parse("word"), Some(ExportFormat::Word));
        assert_eq!(ExportFormat::parse(""), None);
    }
}
