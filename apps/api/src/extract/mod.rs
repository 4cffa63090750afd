//! Text Extraction — PDF/DOCX bytes to plain text. This boundary fails soft:
//! any unreadable attachment becomes an empty string, never an error or panic.

use tracing::debug;

pub mod docx;
pub mod pdf;

/// Converts attachment bytes to plain text, dispatching on filename suffix.
/// Unknown suffixes and every parse failure yield an empty string.
pub fn extract_text(bytes: &[u8], filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    let text = if lower.ends_with(".pdf") {
        pdf::extract_pdf_text(bytes)
    } else if lower.ends_with(".docx") {
        docx::extract_docx_text(bytes)
    } else {
        None
    };
    match text {
        Some(t) => t,
        None => {
            debug!("Extraction produced no text for {filename}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension_is_empty() {
        assert_eq!(extract_text(b"hello", "notes.txt"), "");
        assert_eq!(extract_text(b"hello", "archive.zip"), "");
    }

    #[test]
    fn test_zero_byte_pdf_is_empty_never_panics() {
        assert_eq!(extract_text(&[], "resume.pdf"), "");
    }

    #[test]
    fn test_corrupt_pdf_is_empty_never_panics() {
        assert_eq!(extract_text(b"%PDF-1.4 garbage truncated", "resume.pdf"), "");
        assert_eq!(extract_text(&[0xFF; 64], "resume.pdf"), "");
    }

    #[test]
    fn test_corrupt_docx_is_empty_never_panics() {
        assert_eq!(extract_text(b"not a zip archive", "resume.docx"), "");
        assert_eq!(extract_text(&[], "resume.docx"), "");
    }

    #[test]
    fn test_valid_docx_round_trips_paragraphs() {
        let bytes = docx::tests_support::make_docx(&["Hello", "World"]);
        assert_eq!(extract_text(&bytes, "resume.docx"), "Hello\nWorld");
    }

    #[test]
    fn test_suffix_dispatch_is_case_insensitive() {
        let bytes = docx::tests_support::make_docx(&["Case"]);
        assert_eq!(extract_text(&bytes, "Resume.DOCX"), "Case");
    }
}
