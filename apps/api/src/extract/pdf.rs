use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::debug;

/// Extracts the text layer from a PDF. Returns `None` on any parse failure.
/// The parser is panic-prone on malformed input, so panics are contained here
/// rather than crossing the extraction boundary.
pub fn extract_pdf_text(bytes: &[u8]) -> Option<String> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));
    match result {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            debug!("PDF extraction failed: {e}");
            None
        }
        Err(_) => {
            debug!("PDF parser panicked on malformed input");
            None
        }
    }
}
