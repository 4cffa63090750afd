use std::io::{Cursor, Read};

use xml::reader::{EventReader, XmlEvent};
use zip::ZipArchive;

/// Extracts paragraph text from a DOCX (a zip containing
/// `word/document.xml`), joining paragraphs with newlines.
/// Returns `None` when the archive or XML is unreadable.
pub fn extract_docx_text(bytes: &[u8]) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).ok()?;
    let mut document = String::new();
    archive
        .by_name("word/document.xml")
        .ok()?
        .read_to_string(&mut document)
        .ok()?;

    let mut text = String::new();
    for event in EventReader::from_str(&document) {
        match event {
            Ok(XmlEvent::Characters(chunk)) => text.push_str(&chunk),
            // w:p closes a paragraph
            Ok(XmlEvent::EndElement { name }) if name.local_name == "p" => text.push('\n'),
            Ok(_) => {}
            Err(_) => return None,
        }
    }
    Some(text.trim_end().to_string())
}

#[cfg(test)]
pub mod tests_support {
    use std::io::Write;

    use zip::write::FileOptions;
    use zip::ZipWriter;

    /// Builds a minimal DOCX: one `word/document.xml` with the given paragraphs.
    pub fn make_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );

        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", FileOptions::default())
            .expect("start zip entry");
        writer
            .write_all(document.as_bytes())
            .expect("write zip entry");
        writer.finish().expect("finish zip").into_inner()
    }
}
