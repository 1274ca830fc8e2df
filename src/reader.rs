use lopdf::{Document, Object};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Raw material for identifier extraction: the document's metadata fields
/// (keys lowercased, empty values dropped) and the text of its first pages.
#[derive(Debug, Clone, Default)]
pub struct DocumentText {
    pub metadata: HashMap<String, String>,
    pub text: String,
}

/// Capability to read metadata fields and leading text out of a document.
///
/// Implementations must not fail on corrupt or unreadable files: a document
/// that cannot be parsed yields empty results, and the resolution pipeline
/// continues with whatever the filename provides.
pub trait DocumentReader: Send + Sync {
    fn read(&self, path: &Path) -> DocumentText;
}

/// `lopdf`-backed reader extracting the Info dictionary and the text of the
/// first two pages.
pub struct PdfReader {
    max_pages: usize,
}

impl PdfReader {
    pub fn new() -> Self {
        Self { max_pages: 2 }
    }

    fn info_fields(document: &Document) -> HashMap<String, String> {
        let mut fields = HashMap::new();

        let Ok(info_object) = document.trailer.get(b"Info") else {
            return fields;
        };
        let dict = match info_object {
            Object::Reference(id) => {
                match document.get_object(*id).and_then(Object::as_dict) {
                    Ok(dict) => dict,
                    Err(_) => return fields,
                }
            }
            Object::Dictionary(dict) => dict,
            _ => return fields,
        };

        for (key, value) in dict.iter() {
            let Ok(bytes) = value.as_str() else {
                continue;
            };
            let decoded = decode_pdf_string(bytes);
            if decoded.is_empty() {
                continue;
            }
            fields.insert(String::from_utf8_lossy(key).to_lowercase(), decoded);
        }

        fields
    }

    fn leading_text(&self, document: &Document) -> String {
        let pages = document.get_pages();
        if pages.is_empty() {
            return String::new();
        }
        let page_numbers: Vec<u32> = pages.keys().copied().take(self.max_pages).collect();

        match document.extract_text(&page_numbers) {
            Ok(text) => text,
            Err(err) => {
                debug!("Text extraction failed: {err}");
                String::new()
            }
        }
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for PdfReader {
    fn read(&self, path: &Path) -> DocumentText {
        let document = match Document::load(path) {
            Ok(document) => document,
            Err(err) => {
                warn!("Failed to open {}: {err}", path.display());
                return DocumentText::default();
            }
        };

        DocumentText {
            metadata: Self::info_fields(&document),
            text: self.leading_text(&document),
        }
    }
}

/// Decode a PDF text string: UTF-16BE when the byte order mark is present,
/// otherwise treated as Latin-ish bytes via lossy UTF-8.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&utf16).trim().to_string()
    } else {
        String::from_utf8_lossy(bytes).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_string() {
        assert_eq!(decode_pdf_string(b" Hello PDF "), "Hello PDF");
    }

    #[test]
    fn test_decode_utf16be_string() {
        // BOM followed by "Hi"
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }

    #[test]
    fn test_corrupt_file_yields_empty_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_pdf.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();

        let result = PdfReader::new().read(&path);
        assert!(result.metadata.is_empty());
        assert!(result.text.is_empty());
    }

    #[test]
    fn test_missing_file_yields_empty_results() {
        let result = PdfReader::new().read(Path::new("/nonexistent/file.pdf"));
        assert!(result.metadata.is_empty());
        assert!(result.text.is_empty());
    }
}
