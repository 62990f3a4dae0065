use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::info;
use zip::ZipArchive;

use crate::extraction::ExtractError;
use crate::loader::{Library, LoadError};

pub const LIBRARY_NAME: &str = "DOCX";

const DOCUMENT_PART: &str = "word/document.xml";

/// Raw-text extraction from Word documents: the main document part is unzipped and
/// its text runs are flattened, one blank line after every paragraph.
pub struct DocxLibrary {
    loaded: AtomicBool,
}

impl DocxLibrary {
    pub fn new() -> Self {
        Self {
            loaded: AtomicBool::new(false),
        }
    }

    /// Raw text of the document. Unzipping and XML parsing run on the blocking pool;
    /// the inflated document part may not exceed `max_xml_bytes`.
    pub async fn extract_raw_text(
        &self,
        bytes: Bytes,
        max_xml_bytes: usize,
    ) -> Result<String, ExtractError> {
        if !self.is_loaded() {
            return Err(ExtractError::LibraryNotLoaded(LIBRARY_NAME));
        }

        tokio::task::spawn_blocking(move || raw_text_from_docx(&bytes, max_xml_bytes))
            .await
            .map_err(|e| ExtractError::Malformed(format!("DOCX parser aborted: {e}")))?
    }
}

impl Default for DocxLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Library for DocxLibrary {
    fn name(&self) -> &'static str {
        LIBRARY_NAME
    }

    async fn load(&self) -> Result<(), LoadError> {
        self.loaded.store(true, Ordering::Release);
        info!("DOCX library loaded");
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }
}

fn raw_text_from_docx(bytes: &[u8], max_xml_bytes: usize) -> Result<String, ExtractError> {
    let xml = read_document_part(bytes, max_xml_bytes)?;
    raw_text_from_xml(&xml)
}

fn read_document_part(bytes: &[u8], max_xml_bytes: usize) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Malformed(format!("Could not open DOCX: {e}")))?;

    let part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::Malformed(format!("DOCX has no {DOCUMENT_PART}: {e}")))?;
    let too_large = |size: usize| ExtractError::TooLarge {
        size,
        limit: max_xml_bytes,
    };

    let declared = usize::try_from(part.size()).unwrap_or(usize::MAX);
    if declared > max_xml_bytes {
        return Err(too_large(declared));
    }

    // The declared size can lie; the read itself is bounded too.
    let mut xml = String::new();
    part.take((max_xml_bytes as u64).saturating_add(1))
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Malformed(format!("Could not read {DOCUMENT_PART}: {e}")))?;
    if xml.len() > max_xml_bytes {
        return Err(too_large(xml.len()));
    }
    Ok(xml)
}

fn raw_text_from_xml(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_text_run = false;
    // <w:tab/> inside <w:tabs> is a tab-stop definition, not content.
    let mut in_tab_stops = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = true,
                b"w:tabs" => in_tab_stops = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:tabs" => in_tab_stops = false,
                b"w:p" => text.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" if !in_tab_stops => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:p" => text.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_run => {
                let run = e
                    .unescape()
                    .map_err(|e| ExtractError::Malformed(format!("Bad text in DOCX: {e}")))?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::Malformed(format!(
                    "DOCX XML error at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const LIMIT: usize = 1024 * 1024;

    const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    pub(crate) fn build_docx_from_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{WORD_NS}"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer
            .start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    pub(crate) fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        build_docx_from_body(&body)
    }

    fn loaded() -> DocxLibrary {
        let lib = DocxLibrary::new();
        lib.loaded.store(true, Ordering::SeqCst);
        lib
    }

    fn raw_text(bytes: &[u8]) -> Result<String, ExtractError> {
        raw_text_from_docx(bytes, LIMIT)
    }

    #[test]
    fn test_runs_in_one_paragraph_are_concatenated() {
        let bytes = build_docx_from_body(
            r#"<w:p><w:r><w:t>React</w:t></w:r><w:r><w:t xml:space="preserve">, Redux</w:t></w:r></w:p>"#,
        );
        assert_eq!(raw_text(&bytes).unwrap(), "React, Redux\n\n");
    }

    #[test]
    fn test_tabs_breaks_and_entities() {
        let bytes = build_docx_from_body(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Frontend:</w:t><w:tab/><w:t>HTML &amp; CSS</w:t><w:br/><w:t>Backend</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            raw_text(&bytes).unwrap(),
            "Frontend:\tHTML & CSS\nBackend\n\n"
        );
    }

    #[test]
    fn test_empty_paragraph_still_separates() {
        let bytes = build_docx_from_body(r#"<w:p/><w:p><w:r><w:t>Summary</w:t></w:r></w:p>"#);
        assert_eq!(raw_text(&bytes).unwrap(), "\n\nSummary\n\n");
    }

    #[test]
    fn test_non_zip_bytes_are_malformed() {
        let result = raw_text(b"plain text pretending to be docx");
        assert!(matches!(result, Err(ExtractError::Malformed(_))));
    }

    #[test]
    fn test_zip_without_document_part_is_malformed() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("notes.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hello").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        match raw_text(&bytes) {
            Err(ExtractError::Malformed(msg)) => assert!(msg.contains(DOCUMENT_PART)),
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unloaded_library_refuses() {
        let bytes = Bytes::from(build_docx(&["Jane Roe"]));
        let result = DocxLibrary::new().extract_raw_text(bytes, LIMIT).await;
        assert!(matches!(result, Err(ExtractError::LibraryNotLoaded("DOCX"))));
    }

    #[tokio::test]
    async fn test_loaded_library_extracts_off_the_runtime() {
        let bytes = Bytes::from(build_docx(&["Jane Roe", "React"]));
        let text = loaded().extract_raw_text(bytes, LIMIT).await.unwrap();
        assert_eq!(text, "Jane Roe\n\nReact\n\n");
    }

    #[test]
    fn test_inflated_document_part_is_capped() {
        // Compresses to a few KiB, inflates to several MiB.
        let filler = "A".repeat(4 * 1024 * 1024);
        let bytes = build_docx(&[filler.as_str()]);
        assert!(bytes.len() < 64 * 1024);

        match raw_text_from_docx(&bytes, 64 * 1024) {
            Err(ExtractError::TooLarge { size, limit }) => {
                assert_eq!(limit, 64 * 1024);
                assert!(size > limit);
            }
            other => panic!("expected too large, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_document_part_at_limit_is_read() {
        let bytes = build_docx(&["Jane Roe"]);
        let xml_len = read_document_part(&bytes, LIMIT).unwrap().len();
        assert_eq!(read_document_part(&bytes, xml_len).unwrap().len(), xml_len);
        assert!(matches!(
            read_document_part(&bytes, xml_len - 1),
            Err(ExtractError::TooLarge { .. })
        ));
    }
}
