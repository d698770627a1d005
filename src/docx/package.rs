use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Error;

const DEFAULT_MAIN_PART: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// An opened DOCX package: the original archive bytes plus the editable XML
/// text of the main document part. Every other entry is copied through
/// untouched on save.
pub struct Package {
    bytes: Vec<u8>,
    main_part: String,
    xml: String,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
                std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
            ),
            _ => Error::Io(e),
        })?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Error> {
        let mut zip = ZipArchive::new(Cursor::new(bytes.as_slice()))
            .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;

        let main_part = read_zip_text(&mut zip, "_rels/.rels")
            .and_then(|rels| main_part_target(&rels))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        let mut raw = Vec::new();
        zip.by_name(&main_part)
            .map_err(|_| {
                Error::InvalidDocx(format!("missing {main_part} (is this a DOCX file?)"))
            })?
            .read_to_end(&mut raw)?;
        let mut xml = String::from_utf8(raw)
            .map_err(|_| Error::InvalidDocx(format!("{main_part} is not UTF-8")))?;
        if xml.starts_with('\u{feff}') {
            xml.remove(0);
        }

        drop(zip);
        Ok(Self {
            bytes,
            main_part,
            xml,
        })
    }

    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn set_xml(&mut self, xml: String) {
        self.xml = xml;
    }

    /// Re-encode the archive, preserving entry order. Entries other than the
    /// main part are raw-copied without recompression.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut zip = ZipArchive::new(Cursor::new(self.bytes.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(self.bytes.len())));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..zip.len() {
            let entry = zip.by_index_raw(i)?;
            if entry.name() == self.main_part {
                drop(entry);
                writer.start_file(self.main_part.as_str(), options)?;
                writer.write_all(self.xml.as_bytes())?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Write the package over `path`. The archive is fully written to a
    /// sibling temp file first and then renamed into place, so a failure
    /// leaves the original file intact.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let bytes = self.to_bytes()?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        // Named so a concurrent discovery pass would exclude it.
        let mut tmp = tempfile::Builder::new()
            .prefix("~")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        if let Ok(meta) = std::fs::metadata(path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

fn read_zip_text<R: Read + std::io::Seek>(zip: &mut ZipArchive<R>, name: &str) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Resolve the officeDocument relationship target from `_rels/.rels`.
fn main_part_target(rels_xml: &str) -> Option<String> {
    let xml = roxmltree::Document::parse(rels_xml).ok()?;
    xml.root_element()
        .children()
        .filter(|n| n.tag_name().name() == "Relationship")
        .find(|n| {
            n.attribute("Type")
                .is_some_and(|t| t.ends_with(OFFICE_DOCUMENT_REL))
        })
        .and_then(|n| n.attribute("Target"))
        .map(|target| target.trim_start_matches('/').to_string())
}
