// src/importer/docx.rs

//! Minimal reader for WordprocessingML (.docx) containers.
//!
//! Exposes exactly what the importer consumes: body-level paragraphs as plain
//! text, body-level tables as rows of cell text, and the embedded image
//! relationships with their raw bytes.

use std::io::{Cursor, Read};
use std::mem;

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use thiserror::Error;
use zip::{ZipArchive, result::ZipError};

const DOCUMENT_PART: &str = "word/document.xml";
const RELATIONSHIPS_PART: &str = "word/_rels/document.xml.rels";
const IMAGE_RELATIONSHIP_SUFFIX: &str = "/image";

/// Upper bound on the decompressed size of any single part.
pub const MAX_PART_BYTES: u64 = 64 * 1024 * 1024;

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("not a .docx container: {0}")]
    Container(#[from] ZipError),

    #[error("missing part '{0}'")]
    MissingPart(&'static str),

    #[error("part '{part}' expands beyond {limit} bytes")]
    PartTooLarge { part: String, limit: u64 },

    #[error("failed to read '{part}': {source}")]
    Read {
        part: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in '{part}': {source}")]
    Xml {
        part: &'static str,
        #[source]
        source: quick_xml::Error,
    },
}

/// A parsed document.
#[derive(Debug, Clone, Default)]
pub struct DocxDocument {
    /// Top-level paragraphs in document order. Paragraphs inside tables are not included.
    pub paragraphs: Vec<String>,
    pub tables: Vec<Table>,
    /// Image relationships in the order they appear in the relationships part.
    pub images: Vec<EmbeddedImage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub relationship_id: String,
    pub part_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl DocxDocument {
    pub fn open(bytes: &[u8]) -> Result<Self, DocxError> {
        Self::open_with_limit(bytes, MAX_PART_BYTES)
    }

    /// Like `open`, failing with `PartTooLarge` once any part decompresses past `max_part_bytes`.
    pub fn open_with_limit(bytes: &[u8], max_part_bytes: u64) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let document_xml = read_text_part(&mut archive, DOCUMENT_PART, max_part_bytes)?
            .ok_or(DocxError::MissingPart(DOCUMENT_PART))?;
        let (paragraphs, tables) = parse_body(&document_xml).map_err(|source| DocxError::Xml {
            part: DOCUMENT_PART,
            source,
        })?;

        let images = match read_text_part(&mut archive, RELATIONSHIPS_PART, max_part_bytes)? {
            Some(rels_xml) => {
                let relationships =
                    parse_image_relationships(&rels_xml).map_err(|source| DocxError::Xml {
                        part: RELATIONSHIPS_PART,
                        source,
                    })?;
                load_images(&mut archive, relationships, max_part_bytes)?
            }
            None => Vec::new(),
        };

        Ok(Self {
            paragraphs,
            tables,
            images,
        })
    }
}

fn read_text_part(
    archive: &mut Archive<'_>,
    name: &str,
    limit: u64,
) -> Result<Option<String>, DocxError> {
    let Some(bytes) = read_binary_part(archive, name, limit)? else {
        return Ok(None);
    };
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| DocxError::Read {
            part: name.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
}

/// Reads one part, never buffering more than `limit` bytes. The declared size is
/// checked first; the read itself is capped since that header can lie.
fn read_binary_part(
    archive: &mut Archive<'_>,
    name: &str,
    limit: u64,
) -> Result<Option<Vec<u8>>, DocxError> {
    let file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let too_large = || DocxError::PartTooLarge {
        part: name.to_string(),
        limit,
    };
    if file.size() > limit {
        return Err(too_large());
    }

    let mut bytes = Vec::new();
    file.take(limit + 1)
        .read_to_end(&mut bytes)
        .map_err(|source| DocxError::Read {
            part: name.to_string(),
            source,
        })?;
    if bytes.len() as u64 > limit {
        return Err(too_large());
    }
    Ok(Some(bytes))
}

/// Walks `w:body`, collecting top-level paragraphs and top-level tables.
/// Nested tables are flattened into the text of the enclosing cell;
/// text box content is skipped.
fn parse_body(xml: &str) -> Result<(Vec<String>, Vec<Table>), quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut walker = BodyWalker::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => walker.open(e.name().as_ref()),
            Event::Empty(e) => walker.empty(e.name().as_ref()),
            Event::End(e) => walker.close(e.name().as_ref()),
            Event::Text(t) if walker.collects_text() => walker.paragraph.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((walker.paragraphs, walker.tables))
}

#[derive(Default)]
struct BodyWalker {
    paragraphs: Vec<String>,
    tables: Vec<Table>,
    rows: Vec<Vec<String>>,
    cells: Vec<String>,
    cell_paragraphs: Vec<String>,
    paragraph: String,
    table_depth: usize,
    text_box_depth: usize,
    in_run: bool,
    in_text: bool,
}

impl BodyWalker {
    fn collects_text(&self) -> bool {
        self.in_text && self.text_box_depth == 0
    }

    fn open(&mut self, name: &[u8]) {
        if name == b"w:txbxContent" {
            self.text_box_depth += 1;
            return;
        }
        if self.text_box_depth > 0 {
            return;
        }
        match name {
            b"w:tbl" => self.table_depth += 1,
            b"w:tr" if self.table_depth == 1 => self.cells.clear(),
            b"w:tc" if self.table_depth == 1 => self.cell_paragraphs.clear(),
            b"w:p" => self.paragraph.clear(),
            b"w:r" => self.in_run = true,
            b"w:t" => self.in_text = true,
            _ => {}
        }
    }

    fn empty(&mut self, name: &[u8]) {
        if self.text_box_depth > 0 {
            return;
        }
        match name {
            b"w:p" => {
                self.paragraph.clear();
                self.end_paragraph();
            }
            b"w:tab" if self.in_run => self.paragraph.push('\t'),
            b"w:br" | b"w:cr" if self.in_run => self.paragraph.push('\n'),
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        if name == b"w:txbxContent" {
            self.text_box_depth = self.text_box_depth.saturating_sub(1);
            return;
        }
        if self.text_box_depth > 0 {
            return;
        }
        match name {
            b"w:t" => self.in_text = false,
            b"w:r" => self.in_run = false,
            b"w:p" => self.end_paragraph(),
            b"w:tc" if self.table_depth == 1 => {
                let text = self.cell_paragraphs.join("\n");
                self.cells.push(text);
            }
            b"w:tr" if self.table_depth == 1 => {
                let cells = mem::take(&mut self.cells);
                self.rows.push(cells);
            }
            b"w:tbl" => {
                if self.table_depth == 1 {
                    let rows = mem::take(&mut self.rows);
                    self.tables.push(Table { rows });
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn end_paragraph(&mut self) {
        let text = mem::take(&mut self.paragraph);
        if self.table_depth == 0 {
            self.paragraphs.push(text);
        } else {
            self.cell_paragraphs.push(text);
        }
    }
}

#[derive(Debug)]
struct ImageRelationship {
    id: String,
    target: String,
}

fn parse_image_relationships(xml: &str) -> Result<Vec<ImageRelationship>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let Some(rel) = image_relationship(&e)? {
                    relationships.push(rel);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(relationships)
}

/// Returns the relationship if it points at an image stored inside the package.
/// Linked (external) images have no bytes to upload and are skipped.
fn image_relationship(e: &BytesStart<'_>) -> Result<Option<ImageRelationship>, quick_xml::Error> {
    let mut id = None;
    let mut kind = None;
    let mut target = None;
    let mut external = false;

    for attr in e.attributes().flatten() {
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"Id" => id = Some(value),
            b"Type" => kind = Some(value),
            b"Target" => target = Some(value),
            b"TargetMode" => external = value.eq_ignore_ascii_case("External"),
            _ => {}
        }
    }

    let is_image = kind.is_some_and(|k| k.ends_with(IMAGE_RELATIONSHIP_SUFFIX));
    match (id, target) {
        (Some(id), Some(target)) if is_image && !external => Ok(Some(ImageRelationship { id, target })),
        _ => Ok(None),
    }
}

fn load_images(
    archive: &mut Archive<'_>,
    relationships: Vec<ImageRelationship>,
    limit: u64,
) -> Result<Vec<EmbeddedImage>, DocxError> {
    let mut images = Vec::with_capacity(relationships.len());

    for rel in relationships {
        let part_name = resolve_part_name(&rel.target);
        match read_binary_part(archive, &part_name, limit)? {
            Some(bytes) => images.push(EmbeddedImage {
                relationship_id: rel.id,
                content_type: guess_content_type(&part_name),
                part_name,
                bytes,
            }),
            None => tracing::warn!(
                relationship = %rel.id,
                part = %part_name,
                "Image relationship points at a missing part"
            ),
        }
    }

    Ok(images)
}

/// Relationship targets are relative to `word/` unless absolute.
fn resolve_part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{}", target.trim_start_matches("./")),
    }
}

fn guess_content_type(part_name: &str) -> &'static str {
    let extension = part_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}
