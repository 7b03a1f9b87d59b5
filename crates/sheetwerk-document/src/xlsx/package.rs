// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Zip container access and the small workbook-level parts: sheet list,
// relationships, shared strings.

use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use sheetwerk_core::error::{Result, SheetwerkError};
use zip::ZipArchive;
use zip::result::ZipError;

/// Largest decompressed size accepted for one part.
const MAX_PART_BYTES: u64 = 256 * 1024 * 1024;

/// Upper bound on the buffer reserved up front from the declared size.
const MAX_PREALLOC: u64 = 8 * 1024 * 1024;

/// An opened XLSX zip container.
pub(crate) struct Package<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Package<R> {
    pub(crate) fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| SheetwerkError::Spreadsheet(format!("not a zip container: {e}")))?;
        Ok(Self { archive })
    }

    /// Read a part fully. `Ok(None)` when the part does not exist.
    pub(crate) fn read_part(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        self.read_part_within(name, MAX_PART_BYTES)
    }

    /// [`Package::read_part`] with an explicit decompressed-size limit. The
    /// size in the zip header is only a hint; the limit is enforced on the
    /// bytes actually inflated.
    fn read_part_within(&mut self, name: &str, limit: u64) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(SheetwerkError::Spreadsheet(format!(
                    "cannot open part {name}: {e}"
                )));
            }
        };
        let mut data = Vec::with_capacity(file.size().min(limit).min(MAX_PREALLOC) as usize);
        (&mut file)
            .take(limit.saturating_add(1))
            .read_to_end(&mut data)
            .map_err(|e| SheetwerkError::Spreadsheet(format!("cannot read part {name}: {e}")))?;
        if data.len() as u64 > limit {
            return Err(SheetwerkError::Spreadsheet(format!(
                "part {name} inflates to more than {limit} bytes"
            )));
        }
        Ok(Some(data))
    }
}

/// A `<sheet>` entry from `xl/workbook.xml`, in workbook order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SheetEntry {
    pub name: String,
    pub relationship_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Relationship {
    pub id: String,
    pub target: String,
    /// Relationship type URI.
    pub kind: String,
}

/// Value of the attribute whose local name is `key`.
pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Value of a namespaced attribute matched by its qualified name (`r:id`).
fn qualified_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Turn a relationship target from `xl/_rels/workbook.xml.rels` into a part
/// name. Targets are either package-absolute (`/xl/worksheets/sheet1.xml`)
/// or relative to `xl/`.
pub(crate) fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else {
        let mut base = String::from("xl/");
        let mut rest = target;
        while let Some(stripped) = rest.strip_prefix("../") {
            rest = stripped;
            base.clear();
        }
        base.push_str(rest.trim_start_matches("./"));
        base
    }
}

pub(crate) fn parse_sheet_entries(xml: &[u8]) -> Result<Vec<SheetEntry>> {
    const PART: &str = "xl/workbook.xml";
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut entries = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| SheetwerkError::xml(PART, e))?
        {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr(&e, b"name").unwrap_or_default();
                let relationship_id = qualified_attr(&e, b"r:id")
                    .or_else(|| attr(&e, b"id"))
                    .unwrap_or_default();
                entries.push(SheetEntry {
                    name,
                    relationship_id,
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(entries)
}

pub(crate) fn parse_relationships(xml: &[u8], part: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| SheetwerkError::xml(part, e))?
        {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                relationships.push(Relationship {
                    id: attr(&e, b"Id").unwrap_or_default(),
                    target: attr(&e, b"Target").unwrap_or_default(),
                    kind: attr(&e, b"Type").unwrap_or_default(),
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(relationships)
}

/// Parse the shared string table. Rich-text runs are concatenated;
/// phonetic runs (`<rPh>`) are not part of the display text.
pub(crate) fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    const PART: &str = "xl/sharedStrings.xml";
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| SheetwerkError::xml(PART, e))?
        {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = !in_phonetic,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(e) if in_text => {
                let text = e.unescape().map_err(|err| SheetwerkError::xml(PART, err))?;
                if let Some(s) = current.as_mut() {
                    s.push_str(&text);
                }
            }
            Event::CData(e) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    fn archive_with(name: &str, body: &[u8]) -> Package<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(name, options).unwrap();
        writer.write_all(body).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        Package::open(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn parts_inflating_past_the_limit_are_refused() {
        let body = vec![b' '; 64 * 1024];
        let mut package = archive_with("xl/worksheets/sheet1.xml", &body);
        let err = package
            .read_part_within("xl/worksheets/sheet1.xml", 1024)
            .unwrap_err();
        assert!(matches!(err, SheetwerkError::Spreadsheet(_)));

        let whole = package
            .read_part_within("xl/worksheets/sheet1.xml", body.len() as u64)
            .unwrap();
        assert_eq!(whole.map(|d| d.len()), Some(body.len()));
        assert!(package.read_part("xl/missing.xml").unwrap().is_none());
    }

    #[test]
    fn targets_resolve_against_xl() {
        assert_eq!(resolve_target("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
        assert_eq!(resolve_target("../customXml/item1.xml"), "customXml/item1.xml");
    }

    #[test]
    fn sheet_entries_keep_workbook_order() {
        let xml = br#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets>
              <sheet name="Zeta" sheetId="2" r:id="rId2"/>
              <sheet name="Alpha &amp; Co" sheetId="1" r:id="rId1"/>
            </sheets></workbook>"#;
        let entries = parse_sheet_entries(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Zeta");
        assert_eq!(entries[0].relationship_id, "rId2");
        assert_eq!(entries[1].name, "Alpha & Co");
    }

    #[test]
    fn relationships_are_listed() {
        let xml = br#"<Relationships>
            <Relationship Id="rId1" Type="http://x/relationships/worksheet" Target="worksheets/sheet1.xml"/>
            <Relationship Id="rId3" Type="http://x/relationships/styles" Target="styles.xml"/>
            </Relationships>"#;
        let rels = parse_relationships(xml, "rels").unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[1].id, "rId3");
        assert!(rels[1].kind.ends_with("/styles"));
    }

    #[test]
    fn shared_strings_join_runs_and_skip_phonetics() {
        let xml = br#"<sst>
            <si><t>plain</t></si>
            <si><r><rPr><b/></rPr><t>bold </t></r><r><t xml:space="preserve">tail </t></r></si>
            <si><t>kanji</t><rPh sb="0" eb="1"><t>kana</t></rPh></si>
            <si/>
            </sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["plain", "bold tail ", "kanji", ""]);
    }

    #[test]
    fn malformed_xml_names_the_part() {
        let err = parse_relationships(b"<Relationships><Relationship Id=\"a></Relationships>", "xl/_rels/workbook.xml.rels")
            .unwrap_err();
        assert!(matches!(err, SheetwerkError::Xml { ref part, .. } if part == "xl/_rels/workbook.xml.rels"));
    }
}
