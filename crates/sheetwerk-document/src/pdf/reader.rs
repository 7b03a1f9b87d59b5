// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open existing PDF documents and merge, split, rotate, or
// reorder their pages using the `lopdf` crate.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use sheetwerk_core::error::{Result, SheetwerkError};
use tracing::{debug, info, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Reads and rearranges the pages of an existing PDF.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Load a PDF from bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| SheetwerkError::PdfError(format!("failed to load PDF: {err}")))?;
        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Page object ids in page order.
    fn page_ids(&self) -> Vec<ObjectId> {
        self.document.get_pages().into_values().collect()
    }

    /// Concatenate several documents, in the order given.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn merge(documents: &[&[u8]]) -> Result<Vec<u8>> {
        if documents.len() < 2 {
            return Err(SheetwerkError::InvalidRequest(
                "merging needs at least two PDF files".into(),
            ));
        }
        let mut builder = PageTreeBuilder::new();
        for (index, bytes) in documents.iter().enumerate() {
            let reader = Self::from_bytes(bytes).map_err(|err| {
                SheetwerkError::PdfError(format!("document #{}: {err}", index + 1))
            })?;
            let mut copier = PageCopier::new(&reader.document);
            for page_id in reader.page_ids() {
                copier.copy_page(&mut builder, page_id)?;
            }
        }
        info!(pages = builder.page_count(), "PDFs merged");
        builder.finish()
    }

    /// One single-page document per page, in page order.
    #[instrument(skip(self))]
    pub fn split_pages(&self) -> Result<Vec<Vec<u8>>> {
        let outputs = self
            .page_ids()
            .into_iter()
            .map(|page_id| {
                let mut builder = PageTreeBuilder::new();
                PageCopier::new(&self.document).copy_page(&mut builder, page_id)?;
                builder.finish()
            })
            .collect::<Result<Vec<_>>>()?;
        info!(pages = outputs.len(), "PDF split");
        Ok(outputs)
    }

    /// Rotate the given 1-based pages (all pages when `pages` is empty) by
    /// `degrees` clockwise, on top of any existing rotation.
    #[instrument(skip(self, pages), fields(selected = pages.len()))]
    pub fn rotate(&self, degrees: i32, pages: &[u32]) -> Result<Vec<u8>> {
        if degrees % 90 != 0 {
            return Err(SheetwerkError::InvalidRequest(format!(
                "rotation must be a multiple of 90, got {degrees}"
            )));
        }
        let page_map = self.document.get_pages();
        let targets: Vec<(u32, ObjectId)> = if pages.is_empty() {
            page_map.iter().map(|(n, id)| (*n, *id)).collect()
        } else {
            pages
                .iter()
                .map(|n| {
                    page_map
                        .get(n)
                        .map(|id| (*n, *id))
                        .ok_or_else(|| out_of_range(*n, page_map.len()))
                })
                .collect::<Result<_>>()?
        };

        let mut doc = self.document.clone();
        for (number, page_id) in targets {
            let existing = doc
                .get_dictionary(page_id)
                .ok()
                .and_then(|page| inherited(&doc, page, b"Rotate"))
                .and_then(|r| r.as_i64().ok())
                .unwrap_or(0);
            let rotation = (existing + i64::from(degrees)).rem_euclid(360);
            let page = doc
                .get_dictionary_mut(page_id)
                .map_err(|err| SheetwerkError::PdfError(format!("page {number}: {err}")))?;
            page.set("Rotate", Object::Integer(rotation));
            debug!(page = number, existing, rotation, "Page rotated");
        }

        save(&mut doc)
    }

    /// Rearrange pages. `order` lists 1-based page numbers; it may repeat or
    /// omit pages. An empty order keeps the document as is.
    #[instrument(skip(self, order), fields(len = order.len()))]
    pub fn reorder(&self, order: &[u32]) -> Result<Vec<u8>> {
        let page_map = self.document.get_pages();
        let numbers: Vec<u32> = if order.is_empty() {
            page_map.keys().copied().collect()
        } else {
            order.to_vec()
        };

        let mut builder = PageTreeBuilder::new();
        let mut copier = PageCopier::new(&self.document);
        for number in numbers {
            let page_id = *page_map
                .get(&number)
                .ok_or_else(|| out_of_range(number, page_map.len()))?;
            copier.copy_page_again(&mut builder, page_id)?;
        }
        info!(pages = builder.page_count(), "PDF reordered");
        builder.finish()
    }
}

fn out_of_range(page: u32, total: usize) -> SheetwerkError {
    SheetwerkError::InvalidRequest(format!(
        "page {page} out of range (document has {total} pages)"
    ))
}

fn save(doc: &mut Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| SheetwerkError::PdfError(format!("failed to serialise PDF: {err}")))?;
    Ok(output)
}

/// Look up a page attribute on the page itself or, failing that, on its
/// nearest ancestor that sets it.
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    if let Ok(value) = page.get(key) {
        return Some(value);
    }
    let mut node = page;
    // Bounded walk; malformed trees can loop.
    for _ in 0..64 {
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
    }
    None
}

/// A fresh document with a catalog and a flat page tree.
struct PageTreeBuilder {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PageTreeBuilder {
    fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn page_count(&self) -> usize {
        self.kids.len()
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        let count = self.kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);
        save(&mut self.document)
    }
}

/// Copies pages from one source document, sharing objects that several
/// copied pages reference (fonts, images) instead of duplicating them.
struct PageCopier<'a> {
    source: &'a Document,
    copied: BTreeMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            copied: BTreeMap::new(),
        }
    }

    /// Append a copy of `page_id` to `builder`.
    fn copy_page(&mut self, builder: &mut PageTreeBuilder, page_id: ObjectId) -> Result<()> {
        let page = self.source.get_dictionary(page_id).map_err(|err| {
            SheetwerkError::PdfError(format!("cannot read page object {page_id:?}: {err}"))
        })?;
        let target = &mut builder.document;
        let new_id = target.new_object_id();
        self.copied.insert(page_id, new_id);

        let mut dict = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            dict.set(key.clone(), self.copy_object(target, value));
        }
        for key in INHERITABLE {
            if !dict.has(key) {
                if let Some(value) = inherited(self.source, page, key) {
                    dict.set(key.to_vec(), self.copy_object(target, value));
                }
            }
        }
        dict.set("Parent", Object::Reference(builder.pages_id));

        target.objects.insert(new_id, Object::Dictionary(dict));
        builder.kids.push(Object::Reference(new_id));
        Ok(())
    }

    /// Like [`Self::copy_page`], but a page already copied becomes a new
    /// page object of its own (its resources stay shared).
    fn copy_page_again(&mut self, builder: &mut PageTreeBuilder, page_id: ObjectId) -> Result<()> {
        self.copied.remove(&page_id);
        self.copy_page(builder, page_id)
    }

    fn copy_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => {
                if let Some(existing) = self.copied.get(id) {
                    return Object::Reference(*existing);
                }
                match self.source.get_object(*id) {
                    Ok(referenced) => {
                        // Reserve the id first so cycles resolve to it.
                        let new_id = target.new_object_id();
                        self.copied.insert(*id, new_id);
                        let copy = self.copy_object(target, referenced);
                        target.objects.insert(new_id, copy);
                        Object::Reference(new_id)
                    }
                    Err(err) => {
                        warn!(ref_id = ?id, %err, "Cannot resolve reference, using Null");
                        Object::Null
                    }
                }
            }
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(target, item))
                    .collect(),
            ),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.copy_dictionary(target, &stream.dict);
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    /// Copy a dictionary, dropping `/Parent` links back into the source
    /// page tree.
    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(target, value));
        }
        copy
    }
}
