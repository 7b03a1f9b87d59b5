// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-request output storage.
//
// Every request that produces files gets its own directory
// `<root>/<kind>/<request id>/`. The directory is removed again unless the
// request commits it, so a failed request never leaves partial output behind.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sheetwerk_core::RequestId;
use sheetwerk_core::error::{Result, SheetwerkError};
use tracing::{debug, info, warn};

/// Which route produced an artifact directory. Doubles as the first path
/// segment under the storage root and under `/files`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    ExcelToPdf,
    PdfMerge,
    PdfSplit,
    PdfRotate,
    PdfReorder,
    ImageToPdf,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        Self::ExcelToPdf,
        Self::PdfMerge,
        Self::PdfSplit,
        Self::PdfRotate,
        Self::PdfReorder,
        Self::ImageToPdf,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::ExcelToPdf => "excel-topdf",
            Self::PdfMerge => "pdf-merge",
            Self::PdfSplit => "pdf-split",
            Self::PdfRotate => "pdf-rotate",
            Self::PdfReorder => "pdf-reorder",
            Self::ImageToPdf => "img2pdf",
        }
    }
}

/// Root of all generated artifacts.
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    /// Use `root` for generated files, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!(path = %root.display(), "Output store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve a fresh directory for one request.
    pub fn begin(&self, kind: ArtifactKind) -> Result<Artifacts> {
        let id = RequestId::new();
        let dir = self.root.join(kind.dir_name()).join(id.to_string());
        fs::create_dir_all(&dir)?;
        debug!(%id, kind = kind.dir_name(), "Artifact directory created");
        Ok(Artifacts {
            kind,
            id,
            dir,
            committed: false,
        })
    }

    /// Remove request directories last modified before `cutoff`.
    ///
    /// Only directories named by a request identifier are touched. Returns
    /// how many were removed.
    pub fn sweep_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut removed = 0;
        for kind in ArtifactKind::ALL {
            let kind_dir = self.root.join(kind.dir_name());
            let entries = match fs::read_dir(&kind_dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            for entry in entries {
                let entry = entry?;
                let name = entry.file_name();
                if RequestId::parse(&name.to_string_lossy()).is_none() {
                    continue;
                }
                let modified: DateTime<Utc> = entry.metadata()?.modified()?.into();
                if modified >= cutoff {
                    continue;
                }
                match fs::remove_dir_all(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %entry.path().display(), error = %e, "Could not remove expired output"),
                }
            }
        }
        if removed > 0 {
            info!(removed, %cutoff, "Expired outputs removed");
        }
        Ok(removed)
    }
}

/// Output directory of one in-flight request. Removed on drop unless
/// [`Artifacts::commit`] was called.
#[derive(Debug)]
pub struct Artifacts {
    kind: ArtifactKind,
    id: RequestId,
    dir: PathBuf,
    committed: bool,
}

impl Artifacts {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Public URL of a file in this directory.
    pub fn url(&self, file_name: &str) -> String {
        format!("/files/{}/{}/{}", self.kind.dir_name(), self.id, file_name)
    }

    /// Write one file and return its public URL.
    pub fn write(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(SheetwerkError::InvalidRequest(format!(
                "invalid output file name: {file_name}"
            )));
        }
        fs::write(self.dir.join(file_name), bytes)?;
        debug!(id = %self.id, file_name, bytes = bytes.len(), "Artifact written");
        Ok(self.url(file_name))
    }

    /// Keep the directory and return the request identifier.
    pub fn commit(mut self) -> RequestId {
        self.committed = true;
        self.id
    }
}

impl Drop for Artifacts {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!(id = %self.id, "Uncommitted artifacts discarded"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(id = %self.id, error = %e, "Could not discard artifacts"),
        }
    }
}
