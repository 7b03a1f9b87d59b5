// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared application state handed to every handler.
//
// Everything here is read-only after startup; requests share nothing
// mutable beyond their own artifact directory.

use std::sync::Arc;

use sheetwerk_core::ServerConfig;
use sheetwerk_core::error::Result;
use sheetwerk_document::FontBook;

use crate::services::OutputStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Parsed once at startup; font parsing is the slowest part of a cold start.
    pub fonts: Arc<FontBook>,
    pub store: Arc<OutputStore>,
}

impl AppState {
    /// Open the output store named by `config` and bundle it with `fonts`.
    pub fn new(config: ServerConfig, fonts: FontBook) -> Result<Self> {
        let store = OutputStore::open(&config.output_dir)?;
        Ok(Self {
            config: Arc::new(config),
            fonts: Arc::new(fonts),
            store: Arc::new(store),
        })
    }
}
