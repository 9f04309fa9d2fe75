// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog parse errors.

use thiserror::Error;

/// Errors raised while reading a catalog.
///
/// [`CatalogError::Empty`] is a distinct outcome: an engine starting
/// against an empty crontab runs with no jobs, while any other variant
/// means the file cannot be used at all.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read crontab: {0}")]
    Io(#[from] std::io::Error),

    #[error("crontab is empty")]
    Empty,

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("job {section:?} (line {line}): {message}")]
    Invalid { section: String, line: usize, message: String },
}

impl CatalogError {
    pub(crate) fn invalid(
        section: &str,
        line: usize,
        message: impl Into<String>,
    ) -> CatalogError {
        CatalogError::Invalid { section: section.to_string(), line, message: message.into() }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CatalogError::Empty)
    }
}
