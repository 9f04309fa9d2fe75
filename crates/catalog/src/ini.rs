// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Low-level reader for the section format.
//!
//! Comment lines begin with `#` or `;`, key-value separators are `:` or
//! `=`, and lines beginning with whitespace continue the previous value.
//! Keys are folded to lowercase. Duplicate sections and duplicate keys
//! within a section are errors.

use crate::error::CatalogError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub key: String,
    pub value: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section {
    pub name: String,
    pub line: usize,
    pub entries: Vec<Entry>,
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }
}

pub(crate) fn read_sections(text: &str) -> Result<Vec<Section>, CatalogError> {
    let mut sections: Vec<Section> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if raw.starts_with(|c: char| c.is_whitespace()) {
            // Continuation of the previous value.
            let entry = sections
                .last_mut()
                .and_then(|s| s.entries.last_mut())
                .ok_or_else(|| CatalogError::Syntax {
                    line,
                    message: "continuation line without a preceding value".to_string(),
                })?;
            entry.value.push('\n');
            entry.value.push_str(trimmed);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            let name = rest.strip_suffix(']').ok_or_else(|| CatalogError::Syntax {
                line,
                message: format!("malformed section header {trimmed:?}"),
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(CatalogError::Syntax {
                    line,
                    message: "empty section name".to_string(),
                });
            }
            if sections.iter().any(|s| s.name == name) {
                return Err(CatalogError::Syntax {
                    line,
                    message: format!("duplicate job {name:?}"),
                });
            }
            sections.push(Section { name: name.to_string(), line, entries: Vec::new() });
            continue;
        }

        // A key-value pair, split on whichever separator comes first.
        let sep = trimmed
            .find(|c| c == ':' || c == '=')
            .ok_or_else(|| CatalogError::Syntax {
                line,
                message: format!("expected `key: value` or `key = value`, got {trimmed:?}"),
            })?;
        let key = trimmed[..sep].trim().to_lowercase();
        let value = trimmed[sep + 1..].trim().to_string();
        if key.is_empty() {
            return Err(CatalogError::Syntax { line, message: "empty key".to_string() });
        }

        let section = sections.last_mut().ok_or_else(|| CatalogError::Syntax {
            line,
            message: format!("value {key:?} outside of any section"),
        })?;
        if section.entries.iter().any(|e| e.key == key) {
            return Err(CatalogError::Syntax {
                line,
                message: format!("duplicate option {:?} in job {:?}", key, section.name),
            });
        }
        section.entries.push(Entry { key, value, line });
    }

    Ok(sections)
}

#[cfg(test)]
#[path = "ini_tests.rs"]
mod tests;
