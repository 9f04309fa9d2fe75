// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog assembly: inheritance resolution, validation, partitioning.

use crate::error::CatalogError;
use crate::ini::{read_sections, Section};
use crate::job::{self, JobDef};
use pcron_core::LogLevel;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Per-account values the catalog needs for mail defaults.
#[derive(Debug, Clone)]
pub struct CatalogDefaults {
    pub username: String,
    pub hostname: String,
}

/// The complete set of job definitions with inheritance resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    /// Jobs with at least one schedule source, fired by the main loop.
    pub jobs: BTreeMap<String, Arc<JobDef>>,
    /// Jobs with no schedule source, runnable only on request.
    pub startup: BTreeMap<String, Arc<JobDef>>,
    /// Logfile verbosity from the `[default]` section.
    pub loglevel: LogLevel,
}

impl Catalog {
    /// Look up any job, scheduled or startup.
    pub fn get(&self, name: &str) -> Option<&Arc<JobDef>> {
        self.jobs.get(name).or_else(|| self.startup.get(name))
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty() && self.startup.is_empty()
    }
}

pub fn parse_file(path: &Path, defaults: &CatalogDefaults) -> Result<Catalog, CatalogError> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&text, defaults)
}

pub fn parse_str(text: &str, defaults: &CatalogDefaults) -> Result<Catalog, CatalogError> {
    let sections = read_sections(text)?;
    if sections.iter().all(|s| s.name == "default") {
        return Err(CatalogError::Empty);
    }

    let loglevel = extract_loglevel(&sections)?;
    let by_name: BTreeMap<&str, &Section> =
        sections.iter().map(|s| (s.name.as_str(), s)).collect();

    let mut jobs = BTreeMap::new();
    let mut startup = BTreeMap::new();
    let mut post_lines: BTreeMap<String, usize> = BTreeMap::new();

    for section in &sections {
        if section.name == "default" {
            continue;
        }
        if !job::is_valid_name(&section.name) {
            return Err(CatalogError::invalid(
                &section.name,
                section.line,
                "invalid job name",
            ));
        }
        if let Some(entry) = section.get("loglevel") {
            return Err(CatalogError::invalid(
                &section.name,
                entry.line,
                "loglevel is only allowed in the default section",
            ));
        }

        let overlay = effective_entries(section, &by_name)?;
        if let Some((_, line)) = overlay.get("post") {
            post_lines.insert(section.name.clone(), *line);
        }
        let def =
            job::from_overlay(&section.name, section.line, &overlay, &defaults.username, &defaults.hostname)?;
        if def.is_scheduled() {
            jobs.insert(section.name.clone(), Arc::new(def));
        } else {
            startup.insert(section.name.clone(), Arc::new(def));
        }
    }

    let catalog = Catalog { jobs, startup, loglevel };
    validate_post_targets(&catalog, &post_lines)?;
    Ok(catalog)
}

/// Overlay a section's entries over all of its dotted prefixes, most
/// general first, over the synthetic `default` section. Every immediate
/// parent must exist.
fn effective_entries(
    section: &Section,
    by_name: &BTreeMap<&str, &Section>,
) -> Result<BTreeMap<String, (String, usize)>, CatalogError> {
    let mut chain: Vec<&Section> = vec![section];
    let mut name = section.name.as_str();
    while let Some((parent, _)) = name.rsplit_once('.') {
        let parent_section = by_name.get(parent).copied().ok_or_else(|| {
            CatalogError::invalid(
                &section.name,
                section.line,
                format!("missing parent job {parent:?}"),
            )
        })?;
        chain.push(parent_section);
        name = parent;
    }
    if let Some(default) = by_name.get("default").copied() {
        chain.push(default);
    }

    let mut effective = BTreeMap::new();
    for ancestor in chain.iter().rev() {
        for entry in &ancestor.entries {
            if entry.key == "loglevel" {
                continue;
            }
            effective.insert(entry.key.clone(), (entry.value.clone(), entry.line));
        }
    }
    Ok(effective)
}

fn extract_loglevel(sections: &[Section]) -> Result<LogLevel, CatalogError> {
    let Some(default) = sections.iter().find(|s| s.name == "default") else {
        return Ok(LogLevel::default());
    };
    match default.get("loglevel") {
        None => Ok(LogLevel::default()),
        Some(entry) => LogLevel::parse(&entry.value).ok_or_else(|| {
            CatalogError::invalid(
                "default",
                entry.line,
                format!("invalid loglevel value {:?}", entry.value),
            )
        }),
    }
}

/// Every `post` target must name a job in the same catalog.
fn validate_post_targets(
    catalog: &Catalog,
    post_lines: &BTreeMap<String, usize>,
) -> Result<(), CatalogError> {
    for def in catalog.jobs.values() {
        for target in &def.post {
            if catalog.get(target).is_none() {
                let line = post_lines.get(&def.name).copied().unwrap_or_default();
                return Err(CatalogError::invalid(
                    &def.name,
                    line,
                    format!("post target {target:?} does not exist"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
