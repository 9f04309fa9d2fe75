// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Catalog(#[from] pcron_catalog::CatalogError),

    #[error("cannot determine account identity: {0}")]
    Identity(String),

    #[error(transparent)]
    Spawn(#[from] crate::supervisor::SpawnError),

    #[error("no such job: {0:?}")]
    NoSuchJob(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
