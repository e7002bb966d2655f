// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object storage for staged user uploads.

use super::ClientError;
use std::path::PathBuf;

/// Blocking download interface over the upload staging store
pub trait ObjectStore: Send + Sync {
    fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ClientError>;
}

/// Filesystem-backed store: `<root>/<bucket>/<key>`
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ObjectStore for LocalObjectStore {
    fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ClientError> {
        let path = self.root.join(bucket).join(key);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClientError::NotFound(format!("{bucket}/{key}"))
            } else {
                ClientError::Io(e)
            }
        })
    }
}

#[cfg(test)]
#[path = "objects_tests.rs"]
mod tests;
