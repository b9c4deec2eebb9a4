//! Registered sources

use crate::types::FileId;
use serde::{Deserialize, Serialize};

/// The sources diagnostics may point into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: Vec<SourceFile>,
}

/// A registered source with its content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// File path or a placeholder such as `<template>`
    pub path: String,
    /// Full source text
    pub content: String,
}

impl SourceContext {
    /// Create a new empty source context
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source and return its ID
    pub fn add_file(&mut self, path: String, content: String) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile { path, content });
        id
    }

    /// Look up a registered source
    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Number of registered sources
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no source has been registered
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
