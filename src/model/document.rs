//! Document-level types.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A finalized paginated document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Number of pages
    pub page_count: u32,

    /// Where the document was emitted, if it was
    pub path: Option<PathBuf>,

    bytes: Vec<u8>,
}

impl Document {
    /// Wrap finalized PDF bytes.
    pub fn new(bytes: Vec<u8>, page_count: u32, metadata: Metadata) -> Self {
        Self {
            metadata,
            page_count,
            path: None,
            bytes,
        }
    }

    /// Encoded PDF bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size of the encoded document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the document has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the document to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Document metadata, written into the PDF information dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Metadata carrying only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Fill missing producer and creation date.
    pub fn stamped(mut self) -> Self {
        if self.producer.is_none() {
            self.producer = Some(format!("mdpress {}", crate::VERSION));
        }
        if self.created.is_none() {
            self.created = Some(Utc::now());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/doc.pdf");
        let doc = Document::new(b"%PDF-1.7\n".to_vec(), 1, Metadata::default());

        doc.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7\n");
    }

    #[test]
    fn test_metadata_stamped_keeps_explicit_values() {
        let meta = Metadata {
            producer: Some("custom".into()),
            ..Metadata::titled("Report")
        }
        .stamped();

        assert_eq!(meta.title.as_deref(), Some("Report"));
        assert_eq!(meta.producer.as_deref(), Some("custom"));
        assert!(meta.created.is_some());
    }
}
