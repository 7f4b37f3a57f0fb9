//! Published guide store.
//!
//! Holds the latest published artifact behind a lock so the web layer can
//! hand out a consistent snapshot while the updater prepares the next one.
//! Serialization and compression happen entirely before the swap; readers
//! never observe a partially built artifact.

use std::io::{Cursor, Write};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{EpgmuxError, Result};
use crate::feed::types::{MergedDocument, GUIDE_ROOT_ELEMENT};

/// One published guide artifact.
#[derive(Debug, Clone)]
pub struct PublishedGuide {
    /// Gzip-compressed XMLTV document.
    pub bytes: Vec<u8>,
    /// When the artifact was published.
    pub produced_at: DateTime<Utc>,
    /// Number of entries in the document.
    pub entry_count: usize,
}

/// Store for the current published guide.
pub struct GuideStore {
    current: RwLock<Option<Arc<PublishedGuide>>>,
}

impl GuideStore {
    /// Create an empty store. No artifact is available until the first
    /// [`publish`](Self::publish).
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Serialize, compress, and publish a merged document.
    ///
    /// The new artifact replaces the previous one in a single swap. On
    /// error the previous artifact stays published.
    pub fn publish(&self, doc: &MergedDocument) -> Result<()> {
        let xml = serialize_guide(doc)?;
        let compressed = compress(&xml)?;

        let guide = Arc::new(PublishedGuide {
            bytes: compressed,
            produced_at: Utc::now(),
            entry_count: doc.entry_count(),
        });

        let mut current = self.current.write().unwrap();
        *current = Some(guide);
        Ok(())
    }

    /// Get the current published guide, if any.
    pub fn current(&self) -> Option<Arc<PublishedGuide>> {
        self.current.read().unwrap().clone()
    }
}

impl Default for GuideStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a merged document as a complete XMLTV file.
///
/// Output is an XML declaration followed by a fresh root element wrapping
/// every entry verbatim, in order.
fn serialize_guide(doc: &MergedDocument) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| EpgmuxError::Publish(format!("failed to write XML declaration: {e}")))?;
    writer
        .write_event(Event::Start(BytesStart::new(GUIDE_ROOT_ELEMENT)))
        .map_err(|e| EpgmuxError::Publish(format!("failed to open root element: {e}")))?;

    for entry in &doc.entries {
        // Entries are already serialized XML fragments
        writer
            .write_event(Event::Text(BytesText::from_escaped(entry.as_str())))
            .map_err(|e| EpgmuxError::Publish(format!("failed to write entry: {e}")))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(GUIDE_ROOT_ELEMENT)))
        .map_err(|e| EpgmuxError::Publish(format!("failed to close root element: {e}")))?;

    Ok(writer.into_inner().into_inner())
}

/// Gzip-compress a serialized document.
fn compress(xml: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(xml)
        .map_err(|e| EpgmuxError::Publish(format!("gzip compression failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| EpgmuxError::Publish(format!("gzip compression failed: {e}")))
}
