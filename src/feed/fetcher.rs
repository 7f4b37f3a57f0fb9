//! Guide feed fetcher.
//!
//! Downloads one gzip-compressed XMLTV feed, decompresses it, and extracts
//! the entries under its root element. Every failure mode maps to a
//! [`FetchError`] so one broken feed never disturbs the rest of a cycle.

use std::io::{Cursor, Read};
use std::time::Duration;

use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use reqwest::Client;
use thiserror::Error;

use crate::config::FeedsConfig;
use crate::feed::types::ParsedFeed;

/// User agent string for feed fetching.
const USER_AGENT: &str = "epgmux/0.1 (EPG merge service)";

/// Per-feed fetch or decode failure.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network-level failure (DNS, connect, TLS, read).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Response body exceeded the configured size cap.
    #[error("feed too large: {size} bytes (max {max} bytes)")]
    TooLarge {
        /// Reported or actual body size.
        size: u64,
        /// Configured cap.
        max: u64,
    },

    /// Gzip payload could not be decompressed.
    #[error("corrupt gzip payload: {0}")]
    Corrupt(String),

    /// Decompressed payload is not usable XML.
    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// Guide feed fetcher with a shared HTTP client.
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
}

impl FeedFetcher {
    /// Create a fetcher from the feeds configuration.
    pub fn new(config: &FeedsConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    /// Fetch and parse one guide feed.
    ///
    /// Issues a GET to the URL, enforces the size cap, decompresses the
    /// gzip body, and extracts the root's direct children as entries.
    pub async fn fetch(&self, url: &str) -> Result<ParsedFeed, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        // Check content length if available
        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(FetchError::TooLarge {
                    size: content_length,
                    max: self.max_feed_size,
                });
            }
        }

        let bytes = response.bytes().await.map_err(map_request_error)?;

        // Check actual size
        if bytes.len() as u64 > self.max_feed_size {
            return Err(FetchError::TooLarge {
                size: bytes.len() as u64,
                max: self.max_feed_size,
            });
        }

        let xml = decompress(&bytes)?;
        parse_entries(&xml)
    }
}

/// Distinguish timeouts from other request failures.
fn map_request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e)
    }
}

/// Decompress a gzip payload.
fn decompress(bytes: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut xml = Vec::new();
    decoder
        .read_to_end(&mut xml)
        .map_err(|e| FetchError::Corrupt(e.to_string()))?;
    Ok(xml)
}

/// Extract the direct children of the document root as serialized entries.
///
/// Entry content is carried through verbatim: attributes, text, CDATA, and
/// nested elements are re-emitted exactly as read. Whitespace between
/// entries and the input's own prolog are dropped.
pub fn parse_entries(xml: &[u8]) -> Result<ParsedFeed, FetchError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut capture: Option<Writer<Cursor<Vec<u8>>>> = None;
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut root_closed = false;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| FetchError::Malformed(e.to_string()))?
        {
            Event::Eof => break,
            Event::Start(e) => {
                if root_closed {
                    return Err(FetchError::Malformed(
                        "content after document root".to_string(),
                    ));
                }
                depth += 1;
                match depth {
                    1 => root_seen = true,
                    2 => {
                        let mut writer = Writer::new(Cursor::new(Vec::new()));
                        writer
                            .write_event(Event::Start(e))
                            .map_err(|err| FetchError::Malformed(err.to_string()))?;
                        capture = Some(writer);
                    }
                    _ => write_captured(&mut capture, Event::Start(e))?,
                }
            }
            Event::Empty(e) => {
                if root_closed {
                    return Err(FetchError::Malformed(
                        "content after document root".to_string(),
                    ));
                }
                match depth {
                    // An empty-element root holds no entries
                    0 => {
                        root_seen = true;
                        root_closed = true;
                    }
                    1 => {
                        let mut writer = Writer::new(Cursor::new(Vec::new()));
                        writer
                            .write_event(Event::Empty(e))
                            .map_err(|err| FetchError::Malformed(err.to_string()))?;
                        entries.push(finish_entry(writer)?);
                    }
                    _ => write_captured(&mut capture, Event::Empty(e))?,
                }
            }
            Event::End(e) => {
                if depth == 0 {
                    return Err(FetchError::Malformed("unmatched closing tag".to_string()));
                }
                if depth > 1 {
                    write_captured(&mut capture, Event::End(e))?;
                }
                depth -= 1;
                if depth == 1 {
                    let writer = capture.take().ok_or_else(|| {
                        FetchError::Malformed("entry capture out of sync".to_string())
                    })?;
                    entries.push(finish_entry(writer)?);
                } else if depth == 0 {
                    root_closed = true;
                }
            }
            // Text, CDATA, and comments inside an entry are kept; prolog
            // events and whitespace between entries are not.
            other => {
                if capture.is_some() {
                    write_captured(&mut capture, other)?;
                }
            }
        }
        buf.clear();
    }

    if !root_seen {
        return Err(FetchError::Malformed("no root element".to_string()));
    }
    if depth != 0 || !root_closed {
        return Err(FetchError::Malformed(
            "document ends before the root element is closed".to_string(),
        ));
    }

    Ok(ParsedFeed::new(entries))
}

fn write_captured(
    capture: &mut Option<Writer<Cursor<Vec<u8>>>>,
    event: Event<'_>,
) -> Result<(), FetchError> {
    if let Some(writer) = capture.as_mut() {
        writer
            .write_event(event)
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
    }
    Ok(())
}

fn finish_entry(writer: Writer<Cursor<Vec<u8>>>) -> Result<String, FetchError> {
    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| FetchError::Malformed(e.to_string()))
}
