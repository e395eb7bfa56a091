// 📡 Feed Loader
// Fetch a named CSV feed and tokenize it into raw rows.
//
// Transport is behind the `FeedFetcher` trait so the loader can run
// against HTTP in production and against in-memory bodies in tests.
// Failures propagate to the caller; the loader never retries.

use crate::decoder::{decode_feed, dedupe_headers, FeedKind, FeedRecord, RawFeed, RawRow};
use crate::error::{FeedError, FeedResult};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// TRANSPORT
// ============================================================================

/// FeedFetcher - fetches the text body behind a feed URL
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// HTTP transport (reqwest)
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// `timeout` is an optional per-request deadline
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to create HTTP client")?;
        Ok(HttpFetcher { http })
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP status {}", status));
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))
    }
}

/// In-memory transport: fixed bodies (or failures) per URL
#[derive(Default)]
pub struct MemoryFetcher {
    bodies: HashMap<String, std::result::Result<String, String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: serve `body` at `url`
    pub fn with_body(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    /// Builder pattern: fail every fetch of `url`
    pub fn with_failure(mut self, url: &str, message: &str) -> Self {
        self.bodies.insert(url.to_string(), Err(message.to_string()));
        self
    }
}

#[async_trait]
impl FeedFetcher for MemoryFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        match self.bodies.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(message)) => Err(anyhow!("{}", message)),
            None => Err(anyhow!("No feed served at {}", url)),
        }
    }
}

// ============================================================================
// TOKENIZER
// ============================================================================

/// Tokenize a CSV body into a raw feed.
///
/// The first record is the header row. Repeated column names are renamed
/// (`name`, `name_1`, …); blank lines and all-blank records are skipped.
/// Short rows simply lack the trailing columns.
pub fn parse_feed_text(kind: FeedKind, text: &str) -> FeedResult<RawFeed> {
    let malformed = |err: csv::Error| FeedError::Malformed {
        feed: kind,
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: err.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(result) => result.map_err(malformed)?,
        None => return Err(FeedError::MissingHeader { feed: kind }),
    };

    let names: Vec<String> = header
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if names.iter().all(|n| n.is_empty()) {
        return Err(FeedError::MissingHeader { feed: kind });
    }
    let headers = dedupe_headers(&names);

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(malformed)?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let line_number = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() > headers.len() {
            log::debug!(
                "{} feed line {}: ignoring {} surplus cell(s)",
                kind,
                line_number,
                record.len() - headers.len()
            );
        }

        let mut row = RawRow::new(line_number);
        for (column, cell) in headers.iter().zip(record.iter()) {
            row.insert(column, cell);
        }
        rows.push(row);
    }

    Ok(RawFeed {
        kind,
        headers,
        rows,
    })
}

// ============================================================================
// LOADER
// ============================================================================

/// FeedLoader - one instance per feed, typed by the entity it yields
pub struct FeedLoader<T: FeedRecord> {
    url: String,
    fetcher: Arc<dyn FeedFetcher>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: FeedRecord> Clone for FeedLoader<T> {
    fn clone(&self) -> Self {
        FeedLoader {
            url: self.url.clone(),
            fetcher: Arc::clone(&self.fetcher),
            _entity: PhantomData,
        }
    }
}

impl<T: FeedRecord> FeedLoader<T> {
    pub fn new(url: impl Into<String>, fetcher: Arc<dyn FeedFetcher>) -> Self {
        FeedLoader {
            url: url.into(),
            fetcher,
            _entity: PhantomData,
        }
    }

    pub fn kind(&self) -> FeedKind {
        T::KIND
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and tokenize, without decoding
    pub async fn load_raw(&self) -> FeedResult<RawFeed> {
        let body = self
            .fetcher
            .fetch_text(&self.url)
            .await
            .map_err(|err| FeedError::Transport {
                feed: T::KIND,
                url: self.url.clone(),
                message: format!("{:#}", err),
            })?;

        parse_feed_text(T::KIND, &body)
    }

    /// Fetch, tokenize and decode; all-or-nothing
    pub async fn load(&self) -> FeedResult<Vec<T>> {
        let raw = self.load_raw().await?;
        let decoded = decode_feed::<T>(&raw)?;
        log::info!("Loaded {} {} from {}", decoded.len(), T::KIND, self.url);
        Ok(decoded)
    }
}
