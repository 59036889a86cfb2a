// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory remote collaborators and fixtures shared by the asset tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assetkit_core::{
    AssetConfig, AssetFetcher, AssetService, AssetType, DecodeError, DecodedImage, FetchError,
    ImageDecoder, ManifestClient, ManifestEntry, ManifestVariant, SignatureDecoder, UiMode,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

pub const SVG_H1: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"h1\"/>";
pub const SVG_H2: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"h2\"/>";
pub const JPG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x02];

pub fn url(name: &str, hash: &str, mode: UiMode, asset_type: AssetType) -> String {
    format!(
        "https://cdn.test/{}/{}/{}.{}",
        name,
        hash,
        mode,
        asset_type.extension()
    )
}

pub fn variant(name: &str, hash: &str, asset_type: AssetType, mode: UiMode) -> ManifestVariant {
    ManifestVariant {
        asset_type,
        ui_mode: mode,
        url: url(name, hash, mode, asset_type),
        checksum: None,
    }
}

/// Entry with a single light SVG variant
pub fn svg_entry(name: &str, hash: &str) -> ManifestEntry {
    ManifestEntry {
        name: name.to_string(),
        hash: hash.to_string(),
        variants: vec![variant(name, hash, AssetType::Svg, UiMode::Light)],
    }
}

/// Manifest client serving a swappable entry list
#[derive(Default)]
pub struct MockManifestClient {
    entries: Mutex<Vec<ManifestEntry>>,
    fail_status: Mutex<Option<u16>>,
    delay: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
}

impl MockManifestClient {
    pub fn new(entries: Vec<ManifestEntry>) -> Arc<Self> {
        let client = Self::default();
        *client.entries.lock() = entries;
        Arc::new(client)
    }

    pub fn set_entries(&self, entries: Vec<ManifestEntry>) {
        *self.entries.lock() = entries;
    }

    pub fn fail_with(&self, status: Option<u16>) {
        *self.fail_status.lock() = status;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestClient for MockManifestClient {
    async fn fetch_manifest(&self) -> Result<Vec<ManifestEntry>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let status = *self.fail_status.lock();
        if let Some(status) = status {
            return Err(FetchError::Http(status));
        }
        Ok(self.entries.lock().clone())
    }
}

#[derive(Debug, Clone)]
enum Response {
    Body(Vec<u8>),
    Status(u16),
    /// Fail with the status this many times, then serve the body
    Flaky {
        failures: usize,
        status: u16,
        body: Vec<u8>,
    },
}

/// Asset fetcher serving canned responses by URL
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, Response>>,
    requests: Mutex<HashMap<String, usize>>,
    delay: Mutex<Option<Duration>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, url: impl Into<String>, body: &[u8]) {
        self.responses
            .lock()
            .insert(url.into(), Response::Body(body.to_vec()));
    }

    pub fn fail(&self, url: impl Into<String>, status: u16) {
        self.responses
            .lock()
            .insert(url.into(), Response::Status(status));
    }

    pub fn flaky(&self, url: impl Into<String>, failures: usize, status: u16, body: &[u8]) {
        self.responses.lock().insert(
            url.into(),
            Response::Flaky {
                failures,
                status,
                body: body.to_vec(),
            },
        );
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests.lock().get(url).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().values().sum()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetFetcher for MockFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let attempt = {
            let mut requests = self.requests.lock();
            let count = requests.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let response = self.responses.lock().get(url).cloned();
        match response {
            Some(Response::Body(body)) => Ok(body),
            Some(Response::Status(status)) => Err(FetchError::Http(status)),
            Some(Response::Flaky {
                failures,
                status,
                body,
            }) => {
                if attempt <= failures {
                    Err(FetchError::Http(status))
                } else {
                    Ok(body)
                }
            }
            None => Err(FetchError::Http(404)),
        }
    }
}

/// Log sink collecting formatted tracing output
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Run `f` with this capture as the thread's subscriber (WARN and above)
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Captured lines containing `needle`
    pub fn lines_with(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Decoder that counts how often it runs
#[derive(Default)]
pub struct CountingDecoder {
    calls: AtomicUsize,
}

impl CountingDecoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageDecoder for CountingDecoder {
    fn decode(&self, asset_type: AssetType, data: &[u8]) -> Result<DecodedImage, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        SignatureDecoder.decode(asset_type, data)
    }
}

/// A service over mocks plus handles to them
pub struct Harness {
    pub temp: TempDir,
    pub manifest: Arc<MockManifestClient>,
    pub fetcher: Arc<MockFetcher>,
    pub decoder: Arc<CountingDecoder>,
    pub service: AssetService,
}

pub fn test_config(temp: &TempDir) -> AssetConfig {
    AssetConfig::new(temp.path(), "https://cdn.test/manifest.json")
        .with_retry(1, Duration::from_millis(1))
}

impl Harness {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self::with_config(entries, test_config)
    }

    pub fn with_config(
        entries: Vec<ManifestEntry>,
        configure: impl FnOnce(&TempDir) -> AssetConfig,
    ) -> Self {
        let temp = TempDir::new().unwrap();
        let config = configure(&temp);
        let manifest = MockManifestClient::new(entries);
        let fetcher = MockFetcher::new();
        let decoder = Arc::new(CountingDecoder::default());
        let service = AssetService::new(
            config,
            manifest.clone(),
            fetcher.clone(),
            decoder.clone(),
        )
        .unwrap();

        Self {
            temp,
            manifest,
            fetcher,
            decoder,
            service,
        }
    }
}
