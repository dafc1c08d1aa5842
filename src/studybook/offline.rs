//! # Offline Shell Cache
//!
//! The cache-first contract the app shell follows so the notebook opens without a
//! network connection. It is expressed as a pure unit: the network is injected through
//! the [`Network`] trait and named caches live in a plain [`CacheStorage`] value, so
//! every path can be exercised without a browser.
//!
//! | Phase      | Behavior                                                           |
//! |------------|--------------------------------------------------------------------|
//! | `install`  | fetch every shell file and store them under the current version     |
//! | `activate` | delete every cache whose name is not the current version            |
//! | `fetch`    | non-GET bypasses the cache; cached responses win; else the network   |
//!
//! Successful GET responses are stored as they pass through. A navigation request that
//! fails (or comes back 404) falls back to the cached `/index.html`; any other failure
//! yields no response.
//!
//! The module also carries the web app manifest served as `/manifest.json`.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CACHE_VERSION: &str = "studybook-v1";

/// Files the application needs to boot offline.
pub static SHELL_FILES: Lazy<Vec<String>> = Lazy::new(|| {
    ["/", "/index.html", "/manifest.json", "/icon.svg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
});

const FALLBACK_PAGE: &str = "/index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub method: String,
    /// True for top-level page loads.
    pub navigate: bool,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            navigate: false,
        }
    }

    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            navigate: true,
            ..Self::get(url)
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OfflineError {
    #[error("network unavailable")]
    Unreachable,

    #[error("{url} returned status {status}")]
    BadStatus { url: String, status: u16 },
}

pub trait Network {
    fn fetch(&mut self, request: &Request) -> Result<Response, OfflineError>;
}

/// Named caches, each mapping a URL to its stored response.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    caches: BTreeMap<String, BTreeMap<String, Response>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    pub fn put(&mut self, cache: &str, url: &str, response: Response) {
        self.caches
            .entry(cache.to_string())
            .or_default()
            .insert(url.to_string(), response);
    }

    pub fn lookup(&self, cache: &str, url: &str) -> Option<&Response> {
        self.caches.get(cache).and_then(|c| c.get(url))
    }

    pub fn delete(&mut self, cache: &str) -> bool {
        self.caches.remove(cache).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct OfflineCache {
    version: String,
    shell: Vec<String>,
}

impl Default for OfflineCache {
    fn default() -> Self {
        Self::new(CACHE_VERSION)
    }
}

impl OfflineCache {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            shell: SHELL_FILES.clone(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Fetches the whole shell first and only then stores it, so a partial install
    /// leaves the storage untouched.
    pub fn install<N: Network>(
        &self,
        storage: &mut CacheStorage,
        network: &mut N,
    ) -> Result<(), OfflineError> {
        let mut fetched = Vec::with_capacity(self.shell.len());
        for url in &self.shell {
            let response = network.fetch(&Request::get(url.as_str()))?;
            if !response.is_success() {
                return Err(OfflineError::BadStatus {
                    url: url.clone(),
                    status: response.status,
                });
            }
            fetched.push((url, response));
        }
        for (url, response) in fetched {
            storage.put(&self.version, url, response);
        }
        info!(version = %self.version, files = self.shell.len(), "installed shell cache");
        Ok(())
    }

    /// Drops every cache left by earlier versions. Returns the deleted names.
    pub fn activate(&self, storage: &mut CacheStorage) -> Vec<String> {
        let stale: Vec<String> = storage
            .names()
            .into_iter()
            .filter(|name| *name != self.version)
            .collect();
        for name in &stale {
            storage.delete(name);
        }
        if !stale.is_empty() {
            info!(removed = ?stale, "removed stale caches");
        }
        stale
    }

    pub fn handle_fetch<N: Network>(
        &self,
        storage: &mut CacheStorage,
        network: &mut N,
        request: &Request,
    ) -> Option<Response> {
        if !request.is_get() {
            return network.fetch(request).ok();
        }

        if let Some(hit) = storage.lookup(&self.version, &request.url) {
            debug!(url = %request.url, "cache hit");
            return Some(hit.clone());
        }

        match network.fetch(request) {
            Ok(response) if response.is_success() => {
                storage.put(&self.version, &request.url, response.clone());
                Some(response)
            }
            Ok(response) if request.navigate && response.status == 404 => self
                .fallback(storage)
                .or(Some(response)),
            Ok(response) => Some(response),
            Err(err) if request.navigate => {
                warn!(url = %request.url, error = %err, "navigation failed, serving cached shell");
                self.fallback(storage)
            }
            Err(err) => {
                debug!(url = %request.url, error = %err, "fetch failed");
                None
            }
        }
    }

    fn fallback(&self, storage: &CacheStorage) -> Option<Response> {
        storage.lookup(&self.version, FALLBACK_PAGE).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    Fullscreen,
    Standalone,
    MinimalUi,
    Browser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppManifest {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: DisplayMode,
    pub background_color: String,
    pub theme_color: String,
    pub icons: Vec<ManifestIcon>,
}

pub static DEFAULT_MANIFEST: Lazy<AppManifest> = Lazy::new(|| AppManifest {
    name: "Studybook".to_string(),
    short_name: "Studybook".to_string(),
    description: "Mistake notebook and study notes".to_string(),
    start_url: "/".to_string(),
    display: DisplayMode::Standalone,
    background_color: "#ffffff".to_string(),
    theme_color: "#4f46e5".to_string(),
    icons: vec![ManifestIcon {
        src: "/icon.svg".to_string(),
        sizes: "any".to_string(),
        mime: "image/svg+xml".to_string(),
    }],
});

impl Default for AppManifest {
    fn default() -> Self {
        DEFAULT_MANIFEST.clone()
    }
}

impl AppManifest {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Serves canned responses and records every request it sees.
    #[derive(Default)]
    struct FakeNetwork {
        online: bool,
        pages: HashMap<String, Response>,
        seen: Vec<Request>,
    }

    impl FakeNetwork {
        fn online() -> Self {
            let mut net = Self {
                online: true,
                ..Default::default()
            };
            for url in SHELL_FILES.iter() {
                net.pages
                    .insert(url.clone(), Response::ok(format!("shell {}", url)));
            }
            net
        }
    }

    impl Network for FakeNetwork {
        fn fetch(&mut self, request: &Request) -> Result<Response, OfflineError> {
            self.seen.push(request.clone());
            if !self.online {
                return Err(OfflineError::Unreachable);
            }
            Ok(self
                .pages
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| Response::status(404)))
        }
    }

    fn installed() -> (OfflineCache, CacheStorage, FakeNetwork) {
        let cache = OfflineCache::default();
        let mut storage = CacheStorage::new();
        let mut net = FakeNetwork::online();
        cache.install(&mut storage, &mut net).unwrap();
        (cache, storage, net)
    }

    #[test]
    fn install_stores_every_shell_file() {
        let (cache, storage, _) = installed();
        for url in SHELL_FILES.iter() {
            assert!(storage.lookup(cache.version(), url).is_some());
        }
    }

    #[test]
    fn install_is_all_or_nothing() {
        let cache = OfflineCache::default();
        let mut storage = CacheStorage::new();
        let mut net = FakeNetwork::online();
        net.pages.remove("/icon.svg");

        let err = cache.install(&mut storage, &mut net).unwrap_err();
        assert_eq!(
            err,
            OfflineError::BadStatus {
                url: "/icon.svg".into(),
                status: 404
            }
        );
        assert!(storage.names().is_empty());
    }

    #[test]
    fn activate_removes_old_versions() {
        let (cache, mut storage, _) = installed();
        storage.put("studybook-v0", "/", Response::ok("old"));

        let removed = cache.activate(&mut storage);
        assert_eq!(removed, vec!["studybook-v0".to_string()]);
        assert_eq!(storage.names(), vec![CACHE_VERSION.to_string()]);
    }

    #[test]
    fn cached_response_wins_over_network() {
        let (cache, mut storage, mut net) = installed();
        net.pages.insert("/".into(), Response::ok("fresh"));
        net.seen.clear();

        let resp = cache
            .handle_fetch(&mut storage, &mut net, &Request::get("/"))
            .unwrap();
        assert_eq!(resp.body, b"shell /".to_vec());
        assert!(net.seen.is_empty());
    }

    #[test]
    fn successful_get_is_cached_for_later() {
        let (cache, mut storage, mut net) = installed();
        net.pages.insert("/app.js".into(), Response::ok("js"));

        cache.handle_fetch(&mut storage, &mut net, &Request::get("/app.js"));
        net.online = false;
        let resp = cache.handle_fetch(&mut storage, &mut net, &Request::get("/app.js"));
        assert_eq!(resp, Some(Response::ok("js")));
    }

    #[test]
    fn non_get_bypasses_cache() {
        let (cache, mut storage, mut net) = installed();
        let post = Request::get("/").with_method("POST");

        let resp = cache.handle_fetch(&mut storage, &mut net, &post);
        assert_eq!(resp.map(|r| r.body), Some(b"shell /".to_vec()));
        assert_eq!(net.seen.last().map(|r| r.method.as_str()), Some("POST"));

        net.online = false;
        assert_eq!(cache.handle_fetch(&mut storage, &mut net, &post), None);
    }

    #[test]
    fn offline_navigation_falls_back_to_index() {
        let (cache, mut storage, mut net) = installed();
        net.online = false;

        let resp = cache.handle_fetch(&mut storage, &mut net, &Request::navigation("/mistakes/3"));
        assert_eq!(resp.map(|r| r.body), Some(b"shell /index.html".to_vec()));

        // Sub-resources get nothing
        assert_eq!(
            cache.handle_fetch(&mut storage, &mut net, &Request::get("/missing.png")),
            None
        );
    }

    #[test]
    fn not_found_navigation_falls_back_to_index() {
        let (cache, mut storage, mut net) = installed();
        let resp = cache
            .handle_fetch(&mut storage, &mut net, &Request::navigation("/notes/unknown"))
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"shell /index.html".to_vec());

        let resp = cache
            .handle_fetch(&mut storage, &mut net, &Request::get("/nope.css"))
            .unwrap();
        assert_eq!(resp.status, 404);
        assert!(storage.lookup(cache.version(), "/nope.css").is_none());
    }

    #[test]
    fn manifest_serializes_expected_fields() {
        let json = AppManifest::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["display"], "standalone");
        assert_eq!(value["start_url"], "/");
        assert_eq!(value["icons"][0]["type"], "image/svg+xml");
    }
}
