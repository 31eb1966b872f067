//! Async bootstrap of the map engine library.
//!
//! The stylesheet and the engine module are loaded at most once per page.
//! Concurrent callers share the in-flight load; a failed load leaves the
//! loader idle so the next [`BootstrapLoader::ensure_ready`] starts over.
//! The loaded module is handed back explicitly instead of living in a
//! global namespace.

use crate::{core::config::MapViewConfig, traits::EngineModule, MapError, Result};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<dyn EngineModule>>>>;

/// Where the engine's stylesheet and code come from
#[async_trait]
pub trait BootstrapSource: Send + Sync {
    /// Waits until the stylesheet at `href` is usable
    async fn load_stylesheet(&self, href: &str) -> Result<()>;

    /// Loads the engine script at `src` and returns its module
    async fn load_module(&self, src: &str) -> Result<Arc<dyn EngineModule>>;
}

/// The document the stylesheet link is inserted into
pub trait DocumentHost: Send + Sync {
    fn has_stylesheet(&self, href: &str) -> bool;

    fn insert_stylesheet(&self, href: &str) -> Result<()>;
}

enum LoaderState {
    Idle,
    Loading { id: u64, load: SharedLoad },
    Ready(Arc<dyn EngineModule>),
}

pub struct BootstrapLoader {
    source: Arc<dyn BootstrapSource>,
    document: Arc<dyn DocumentHost>,
    stylesheet_href: String,
    script_src: String,
    state: Mutex<LoaderState>,
    next_load_id: AtomicU64,
    load_attempts: AtomicUsize,
}

impl BootstrapLoader {
    pub fn new(
        source: Arc<dyn BootstrapSource>,
        document: Arc<dyn DocumentHost>,
        config: &MapViewConfig,
    ) -> Self {
        Self {
            source,
            document,
            stylesheet_href: config.stylesheet_href.clone(),
            script_src: config.script_src.clone(),
            state: Mutex::new(LoaderState::Idle),
            next_load_id: AtomicU64::new(0),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Number of loads actually started, shared ones counted once
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.lock_state(), LoaderState::Ready(_))
    }

    /// Resolves to the engine module, loading it first if nobody has yet.
    ///
    /// Failures come back as `MapError::BootstrapFailure`.
    pub async fn ensure_ready(&self) -> Result<Arc<dyn EngineModule>> {
        let (id, load) = {
            let mut state = self.lock_state();
            match &*state {
                LoaderState::Ready(module) => return Ok(module.clone()),
                LoaderState::Loading { id, load } => {
                    log::debug!("joining in-flight engine load #{}", id);
                    (*id, load.clone())
                }
                LoaderState::Idle => {
                    let (id, load) = self.start_load();
                    *state = LoaderState::Loading {
                        id,
                        load: load.clone(),
                    };
                    (id, load)
                }
            }
        };

        let result = load.await;
        self.settle(id, &result);
        result
    }

    fn start_load(&self) -> (u64, SharedLoad) {
        let id = self.next_load_id.fetch_add(1, Ordering::SeqCst);
        self.load_attempts.fetch_add(1, Ordering::SeqCst);
        log::info!("loading map engine from {}", self.script_src);

        let inserted = self.insert_stylesheet_once();
        let source = self.source.clone();
        let href = self.stylesheet_href.clone();
        let src = self.script_src.clone();

        let load = async move {
            inserted?;
            source
                .load_stylesheet(&href)
                .await
                .map_err(as_bootstrap_failure)?;
            source.load_module(&src).await.map_err(as_bootstrap_failure)
        }
        .boxed()
        .shared();

        (id, load)
    }

    fn insert_stylesheet_once(&self) -> Result<()> {
        if self.document.has_stylesheet(&self.stylesheet_href) {
            log::debug!("stylesheet {} already present", self.stylesheet_href);
            return Ok(());
        }
        self.document
            .insert_stylesheet(&self.stylesheet_href)
            .map_err(as_bootstrap_failure)
    }

    fn settle(&self, id: u64, result: &Result<Arc<dyn EngineModule>>) {
        let mut state = self.lock_state();
        let current = matches!(&*state, LoaderState::Loading { id: current, .. } if *current == id);
        if !current {
            return;
        }
        *state = match result {
            Ok(module) => {
                log::info!("map engine '{}' ready", module.name());
                LoaderState::Ready(module.clone())
            }
            Err(err) => {
                log::error!("map engine load #{} failed: {}", id, err);
                LoaderState::Idle
            }
        };
    }

    fn lock_state(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn as_bootstrap_failure(err: MapError) -> MapError {
    match err {
        MapError::BootstrapFailure(_) => err,
        other => MapError::BootstrapFailure(other.to_string()),
    }
}

/// Source for an engine that is linked in rather than downloaded
pub struct ReadySource {
    module: Arc<dyn EngineModule>,
}

impl ReadySource {
    pub fn new(module: Arc<dyn EngineModule>) -> Self {
        Self { module }
    }
}

#[async_trait]
impl BootstrapSource for ReadySource {
    async fn load_stylesheet(&self, _href: &str) -> Result<()> {
        Ok(())
    }

    async fn load_module(&self, _src: &str) -> Result<Arc<dyn EngineModule>> {
        Ok(self.module.clone())
    }
}

/// Fetches the stylesheet and script over HTTP before handing out the module
/// they belong to.
pub struct HttpBootstrapSource {
    module: Arc<dyn EngineModule>,
}

impl HttpBootstrapSource {
    pub fn new(module: Arc<dyn EngineModule>) -> Self {
        Self { module }
    }

    async fn fetch(url: &str) -> Result<usize> {
        let response = crate::tiles::loader::HTTP_CLIENT
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|err| MapError::BootstrapFailure(format!("{}: {}", url, err)))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| MapError::BootstrapFailure(format!("{}: {}", url, err)))?;
        Ok(bytes.len())
    }
}

#[async_trait]
impl BootstrapSource for HttpBootstrapSource {
    async fn load_stylesheet(&self, href: &str) -> Result<()> {
        let size = Self::fetch(href).await?;
        log::debug!("stylesheet {} loaded ({} bytes)", href, size);
        Ok(())
    }

    async fn load_module(&self, src: &str) -> Result<Arc<dyn EngineModule>> {
        let size = Self::fetch(src).await?;
        log::debug!("engine script {} loaded ({} bytes)", src, size);
        Ok(self.module.clone())
    }
}

/// In-memory document, records every stylesheet link inserted into it
#[derive(Debug, Default)]
pub struct MemoryDocument {
    links: Mutex<Vec<String>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stylesheet_links(&self) -> Vec<String> {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DocumentHost for MemoryDocument {
    fn has_stylesheet(&self, href: &str) -> bool {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|link| link == href)
    }

    fn insert_stylesheet(&self, href: &str) -> Result<()> {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(href.to_string());
        Ok(())
    }
}

#[cfg(feature = "wasm")]
pub mod web {
    //! Stylesheet insertion into the browser document

    use super::DocumentHost;
    use crate::{MapError, Result};

    pub struct WebDocument;

    fn js_error(err: wasm_bindgen::JsValue) -> MapError {
        MapError::BootstrapFailure(format!("{:?}", err))
    }

    impl DocumentHost for WebDocument {
        fn has_stylesheet(&self, href: &str) -> bool {
            let selector = format!("link[rel=\"stylesheet\"][href=\"{}\"]", href);
            web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.query_selector(&selector).ok().flatten())
                .is_some()
        }

        fn insert_stylesheet(&self, href: &str) -> Result<()> {
            let document = web_sys::window()
                .and_then(|window| window.document())
                .ok_or_else(|| MapError::BootstrapFailure("no document available".into()))?;
            let head = document
                .head()
                .ok_or_else(|| MapError::BootstrapFailure("document has no <head>".into()))?;

            let link = document.create_element("link").map_err(js_error)?;
            link.set_attribute("rel", "stylesheet").map_err(js_error)?;
            link.set_attribute("href", href).map_err(js_error)?;
            head.append_child(&link).map_err(js_error)?;
            Ok(())
        }
    }
}
