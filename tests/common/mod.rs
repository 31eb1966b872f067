#![allow(dead_code)]

use async_trait::async_trait;
use mapview::{
    bootstrap::{BootstrapLoader, BootstrapSource, MemoryDocument},
    engine::HeadlessModule,
    CenterInput, EngineModule, EntityInput, MapError, MapView, MapViewConfig, MapViewProps,
};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Bootstrap source whose module load waits for [`GatedSource::release`]
pub struct GatedSource {
    pub module: Arc<HeadlessModule>,
    gate: Semaphore,
    failures_left: AtomicU32,
    pub stylesheet_loads: AtomicUsize,
    pub module_loads: AtomicUsize,
}

impl GatedSource {
    pub fn open() -> Self {
        Self::with_permits(1)
    }

    pub fn closed() -> Self {
        Self::with_permits(0)
    }

    fn with_permits(permits: usize) -> Self {
        Self {
            module: Arc::new(HeadlessModule::new()),
            gate: Semaphore::new(permits),
            failures_left: AtomicU32::new(0),
            stylesheet_loads: AtomicUsize::new(0),
            module_loads: AtomicUsize::new(0),
        }
    }

    pub fn failing_first(self, failures: u32) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn module_loads(&self) -> usize {
        self.module_loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BootstrapSource for GatedSource {
    async fn load_stylesheet(&self, _href: &str) -> mapview::Result<()> {
        self.stylesheet_loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_module(&self, _src: &str) -> mapview::Result<Arc<dyn EngineModule>> {
        self.module_loads.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|err| MapError::BootstrapFailure(err.to_string()))?;

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(MapError::Network("leaflet.js blocked".into()));
        }
        let module: Arc<dyn EngineModule> = self.module.clone();
        Ok(module)
    }
}

pub struct Harness {
    pub source: Arc<GatedSource>,
    pub document: Arc<MemoryDocument>,
    pub loader: Arc<BootstrapLoader>,
}

impl Harness {
    pub fn new(source: GatedSource) -> Self {
        init_logging();
        let source = Arc::new(source);
        let document = Arc::new(MemoryDocument::new());
        let loader = Arc::new(BootstrapLoader::new(
            source.clone(),
            document.clone(),
            &MapViewConfig::default(),
        ));
        Self {
            source,
            document,
            loader,
        }
    }

    pub fn view(&self) -> MapView {
        MapView::new(MapViewConfig::default(), self.loader.clone())
    }
}

pub fn cairo_props() -> MapViewProps {
    MapViewProps::new(
        CenterInput::new("Cairo", 30.0444, 31.2357),
        vec![
            EntityInput::new("1", "Koshary Abou Tarek", Some(30.0454), Some(31.2367))
                .with_attribute("category", "Restaurant")
                .with_attribute("rating", 4.6),
            EntityInput::new("2", "Khan el-Khalili Lamps", None, Some(31.20)),
        ],
    )
}

pub fn alexandria_props() -> MapViewProps {
    MapViewProps::new(
        CenterInput::new("Alexandria", 31.2001, 29.9187),
        vec![
            EntityInput::new("10", "Qaitbay Seafood", Some(31.2140), Some(29.8856)),
            EntityInput::new("11", "Library Cafe", Some(31.2089), Some(29.9092)),
            EntityInput::new("12", "Corniche Juice", Some(31.2156), Some(29.9553)),
        ],
    )
}
