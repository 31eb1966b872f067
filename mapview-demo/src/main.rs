use anyhow::{Context, Result};
use mapview::{
    bootstrap::{BootstrapSource, HttpBootstrapSource, MemoryDocument, ReadySource},
    engine::{HeadlessEngine, HeadlessModule},
    tiles::{TemplateTileSource, TileLoader},
    BootstrapLoader, CenterInput, EntityInput, MapView, MapViewConfig, MapViewProfile,
    MapViewProps, MountNode,
};
use mapview::core::geo::Point;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_FIXTURE: &str = include_str!("../fixtures/cairo.json");
const MOUNT_WIDTH: f64 = 960.0;
const MOUNT_HEIGHT: f64 = 480.0;

/// A page's worth of map input
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    center: CenterInput,
    #[serde(default)]
    entities: Vec<EntityInput>,
    viewport_height: Option<String>,
    config: Option<MapViewConfig>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let mut fixture_path = None;
    let mut fetch_tiles = false;
    let mut http_bootstrap = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fetch-tiles" => fetch_tiles = true,
            "--http-bootstrap" => http_bootstrap = true,
            _ => fixture_path = Some(arg),
        }
    }

    let json = match &fixture_path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?,
        None => DEFAULT_FIXTURE.to_string(),
    };
    let fixture: Fixture = serde_json::from_str(&json).context("parsing fixture")?;

    let config = match fixture.config {
        Some(config) => config,
        None => MapViewProfile::from(fixture.center.kind).resolve(),
    };
    config.validate()?;

    let tiles = TemplateTileSource::from_config(&config);
    let module = Arc::new(HeadlessModule::new().with_tile_source(Arc::new(tiles.clone())));
    let stats = module.stats();
    let source: Arc<dyn BootstrapSource> = if http_bootstrap {
        Arc::new(HttpBootstrapSource::new(module))
    } else {
        Arc::new(ReadySource::new(module))
    };
    let loader = BootstrapLoader::new(source, Arc::new(MemoryDocument::new()), &config);
    let view = MapView::new(config, Arc::new(loader));

    let mut props = MapViewProps::new(fixture.center, fixture.entities);
    if let Some(height) = fixture.viewport_height {
        props = props.with_viewport_height(height);
    }

    if let Err(err) = view
        .mount(MountNode::new("map", MOUNT_WIDTH, MOUNT_HEIGHT), props)
        .await
    {
        log::error!("mount failed: {}", err);
    }
    view.layout_settled(Point::new(MOUNT_WIDTH, MOUNT_HEIGHT));

    let overlay = view.overlay();
    println!("phase: {:?}", overlay.phase);
    if let Some(panel) = &overlay.error {
        println!("{}: {} [{}]", panel.title, panel.message, panel.retry_label());
    }
    if let Some(label) = &overlay.marker_count_label {
        println!("{}", label);
    }
    if let Some(state) = view.view_state() {
        println!(
            "center: {} ({:.4}, {:.4}) zoom {}",
            state.center.label, state.center.position.lat, state.center.position.lng, state.zoom
        );
    }

    let (popups, visible_tiles) = view
        .with_engine(|engine| {
            engine
                .as_any()
                .downcast_ref::<HeadlessEngine>()
                .map(|headless| {
                    let popups: Vec<String> = headless
                        .markers()
                        .iter()
                        .map(|marker| format!("[{}] {}", marker.role, marker.popup.to_text()))
                        .collect();
                    for url in headless.tile_urls() {
                        log::debug!("tile {}", url);
                    }
                    (popups, headless.visible_tiles())
                })
        })
        .flatten()
        .unwrap_or_default();

    for popup in popups {
        println!("\n{}", popup);
    }
    println!("\n{} tiles in view", visible_tiles.len());

    if fetch_tiles {
        let batch = TileLoader::default().fetch_tiles(&tiles, &visible_tiles).await;
        println!(
            "fetched {} tiles, {} failed",
            batch.loaded.len(),
            batch.failed.len()
        );
    }
    println!("{}", overlay.attribution.text());

    view.unmount();
    log::info!(
        "engines created {}, destroyed {}",
        stats.created(),
        stats.destroyed()
    );
    Ok(())
}
