//! The map view component: a lifecycle manager wired to the bootstrap loader.
//!
//! Methods take `&self` so that an unmount or a prop update can run while a
//! mount is still waiting on the loader; the lifecycle sorts out which of
//! them wins.

use crate::{
    bootstrap::BootstrapLoader,
    core::{
        config::MapViewConfig,
        geo::Point,
        lifecycle::{BootstrapTicket, EngineLifecycle, LifecyclePhase, MapViewState},
        model::{MapViewProps, MountNode},
    },
    traits::MapEngine,
    ui::{
        controls::{marker_count_label, Attribution, MapControls},
        panel::{ErrorPanel, RetryAction},
    },
    MapError, Result,
};
use std::cell::RefCell;
use std::sync::Arc;

/// What the overlay renders on top of (or instead of) the map
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySnapshot {
    pub phase: LifecyclePhase,
    pub controls_enabled: bool,
    pub marker_count_label: Option<String>,
    pub attribution: Attribution,
    pub error: Option<ErrorPanel>,
    pub viewport_height: Option<String>,
}

pub struct MapView {
    lifecycle: RefCell<EngineLifecycle>,
    loader: Arc<BootstrapLoader>,
    controls: MapControls,
    attribution: Attribution,
}

impl MapView {
    pub fn new(config: MapViewConfig, loader: Arc<BootstrapLoader>) -> Self {
        Self {
            controls: MapControls::from_config(&config),
            attribution: Attribution::from_config(&config),
            lifecycle: RefCell::new(EngineLifecycle::new(config)),
            loader,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.lifecycle.borrow().phase()
    }

    pub fn view_state(&self) -> Option<MapViewState> {
        self.lifecycle.borrow().view_state().cloned()
    }

    pub fn error(&self) -> Option<MapError> {
        self.lifecycle.borrow().error().cloned()
    }

    pub fn is_engine_live(&self) -> bool {
        self.lifecycle.borrow().is_engine_live()
    }

    /// Runs `f` against the live engine, if there is one
    pub fn with_engine<R>(&self, f: impl FnOnce(&dyn MapEngine) -> R) -> Option<R> {
        self.lifecycle.borrow().engine().map(f)
    }

    /// Mounts on `mount`, replacing any previous mount, and waits for the
    /// engine to be created
    pub async fn mount(&self, mount: MountNode, props: MapViewProps) -> Result<()> {
        let ticket = self.lifecycle.borrow_mut().mount(mount, props)?;
        self.bootstrap(ticket).await
    }

    pub async fn update(&self, props: MapViewProps) -> Result<()> {
        let ticket = self.lifecycle.borrow_mut().update(props)?;
        match ticket {
            Some(ticket) => self.bootstrap(ticket).await,
            None => Ok(()),
        }
    }

    pub fn unmount(&self) {
        self.lifecycle.borrow_mut().dispose();
    }

    pub fn layout_settled(&self, size: Point) {
        self.lifecycle.borrow_mut().layout_settled(size);
    }

    pub fn mount_attached(&self, mount: MountNode) -> Result<()> {
        self.lifecycle.borrow_mut().mount_attached(mount)
    }

    /// Runs the retry action of the current error panel
    pub async fn retry(&self) -> Result<()> {
        let action = self
            .lifecycle
            .borrow()
            .error()
            .map(|err| ErrorPanel::from_error(err).action);
        let Some(action) = action else {
            return Ok(());
        };
        log::debug!("retrying map view: {:?}", action);

        if action == RetryAction::Reinitialize {
            let mut lifecycle = self.lifecycle.borrow_mut();
            if lifecycle.phase() == LifecyclePhase::Initializing {
                return lifecycle.retry_initialization();
            }
        }

        // Revalidating remounts, which asks the loader again
        let ticket = self.lifecycle.borrow_mut().revalidate()?;
        self.bootstrap(ticket).await
    }

    pub fn recenter(&self) -> Result<bool> {
        self.controls.recenter(&mut self.lifecycle.borrow_mut())
    }

    pub fn zoom_in(&self) -> Result<bool> {
        self.controls.zoom_in(&mut self.lifecycle.borrow_mut())
    }

    pub fn zoom_out(&self) -> Result<bool> {
        self.controls.zoom_out(&mut self.lifecycle.borrow_mut())
    }

    pub fn zoom_by(&self, delta: i32) -> Result<bool> {
        self.controls.zoom_by(&mut self.lifecycle.borrow_mut(), delta)
    }

    pub fn overlay(&self) -> OverlaySnapshot {
        let lifecycle = self.lifecycle.borrow();
        OverlaySnapshot {
            phase: lifecycle.phase(),
            controls_enabled: self.controls.enabled(&lifecycle),
            marker_count_label: lifecycle.markers().map(marker_count_label),
            attribution: self.attribution.clone(),
            error: lifecycle.error().map(ErrorPanel::from_error),
            viewport_height: lifecycle.props().map(|props| props.viewport_height.clone()),
        }
    }

    async fn bootstrap(&self, ticket: BootstrapTicket) -> Result<()> {
        let outcome = self.loader.ensure_ready().await;
        self.lifecycle.borrow_mut().resolve_bootstrap(ticket, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{MemoryDocument, ReadySource};
    use crate::core::model::{CenterInput, EntityInput};
    use crate::engine::HeadlessModule;

    fn view(module: Arc<HeadlessModule>) -> MapView {
        let config = MapViewConfig::default();
        let loader = BootstrapLoader::new(
            Arc::new(ReadySource::new(module)),
            Arc::new(MemoryDocument::new()),
            &config,
        );
        MapView::new(config, Arc::new(loader))
    }

    fn props() -> MapViewProps {
        MapViewProps::new(
            CenterInput::new("Luxor", 25.6872, 32.6396),
            vec![
                EntityInput::new("1", "Karnak Tours", Some(25.7188), Some(32.6573)),
                EntityInput::new("2", "Nile Cruise", Some(25.6960), Some(32.6430)),
            ],
        )
    }

    #[tokio::test]
    async fn test_overlay_follows_lifecycle() {
        let view = view(Arc::new(HeadlessModule::new()));
        let overlay = view.overlay();
        assert!(!overlay.controls_enabled);
        assert!(overlay.marker_count_label.is_none());
        assert!(!overlay.attribution.text().is_empty());

        view.mount(MountNode::new("map", 800.0, 400.0), props())
            .await
            .unwrap();
        assert!(!view.overlay().controls_enabled);

        view.layout_settled(Point::new(800.0, 400.0));
        let overlay = view.overlay();
        assert!(overlay.controls_enabled);
        assert_eq!(
            overlay.marker_count_label.as_deref(),
            Some("2 businesses shown on map")
        );
        assert_eq!(overlay.viewport_height.as_deref(), Some("400px"));
        assert!(overlay.error.is_none());
    }

    #[tokio::test]
    async fn test_zoom_controls() {
        let view = view(Arc::new(HeadlessModule::new()));
        view.mount(MountNode::new("map", 800.0, 400.0), props())
            .await
            .unwrap();
        view.layout_settled(Point::new(800.0, 400.0));

        assert!(view.recenter().unwrap());
        assert!(view.zoom_in().unwrap());
        assert_eq!(view.view_state().unwrap().zoom, 14.0);
        assert!(view.zoom_out().unwrap());
        assert!(view.zoom_by(-3).unwrap());
        assert_eq!(view.with_engine(|engine| engine.zoom()), Some(10.0));
    }

    #[tokio::test]
    async fn test_invalid_center_shows_panel() {
        let view = view(Arc::new(HeadlessModule::new()));
        let mut bad = props();
        bad.center.latitude = None;

        assert!(view.mount(MountNode::new("map", 800.0, 400.0), bad).await.is_err());
        let overlay = view.overlay();
        assert_eq!(
            overlay.error.map(|panel| panel.action),
            Some(RetryAction::Revalidate)
        );
        assert!(!overlay.controls_enabled);
        assert!(!view.is_engine_live());
    }
}
