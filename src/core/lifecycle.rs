//! Engine lifecycle manager.
//!
//! Owns the one engine a map view may have, moves it through
//! `Unmounted -> Bootstrapping -> Initializing -> Ready <-> Updating ->
//! Disposing -> Unmounted`, and is the only place that creates, mutates or
//! destroys it.
//!
//! Bootstrap is the only asynchronous step. [`EngineLifecycle::mount`] hands
//! out a [`BootstrapTicket`]; the caller awaits the loader and feeds the
//! outcome back through [`EngineLifecycle::resolve_bootstrap`]. Every
//! mount, dispose and error-path teardown advances the generation, so a
//! resolution carrying an older ticket is dropped.

use crate::{
    core::{
        bounds::ViewportFit,
        config::MapViewConfig,
        geo::Point,
        model::{MapViewProps, MountNode},
    },
    layers::marker::{build_markers, CenterPoint, EntityMarker, MarkerSet},
    traits::{EngineModule, MapEngine},
    MapError, Result,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Unmounted,
    Bootstrapping,
    Initializing,
    Ready,
    Updating,
    Disposing,
}

impl LifecyclePhase {
    /// Overlay controls only act on a ready engine
    pub fn accepts_commands(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Proof of which mount a bootstrap request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BootstrapTicket {
    generation: u64,
}

impl BootstrapTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Exclusive ownership of one live engine bound to one mount node.
///
/// The engine is destroyed exactly once, either through [`dispose`](Self::dispose)
/// or when the handle is dropped.
pub struct EngineHandle {
    engine: Box<dyn MapEngine>,
    mount_id: String,
    disposed: bool,
}

impl EngineHandle {
    fn new(engine: Box<dyn MapEngine>, mount_id: String) -> Self {
        Self {
            engine,
            mount_id,
            disposed: false,
        }
    }

    pub fn mount_id(&self) -> &str {
        &self.mount_id
    }

    pub fn engine(&self) -> &dyn MapEngine {
        self.engine.as_ref()
    }

    fn engine_mut(&mut self) -> &mut dyn MapEngine {
        self.engine.as_mut()
    }

    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.engine.destroy();
        log::info!("engine on '{}' destroyed", self.mount_id);
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("mount_id", &self.mount_id)
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// Live session state of the engine, owned by the lifecycle manager
#[derive(Debug, Clone, PartialEq)]
pub struct MapViewState {
    pub center: CenterPoint,
    pub zoom: f64,
    pub mounted_markers: Vec<EntityMarker>,
}

pub struct EngineLifecycle {
    config: MapViewConfig,
    phase: LifecyclePhase,
    generation: u64,
    mount: Option<MountNode>,
    props: Option<MapViewProps>,
    markers: Option<MarkerSet>,
    module: Option<Arc<dyn EngineModule>>,
    handle: Option<EngineHandle>,
    state: Option<MapViewState>,
    settled_size: Option<Point>,
    init_attempts: u32,
    error: Option<MapError>,
}

impl EngineLifecycle {
    pub fn new(config: MapViewConfig) -> Self {
        Self {
            config,
            phase: LifecyclePhase::Unmounted,
            generation: 0,
            mount: None,
            props: None,
            markers: None,
            module: None,
            handle: None,
            state: None,
            settled_size: None,
            init_attempts: 0,
            error: None,
        }
    }

    pub fn config(&self) -> &MapViewConfig {
        &self.config
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn view_state(&self) -> Option<&MapViewState> {
        self.state.as_ref()
    }

    /// Marker set derived from the current props, even before the engine exists
    pub fn markers(&self) -> Option<&MarkerSet> {
        self.markers.as_ref()
    }

    pub fn props(&self) -> Option<&MapViewProps> {
        self.props.as_ref()
    }

    pub fn mount_node(&self) -> Option<&MountNode> {
        self.mount.as_ref()
    }

    pub fn error(&self) -> Option<&MapError> {
        self.error.as_ref()
    }

    pub fn engine(&self) -> Option<&dyn MapEngine> {
        self.handle.as_ref().map(EngineHandle::engine)
    }

    pub fn is_engine_live(&self) -> bool {
        self.handle.is_some()
    }

    pub fn init_attempts(&self) -> u32 {
        self.init_attempts
    }

    /// Starts a mount on `mount` with `props`.
    ///
    /// Whatever was mounted before is disposed first. An invalid center is
    /// reported right away and no bootstrap is requested.
    pub fn mount(&mut self, mount: MountNode, props: MapViewProps) -> Result<BootstrapTicket> {
        self.dispose();
        log::debug!("mounting map view on '{}'", mount.id);
        self.mount = Some(mount);
        self.begin(props)
    }

    /// Mounts again with the stored node and props, re-validating the center
    pub fn revalidate(&mut self) -> Result<BootstrapTicket> {
        let mount = self
            .mount
            .clone()
            .ok_or_else(|| MapError::Engine("map view has no mount node".into()))?;
        let props = self
            .props
            .clone()
            .ok_or_else(|| MapError::Engine("map view has no props".into()))?;
        self.teardown();
        self.mount = Some(mount);
        self.begin(props)
    }

    fn begin(&mut self, props: MapViewProps) -> Result<BootstrapTicket> {
        self.error = None;
        let center = match props.center.validate() {
            Ok(center) => center,
            Err(err) => {
                log::warn!("not mounting: {}", err);
                self.props = Some(props);
                self.error = Some(err.clone());
                return Err(err);
            }
        };

        self.markers = Some(build_markers(&props.center, center, &props.entities));
        self.props = Some(props);
        self.phase = LifecyclePhase::Bootstrapping;
        log::debug!("generation {} bootstrapping", self.generation);
        Ok(BootstrapTicket {
            generation: self.generation,
        })
    }

    /// Applies the outcome of the bootstrap load requested by `ticket`.
    ///
    /// A resolution for a disposed or superseded mount is a no-op.
    pub fn resolve_bootstrap(
        &mut self,
        ticket: BootstrapTicket,
        outcome: Result<Arc<dyn EngineModule>>,
    ) -> Result<()> {
        if ticket.generation != self.generation || self.phase != LifecyclePhase::Bootstrapping {
            log::warn!(
                "dropping bootstrap resolution for generation {} (current {}, {:?})",
                ticket.generation,
                self.generation,
                self.phase
            );
            return Ok(());
        }

        match outcome {
            Ok(module) => {
                self.module = Some(module);
                self.init_attempts = 0;
                self.phase = LifecyclePhase::Initializing;
                self.initialize()
            }
            Err(err) => {
                log::error!("bootstrap failed: {}", err);
                self.phase = LifecyclePhase::Unmounted;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn initialize(&mut self) -> Result<()> {
        let (Some(module), Some(mount), Some(markers)) =
            (self.module.clone(), self.mount.clone(), self.markers.clone())
        else {
            return Ok(());
        };

        self.init_attempts += 1;
        let engine = match module.create(&mount, markers.center_marker.position, self.config.default_zoom) {
            Ok(engine) => engine,
            Err(err) => return Err(self.record_init_failure(err)),
        };
        log::info!(
            "{} engine created on '{}' (attempt {})",
            module.name(),
            mount.id,
            self.init_attempts
        );

        let mut handle = EngineHandle::new(engine, mount.id.clone());
        if let Err(err) = apply_markers(handle.engine_mut(), &markers, &self.config) {
            handle.dispose();
            return Err(self.fail(err));
        }

        self.error = None;
        self.handle = Some(handle);
        self.sync_state();

        if let Some(size) = self.settled_size.take() {
            self.layout_settled(size);
        }
        Ok(())
    }

    fn record_init_failure(&mut self, err: MapError) -> MapError {
        let failure = MapError::EngineInitializationFailure {
            attempts: self.init_attempts,
            reason: err.to_string(),
        };
        if self.init_attempts >= self.config.max_init_attempts {
            log::error!("giving up on engine creation: {}", failure);
            self.phase = LifecyclePhase::Unmounted;
            self.module = None;
        } else {
            log::warn!(
                "engine creation attempt {}/{} failed: {}",
                self.init_attempts,
                self.config.max_init_attempts,
                err
            );
        }
        self.error = Some(failure.clone());
        failure
    }

    /// Tries engine creation again while initialization is pending
    pub fn retry_initialization(&mut self) -> Result<()> {
        if self.phase != LifecyclePhase::Initializing || self.handle.is_some() {
            return Ok(());
        }
        self.initialize()
    }

    /// Reports that the mount node is now attached and retries creation
    ///
    /// Ignored once the view is disposed.
    pub fn mount_attached(&mut self, mount: MountNode) -> Result<()> {
        let Some(current) = &self.mount else {
            log::debug!("ignoring attach of '{}' on a disposed view", mount.id);
            return Ok(());
        };
        if current.id != mount.id {
            return Err(MapError::Engine(format!(
                "'{}' is not the node this view is mounted on ('{}')",
                mount.id, current.id
            )));
        }
        self.mount = Some(mount);
        self.retry_initialization()
    }

    /// The mount node's final on-screen size is known.
    ///
    /// Finishes initialization when the engine exists; otherwise the size is
    /// kept and applied as soon as the engine is created.
    pub fn layout_settled(&mut self, size: Point) {
        if let Some(mount) = self.mount.as_mut() {
            mount.size = size;
        }

        let phase = self.phase;
        if self.handle.is_none() {
            if matches!(phase, LifecyclePhase::Bootstrapping | LifecyclePhase::Initializing) {
                self.settled_size = Some(size);
            }
            return;
        }

        if let Some(handle) = self.handle.as_mut() {
            handle.engine_mut().invalidate_size(size);
            if phase == LifecyclePhase::Initializing {
                // The pixel size changed, so the first fit is stale
                let refit = match &self.markers {
                    Some(markers) => fit_view(handle.engine_mut(), markers, &self.config),
                    None => Ok(()),
                };
                if let Err(err) = refit {
                    self.fail(err);
                    return;
                }
                self.phase = LifecyclePhase::Ready;
                log::debug!("generation {} ready", self.generation);
            }
        }
        self.sync_state();
    }

    /// Applies new props.
    ///
    /// The live engine is reused: its markers are replaced and the view is
    /// re-fitted. Returns a ticket when the update had to start a new mount.
    ///
    /// Props identical to the current ones do nothing, including after a
    /// failure: only changed inputs or an explicit retry start over.
    pub fn update(&mut self, props: MapViewProps) -> Result<Option<BootstrapTicket>> {
        if let Some(current) = &self.props {
            if current.same_identity(&props) {
                self.props = Some(props);
                return Ok(None);
            }
        }

        let center = match props.center.validate() {
            Ok(center) => center,
            Err(err) => {
                self.props = Some(props);
                return Err(self.fail(err));
            }
        };

        match self.phase {
            LifecyclePhase::Unmounted => match self.mount.clone() {
                Some(mount) => {
                    self.teardown();
                    self.mount = Some(mount);
                    self.begin(props).map(Some)
                }
                None => {
                    self.props = Some(props);
                    Ok(None)
                }
            },
            LifecyclePhase::Ready | LifecyclePhase::Initializing if self.handle.is_some() => {
                let settled = self.phase;
                self.phase = LifecyclePhase::Updating;
                let markers = build_markers(&props.center, center, &props.entities);
                self.props = Some(props);

                let applied = match self.handle.as_mut() {
                    Some(handle) => apply_markers(handle.engine_mut(), &markers, &self.config),
                    None => Ok(()),
                };
                if let Err(err) = applied {
                    return Err(self.fail(err));
                }
                log::debug!(
                    "markers replaced: {} of {} mappable",
                    markers.mappable_count(),
                    markers.total_entities
                );
                self.markers = Some(markers);
                self.phase = settled;
                self.sync_state();
                Ok(None)
            }
            _ => {
                // Not created yet; creation picks up the latest markers
                self.markers = Some(build_markers(&props.center, center, &props.entities));
                self.props = Some(props);
                Ok(None)
            }
        }
    }

    /// Re-centers on the center point at the default zoom.
    ///
    /// Returns `false` without touching anything unless the engine is ready.
    pub fn recenter(&mut self) -> Result<bool> {
        if !self.phase.accepts_commands() {
            return Ok(false);
        }
        let (Some(handle), Some(markers)) = (self.handle.as_mut(), &self.markers) else {
            return Ok(false);
        };
        let engine = handle.engine_mut();
        let zoom = clamp_zoom(engine, &self.config, self.config.default_zoom);
        engine.set_view(markers.center_marker.position, zoom)?;
        self.sync_state();
        Ok(true)
    }

    /// Changes the zoom by `delta` levels, clamped to the configured range
    /// and the engine's
    pub fn zoom_by(&mut self, delta: i32) -> Result<bool> {
        if !self.phase.accepts_commands() {
            return Ok(false);
        }
        let Some(handle) = self.handle.as_mut() else {
            return Ok(false);
        };
        let engine = handle.engine_mut();
        let zoom = clamp_zoom(engine, &self.config, engine.zoom() + f64::from(delta));
        let center = engine.center();
        engine.set_view(center, zoom)?;
        self.sync_state();
        Ok(true)
    }

    /// Destroys the engine and forgets the mount.
    ///
    /// Synchronous: when it returns the phase is `Unmounted` and no engine is
    /// reachable. Any bootstrap still in flight resolves into a no-op.
    pub fn dispose(&mut self) {
        if self.phase != LifecyclePhase::Unmounted || self.handle.is_some() {
            log::debug!("disposing generation {}", self.generation);
        }
        self.teardown();
        self.mount = None;
        self.props = None;
        self.error = None;
    }

    fn teardown(&mut self) {
        self.phase = LifecyclePhase::Disposing;
        if let Some(handle) = self.handle.take() {
            handle.dispose();
        }
        self.generation += 1;
        self.module = None;
        self.markers = None;
        self.state = None;
        self.settled_size = None;
        self.init_attempts = 0;
        self.phase = LifecyclePhase::Unmounted;
    }

    /// Error path after work has started: release everything the engine
    /// holds but keep the mount and props for a retry.
    fn fail(&mut self, err: MapError) -> MapError {
        log::error!("map view failed: {}", err);
        self.teardown();
        self.error = Some(err.clone());
        err
    }

    fn sync_state(&mut self) {
        self.state = match (&self.handle, &self.markers) {
            (Some(handle), Some(markers)) => Some(MapViewState {
                center: markers.center_marker.clone(),
                zoom: handle.engine().zoom(),
                mounted_markers: markers.entity_markers.clone(),
            }),
            _ => None,
        };
    }
}

impl Drop for EngineLifecycle {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn apply_markers(engine: &mut dyn MapEngine, markers: &MarkerSet, config: &MapViewConfig) -> Result<()> {
    engine.clear_markers();
    for marker in markers.render_markers() {
        engine.add_marker(&marker)?;
    }
    fit_view(engine, markers, config)
}

fn fit_view(engine: &mut dyn MapEngine, markers: &MarkerSet, config: &MapViewConfig) -> Result<()> {
    match ViewportFit::for_markers(markers, config.fit_padding_px, config.default_zoom) {
        ViewportFit::Fit { bounds, padding_px } => {
            engine.fit_bounds(&bounds, padding_px)?;
            let fitted = engine.zoom();
            let zoom = clamp_zoom(engine, config, fitted);
            if zoom != fitted {
                let center = engine.center();
                engine.set_view(center, zoom)?;
            }
            Ok(())
        }
        ViewportFit::Center { center, zoom } => {
            let zoom = clamp_zoom(engine, config, zoom);
            engine.set_view(center, zoom)
        }
    }
}

/// Clamps to the configured zoom range, then to what the engine supports
fn clamp_zoom(engine: &dyn MapEngine, config: &MapViewConfig, zoom: f64) -> f64 {
    let (min_zoom, max_zoom) = engine.zoom_range();
    config.clamp_zoom(zoom).clamp(min_zoom, max_zoom)
}
