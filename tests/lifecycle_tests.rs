mod common;

use common::{alexandria_props, cairo_props, init_logging};
use mapview::{
    compute_bounds,
    core::geo::Point,
    engine::{HeadlessEngine, HeadlessModule},
    layers::marker::CENTER_MARKER_ID,
    ui::marker_count_label,
    BootstrapTicket, CenterInput, EngineLifecycle, EngineModule, EntityInput, LatLng,
    LifecyclePhase, MapEngine, MapError, MapViewConfig, MapViewProps, MountNode,
};
use proptest::prelude::*;
use std::sync::Arc;

/// Lifecycle scenarios driven without a loader: tickets are resolved by hand
#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    fn node(id: &str) -> MountNode {
        MountNode::new(id, 800.0, 400.0)
    }

    fn resolve(lifecycle: &mut EngineLifecycle, ticket: BootstrapTicket, module: &Arc<HeadlessModule>) {
        let module: Arc<dyn EngineModule> = module.clone();
        lifecycle.resolve_bootstrap(ticket, Ok(module)).unwrap();
    }

    fn headless(lifecycle: &EngineLifecycle) -> &HeadlessEngine {
        lifecycle
            .engine()
            .and_then(|engine| engine.as_any().downcast_ref::<HeadlessEngine>())
            .expect("headless engine")
    }

    #[test]
    fn test_cairo_scenario() {
        init_logging();
        let module = Arc::new(HeadlessModule::new());
        let mut lifecycle = EngineLifecycle::new(MapViewConfig::default());

        let ticket = lifecycle.mount(node("cairo"), cairo_props()).unwrap();
        resolve(&mut lifecycle, ticket, &module);
        lifecycle.layout_settled(Point::new(800.0, 400.0));
        assert_eq!(lifecycle.phase(), LifecyclePhase::Ready);

        let markers = lifecycle.markers().unwrap();
        assert_eq!(markers.mappable_count(), 1);
        assert_eq!(markers.total_entities, 2);
        assert_eq!(marker_count_label(markers), "1 of 2 businesses shown on map");

        let bounds = compute_bounds(markers.center_marker.position, &markers.entity_points());
        assert!(bounds.south_west.lat <= 30.0444 && bounds.north_east.lat >= 30.0454);
        assert!(bounds.south_west.lng <= 31.2357 && bounds.north_east.lng >= 31.2367);

        let engine = headless(&lifecycle);
        let ids: Vec<&str> = engine.markers().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![CENTER_MARKER_ID, "1"]);
        assert!(engine.popup_html("1").unwrap().contains("4.6"));
        // Two points a hundred metres apart fit at a street-level zoom
        assert!(lifecycle.view_state().unwrap().zoom > 13.0);
    }

    #[test]
    fn test_degenerate_bounds_fall_back_to_default_zoom() {
        let module = Arc::new(HeadlessModule::new());
        let mut lifecycle = EngineLifecycle::new(MapViewConfig::default());

        let props = MapViewProps::new(
            CenterInput::new("Aswan", 24.0889, 32.8998),
            vec![
                EntityInput::new("1", "No coords", None, None),
                EntityInput::new("2", "Bad coords", Some(f64::NAN), Some(32.9)),
            ],
        );
        let ticket = lifecycle.mount(node("aswan"), props).unwrap();
        resolve(&mut lifecycle, ticket, &module);
        lifecycle.layout_settled(Point::new(800.0, 400.0));

        let state = lifecycle.view_state().unwrap();
        assert_eq!(state.zoom, 13.0);
        assert!(state.mounted_markers.is_empty());
        assert_eq!(headless(&lifecycle).center(), LatLng::new(24.0889, 32.8998));

        // Entities sitting exactly on the center are just as degenerate
        let stacked = MapViewProps::new(
            CenterInput::new("Aswan", 24.0889, 32.8998),
            vec![EntityInput::new("3", "Same spot", Some(24.0889), Some(32.8998))],
        );
        lifecycle.update(stacked).unwrap();
        assert_eq!(lifecycle.view_state().unwrap().zoom, 13.0);
    }

    #[test]
    fn test_country_profile_default_zoom() {
        let module = Arc::new(HeadlessModule::new());
        let config = mapview::MapViewProfile::from(mapview::CenterKind::Country).resolve();
        let mut lifecycle = EngineLifecycle::new(config);

        let props = MapViewProps::new(
            CenterInput::new("Egypt", 26.8206, 30.8025).with_kind(mapview::CenterKind::Country),
            Vec::new(),
        );
        let ticket = lifecycle.mount(node("egypt"), props).unwrap();
        resolve(&mut lifecycle, ticket, &module);
        lifecycle.layout_settled(Point::new(800.0, 400.0));
        assert_eq!(lifecycle.view_state().unwrap().zoom, 6.0);
    }

    #[test]
    fn test_updates_while_bootstrapping_apply_latest() {
        let module = Arc::new(HeadlessModule::new());
        let mut lifecycle = EngineLifecycle::new(MapViewConfig::default());

        let ticket = lifecycle.mount(node("map"), cairo_props()).unwrap();
        assert_eq!(lifecycle.update(alexandria_props()).unwrap(), None);
        let latest = MapViewProps::new(CenterInput::new("Giza", 30.0131, 31.2089), Vec::new());
        assert_eq!(lifecycle.update(latest).unwrap(), None);

        resolve(&mut lifecycle, ticket, &module);
        assert_eq!(lifecycle.view_state().unwrap().center.label, "Giza");
        assert_eq!(module.stats().created(), 1);
    }

    #[test]
    fn test_node_change_supersedes_pending_mount() {
        let module = Arc::new(HeadlessModule::new());
        let mut lifecycle = EngineLifecycle::new(MapViewConfig::default());

        let first = lifecycle.mount(node("cairo"), cairo_props()).unwrap();
        let second = lifecycle.mount(node("alexandria"), alexandria_props()).unwrap();
        assert_ne!(first, second);

        resolve(&mut lifecycle, second, &module);
        // The older load finishing late must not replace the newer engine
        resolve(&mut lifecycle, first, &module);

        assert_eq!(module.stats().created(), 1);
        assert_eq!(headless(&lifecycle).container_id(), "alexandria");
        assert_eq!(lifecycle.view_state().unwrap().center.label, "Alexandria");
    }

    #[test]
    fn test_node_change_disposes_live_engine() {
        let module = Arc::new(HeadlessModule::new());
        let stats = module.stats();
        let mut lifecycle = EngineLifecycle::new(MapViewConfig::default());

        let ticket = lifecycle.mount(node("cairo"), cairo_props()).unwrap();
        resolve(&mut lifecycle, ticket, &module);
        assert_eq!(stats.live(), 1);

        let ticket = lifecycle.mount(node("alexandria"), alexandria_props()).unwrap();
        assert_eq!(stats.live(), 0);
        assert!(!lifecycle.is_engine_live());
        resolve(&mut lifecycle, ticket, &module);
        assert_eq!(stats.live(), 1);

        lifecycle.dispose();
        assert_eq!(stats.created(), 2);
        assert_eq!(stats.destroyed(), 2);
    }

    #[test]
    fn test_failed_update_does_not_leak_engine() {
        let module = Arc::new(HeadlessModule::new());
        let stats = module.stats();
        let mut lifecycle = EngineLifecycle::new(MapViewConfig::default());

        let ticket = lifecycle.mount(node("map"), cairo_props()).unwrap();
        resolve(&mut lifecycle, ticket, &module);
        lifecycle.layout_settled(Point::new(800.0, 400.0));

        let mut broken = alexandria_props();
        broken.center.latitude = Some(f64::INFINITY);
        let err = lifecycle.update(broken).unwrap_err();
        assert!(matches!(err, MapError::InvalidCenterCoordinates { .. }));
        assert_eq!(stats.live(), 0);
        assert!(lifecycle.engine().is_none());
        assert!(lifecycle.view_state().is_none());
    }

    #[test]
    fn test_init_failure_on_new_node_after_engine_existed() {
        let module = Arc::new(HeadlessModule::new());
        let stats = module.stats();
        let mut lifecycle = EngineLifecycle::new(MapViewConfig::default());

        let ticket = lifecycle.mount(node("map"), cairo_props()).unwrap();
        resolve(&mut lifecycle, ticket, &module);

        let ticket = lifecycle
            .mount(MountNode::detached("popup-map", 300.0, 200.0), cairo_props())
            .unwrap();
        let dyn_module: Arc<dyn EngineModule> = module.clone();
        assert!(lifecycle.resolve_bootstrap(ticket, Ok(dyn_module)).is_err());

        assert_eq!(stats.live(), 0);
        assert_eq!(stats.failed_creates(), 1);
        lifecycle.dispose();
        assert_eq!(stats.created(), stats.destroyed());
    }

    #[test]
    fn test_bootstrap_failure_leaves_nothing_to_clean_up() {
        let mut lifecycle = EngineLifecycle::new(MapViewConfig::default());
        let ticket = lifecycle.mount(node("map"), cairo_props()).unwrap();

        let err = lifecycle
            .resolve_bootstrap(ticket, Err(MapError::BootstrapFailure("offline".into())))
            .unwrap_err();
        assert!(matches!(err, MapError::BootstrapFailure(_)));
        assert_eq!(lifecycle.phase(), LifecyclePhase::Unmounted);
        assert!(!lifecycle.is_engine_live());
        assert!(lifecycle.error().is_some());

        // Corrected state is reachable again through revalidation
        let ticket = lifecycle.revalidate().unwrap();
        assert_eq!(lifecycle.phase(), LifecyclePhase::Bootstrapping);
        let module = Arc::new(HeadlessModule::new());
        resolve(&mut lifecycle, ticket, &module);
        assert!(lifecycle.error().is_none());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Update { valid_center: bool, entities: usize },
        Remount(u8),
        Resolve(usize),
        Settle,
        Dispose,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<bool>(), 0usize..5)
                .prop_map(|(valid_center, entities)| Op::Update { valid_center, entities }),
            (0u8..3).prop_map(Op::Remount),
            (0usize..8).prop_map(Op::Resolve),
            Just(Op::Settle),
            Just(Op::Dispose),
        ]
    }

    fn props(valid_center: bool, entities: usize) -> MapViewProps {
        let mut center = CenterInput::new("Cairo", 30.0444, 31.2357);
        if !valid_center {
            center.longitude = None;
        }
        let entities: Vec<EntityInput> = (0..entities)
            .map(|i| {
                let offset = i as f64 * 0.01;
                EntityInput::new(i.to_string(), format!("Shop {}", i), Some(30.0 + offset), Some(31.2 + offset))
            })
            .collect();
        MapViewProps::new(center, entities)
    }

    proptest! {
        #[test]
        fn engines_never_leak(ops in prop::collection::vec(op(), 1..40)) {
            let module = Arc::new(HeadlessModule::new());
            let stats = module.stats();
            let mut lifecycle = EngineLifecycle::new(MapViewConfig::default());
            let mut tickets = Vec::new();

            if let Ok(ticket) = lifecycle.mount(node("map-0"), props(true, 2)) {
                tickets.push(ticket);
            }

            for op in ops {
                match op {
                    Op::Update { valid_center, entities } => {
                        if let Ok(Some(ticket)) = lifecycle.update(props(valid_center, entities)) {
                            tickets.push(ticket);
                        }
                    }
                    Op::Remount(id) => {
                        if let Ok(ticket) = lifecycle.mount(node(&format!("map-{}", id)), props(true, 1)) {
                            tickets.push(ticket);
                        }
                    }
                    Op::Resolve(index) => {
                        if !tickets.is_empty() {
                            let ticket = tickets[index % tickets.len()];
                            let dyn_module: Arc<dyn EngineModule> = module.clone();
                            let _ = lifecycle.resolve_bootstrap(ticket, Ok(dyn_module));
                        }
                    }
                    Op::Settle => lifecycle.layout_settled(Point::new(800.0, 400.0)),
                    Op::Dispose => lifecycle.dispose(),
                }
                prop_assert!(stats.live() <= 1);
                prop_assert_eq!(stats.live(), usize::from(lifecycle.is_engine_live()));
            }

            lifecycle.dispose();
            prop_assert_eq!(stats.created(), stats.destroyed());
            prop_assert_eq!(lifecycle.phase(), LifecyclePhase::Unmounted);
        }

        #[test]
        fn invalid_entities_never_reach_the_map(valid in 0usize..12, invalid in 0usize..12) {
            let mut entities = Vec::new();
            for i in 0..valid.max(invalid) {
                if i < valid {
                    entities.push(EntityInput::new(format!("v{}", i), "Valid", Some(30.0 + i as f64 * 0.001), Some(31.0)));
                }
                if i < invalid {
                    let (lat, lng) = match i % 3 {
                        0 => (None, Some(31.0)),
                        1 => (Some(f64::NAN), Some(31.0)),
                        _ => (Some(30.0), Some(f64::NEG_INFINITY)),
                    };
                    entities.push(EntityInput::new(format!("x{}", i), "Invalid", lat, lng));
                }
            }

            let module = Arc::new(HeadlessModule::new());
            let mut lifecycle = EngineLifecycle::new(MapViewConfig::default());
            let props = MapViewProps::new(CenterInput::new("Cairo", 30.0444, 31.2357), entities);
            let ticket = lifecycle.mount(node("map"), props).unwrap();
            resolve(&mut lifecycle, ticket, &module);

            let markers = lifecycle.markers().unwrap();
            prop_assert_eq!(markers.mappable_count(), valid);
            prop_assert_eq!(markers.total_entities, valid + invalid);
            prop_assert_eq!(headless(&lifecycle).markers().len(), valid + 1);
            prop_assert!(marker_count_label(markers).starts_with(&valid.to_string()));
        }
    }
}
