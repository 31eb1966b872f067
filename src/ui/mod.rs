pub mod controls;
pub mod panel;
pub mod popup;
pub mod widget;

pub use controls::{marker_count_label, Attribution, MapControls};
pub use panel::{ErrorPanel, RetryAction};
pub use popup::{business_count, PopupContent};
pub use widget::{MapView, OverlaySnapshot};
