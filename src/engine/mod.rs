//! Engine implementations shipped with the crate

pub mod headless;

pub use headless::{EngineStats, HeadlessEngine, HeadlessModule};
