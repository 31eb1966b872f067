pub mod loader;
pub mod source;

// Re-exports for convenience
pub use loader::{TileBatch, TileLoader, TileLoaderConfig};
pub use source::{TemplateTileSource, TileSource};
