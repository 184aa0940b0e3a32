pub mod annotator;
pub mod catalog;
pub mod resolver;

pub use annotator::{Markers, TextAnnotator};
pub use catalog::{AliasTable, EntityCatalog, EntitySpec};
pub use resolver::EntityResolver;
