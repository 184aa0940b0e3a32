pub mod record;
pub mod stance;

pub use record::{AnnotatedRecord, ExpandedRow, NO_ENTITY};
pub use stance::Stance;
