pub mod html;
pub mod model;
pub mod structured;

pub use model::{MetadataCandidate, MetadataSource};
