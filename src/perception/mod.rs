/// Perception dataset loading
///
/// This module reads the JSON metadata written by the Perception package
/// (captures, metrics and their definitions) and exposes it as filterable tables.
pub mod error;
pub mod parser;
pub mod tables;

#[cfg(test)]
pub mod fixtures;

pub use error::DatasetError;
pub use tables::{BBox2D, CaptureAnnotation, Captures, Definitions, MetricValue, Metrics};

/// Definition ids used by the SynthDet datasets
pub mod definitions {
    pub const BOUNDING_BOX: &str = "f9f22e05-443f-4602-a422-ebe4ea9b55cb";
    pub const SEMANTIC_SEGMENTATION: &str = "12f94d8d-5425-4deb-9b21-5e53ad957d66";
    pub const RENDERED_OBJECT_INFO: &str = "5ba92024-b3b7-41a7-9d3f-c03a6a8ddd01";
    pub const OBJECT_COUNT: &str = "51da3c27-369d-4929-aea6-d01614635ce2";
}
