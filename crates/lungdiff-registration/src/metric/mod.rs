//! Similarity metrics between a fixed and a transformed moving image.

pub mod trait_;
pub mod mutual_information;

pub use trait_::ImageMetric;
pub use mutual_information::{MutualInformationMetric, MetricSample};
