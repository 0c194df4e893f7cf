//! Spatial transforms mapping physical points to physical points.

pub mod trait_;
pub mod identity;
pub mod translation;
pub mod affine;
pub mod displacement_field;

pub use trait_::Transform;
pub use identity::IdentityTransform;
pub use translation::TranslationTransform;
pub use affine::AffineTransform;
pub use displacement_field::DisplacementField;
