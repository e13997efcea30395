//! Test images and manipulation
//!
//! Provides:
//! - Lookup of local test images by identifier
//! - The manipulator interface and the dummy back-end

mod manipulator;
mod store;

pub use manipulator::{DummyManipulator, ManipulatedImage, Manipulator, LEVEL0_COMPLIANCE};
pub use store::TestImageStore;
