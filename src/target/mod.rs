pub mod descriptor;
pub mod id;

pub use descriptor::{DriverFamily, LegacyLayout, Locator, TargetDescriptor, TreeLayout, descriptor, descriptors};
pub use id::TargetId;
