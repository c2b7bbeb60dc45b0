mod adapter;
mod backend;
pub mod backends;
pub mod classes;
mod result;

pub use adapter::DetectionAdapter;
pub use backend::DetectorBackend;
pub use backends::{build_backend, ReplayBackend};
pub use result::{BBox, Detection, RawDetection};
