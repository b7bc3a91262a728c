//! Description structs handed to the backend.
//!
//! Every newtype here carries the numeric value the native API uses, so the
//! Direct3D 12 backend converts them field for field and the validation
//! layer sees exactly what the caller asked for.

pub mod descriptor;
pub mod format;
pub mod pipeline;
pub mod resource;

pub use descriptor::*;
pub use format::*;
pub use pipeline::*;
pub use resource::*;
