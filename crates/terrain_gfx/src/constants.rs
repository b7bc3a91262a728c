use crate::desc::FeatureLevel;
use crate::desc::Format;

/// Triple buffering.
pub const FRAME_BUFFER_COUNT: usize = 3;

/// Far plane distance. Also the depth buffer's clear value.
pub const SCREEN_DEPTH: f32 = 1000.0;
/// Near plane distance, only used for projection math.
pub const SCREEN_NEAR: f32 = 0.1;

pub const DESIRED_FORMAT: Format = Format::R8G8B8A8_UNORM;
pub const DEPTH_FORMAT: Format = Format::D32_FLOAT;

/// Minimum feature level necessary for Direct3D 12 compatibility.
pub const MIN_FEATURE_LEVEL: FeatureLevel = FeatureLevel::LEVEL_11_0;

/// Constant buffer views must be sized and placed in multiples of this.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;
