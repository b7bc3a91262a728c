use bevy_math::Mat4;

use crate::constants::SCREEN_DEPTH;
use crate::constants::SCREEN_NEAR;

/// Mirrors `D3D12_VIEWPORT`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Covers the whole `width` x `height` target with the full depth range.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            top_left_x: 0.0,
            top_left_y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

/// Mirrors `D3D12_RECT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct ScissorRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScissorRect {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width as i32,
            bottom: height as i32,
        }
    }
}

/// Left-handed perspective projection between the screen near and far planes.
pub fn perspective(fov_y_radians: f32, aspect_ratio: f32) -> Mat4 {
    Mat4::perspective_lh(fov_y_radians, aspect_ratio, SCREEN_NEAR, SCREEN_DEPTH)
}

/// Left-handed orthographic projection centered on the screen, for 2D overlays.
pub fn orthographic(width: f32, height: f32) -> Mat4 {
    Mat4::orthographic_lh(
        -width / 2.0,
        width / 2.0,
        -height / 2.0,
        height / 2.0,
        SCREEN_NEAR,
        SCREEN_DEPTH,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_math::Vec3;

    #[test]
    fn perspective_maps_near_and_far_to_depth_range() {
        let proj = perspective(std::f32::consts::FRAC_PI_4, 1280.0 / 720.0);
        let near = proj.project_point3(Vec3::new(0.0, 0.0, SCREEN_NEAR));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, SCREEN_DEPTH));
        assert!(near.z.abs() < 1e-4, "{near}");
        assert!((far.z - 1.0).abs() < 1e-4, "{far}");
    }

    #[test]
    fn viewport_covers_target() {
        let viewport = Viewport::new(1280, 720);
        assert_eq!(viewport.max_depth, 1.0);
        assert!((viewport.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(ScissorRect::new(1280, 720).bottom, 720);
    }
}
