use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::DestRect;
use crate::cat::animation::FrameRect;

/// Per-sprite data uploaded to the GPU each frame.
/// Stride = 40 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpriteInstance {
    /// Destination top-left in screen pixels.
    pub position: [f32; 2],
    /// Destination width/height in screen pixels.
    pub size: [f32; 2],
    /// Source rect on the sheet, normalized.
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
    /// Clockwise rotation about the destination centre, radians.
    pub rotation: f32,
    /// Non-zero mirrors the source horizontally.
    pub flip: u32,
}

impl SpriteInstance {
    pub fn new(
        src: FrameRect,
        sheet_size: Vec2,
        dest: DestRect,
        angle_degrees: f32,
        flip: bool,
    ) -> Self {
        let src_min = Vec2::new(src.x as f32, src.y as f32);
        let src_max = src_min + Vec2::new(src.w as f32, src.h as f32);
        let sheet = sheet_size.max(Vec2::ONE);

        Self {
            position: [dest.x as f32, dest.y as f32],
            size: [dest.w as f32, dest.h as f32],
            uv_min: (src_min / sheet).into(),
            uv_max: (src_max / sheet).into(),
            rotation: angle_degrees.to_radians(),
            flip: flip as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_matches_vertex_layout() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 40);
    }

    #[test]
    fn source_rect_becomes_normalized_uvs() {
        let src = FrameRect { x: 300, y: 1100, w: 100, h: 100 };
        let dest = DestRect { x: 10, y: 20, w: 25, h: 25 };
        let inst = SpriteInstance::new(src, Vec2::new(400.0, 1300.0), dest, 90.0, true);

        assert_eq!(inst.position, [10.0, 20.0]);
        assert_eq!(inst.size, [25.0, 25.0]);
        assert_eq!(inst.uv_min[0], 0.75);
        assert_eq!(inst.uv_max[0], 1.0);
        assert!((inst.uv_max[1] - 1200.0 / 1300.0).abs() < 1e-6);
        assert!((inst.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(inst.flip, 1);
    }
}
