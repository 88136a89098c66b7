//! Channel synthesizer
//!
//! Derives new frame data from an existing channel by uniform scaling.

use shapeforge_core::Frame;

/// Scale that maps an extended `[min, max]` display range back onto the
/// 0-100 delta convention
pub fn scale_factor(min_value: i32, max_value: i32) -> f32 {
    (max_value as f32 - min_value as f32) / 100.0
}

/// Multiply every delta component of every frame by `scale`.
///
/// Frame weights are copied unchanged. The output never aliases the input.
pub fn derive_scaled(source: &[Frame], scale: f32) -> Vec<Frame> {
    source
        .iter()
        .map(|frame| Frame {
            weight: frame.weight,
            delta_positions: frame.delta_positions.iter().map(|d| *d * scale).collect(),
            delta_normals: frame.delta_normals.iter().map(|d| *d * scale).collect(),
            delta_tangents: frame.delta_tangents.iter().map(|d| *d * scale).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_scale_factor() {
        assert_eq!(scale_factor(-50, 150), 2.0);
        assert_eq!(scale_factor(0, 100), 1.0);
        assert_eq!(scale_factor(0, 50), 0.5);
    }

    #[test]
    fn test_derive_scaled() {
        let source = vec![
            Frame::new(
                50.0,
                vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.5)],
                vec![Vec3::Y, Vec3::ZERO],
                vec![Vec3::Z, Vec3::X],
            ),
            Frame::from_positions(100.0, vec![Vec3::ONE, Vec3::splat(2.0)]),
        ];

        let scaled = derive_scaled(&source, 2.0);

        assert_eq!(scaled.len(), 2);
        assert_eq!(scaled[0].weight, 50.0);
        assert_eq!(scaled[1].weight, 100.0);
        assert_eq!(
            scaled[0].delta_positions,
            vec![Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, -2.0, 1.0)]
        );
        assert_eq!(scaled[0].delta_normals, vec![Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO]);
        assert_eq!(
            scaled[0].delta_tangents,
            vec![Vec3::new(0.0, 0.0, 2.0), Vec3::new(2.0, 0.0, 0.0)]
        );
        assert_eq!(scaled[1].delta_positions, vec![Vec3::splat(2.0), Vec3::splat(4.0)]);
    }

    #[test]
    fn test_negative_scale_is_not_clamped() {
        let source = vec![Frame::from_positions(100.0, vec![Vec3::X])];
        let scaled = derive_scaled(&source, -0.5);
        assert_eq!(scaled[0].delta_positions, vec![Vec3::new(-0.5, 0.0, 0.0)]);
    }

    #[test]
    fn test_source_is_untouched() {
        let source = vec![Frame::from_positions(100.0, vec![Vec3::X])];
        let _ = derive_scaled(&source, 3.0);
        assert_eq!(source[0].delta_positions, vec![Vec3::X]);
    }
}
