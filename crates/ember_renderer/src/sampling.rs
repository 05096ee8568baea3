//! Sub-pixel and lens sample generators.

use std::f32::consts::TAU;

use ember_core::{AntialiasingKind, FocusKind};
use ember_math::directions::gen_f32;
use ember_math::Vec2;
use rand::RngCore;

/// Sub-pixel offsets in [0, 1)² for one pixel.
///
/// `None` always yields the single offset (0, 0). `Uniform` yields the first
/// `count` cell centers of a ⌈√count⌉ square grid, `Polygonal` spaces `count`
/// points evenly on a circle inscribed in the pixel, and `Stochastic` draws
/// `count` uniform random points.
pub fn antialiasing_offsets(kind: AntialiasingKind, count: u32, rng: &mut dyn RngCore) -> Vec<Vec2> {
    match kind {
        AntialiasingKind::None => vec![Vec2::ZERO],
        AntialiasingKind::Uniform => grid(count)
            .map(|cell| cell * 0.5 + Vec2::splat(0.5))
            .collect(),
        AntialiasingKind::Polygonal => (0..count)
            .map(|i| {
                let angle = TAU * i as f32 / count as f32;
                Vec2::new(0.5 + 0.5 * angle.cos(), 0.5 + 0.5 * angle.sin())
            })
            .collect(),
        AntialiasingKind::Stochastic => (0..count)
            .map(|_| Vec2::new(gen_f32(rng), gen_f32(rng)))
            .collect(),
    }
}

/// Lens-plane offsets scaled by `aperture`.
///
/// `Stochastic` currently produces a single centered sample, the same as
/// `None`.
pub fn lens_offsets(kind: FocusKind, count: u32, aperture: f32) -> Vec<Vec2> {
    match kind {
        FocusKind::None | FocusKind::Stochastic => vec![Vec2::ZERO],
        FocusKind::Uniform => {
            let offsets: Vec<Vec2> = grid(count).map(|cell| cell * aperture).collect();
            if offsets.is_empty() {
                vec![Vec2::ZERO]
            } else {
                offsets
            }
        }
    }
}

/// First `count` cell centers of a ⌈√count⌉ square grid over [-1, 1]².
fn grid(count: u32) -> impl Iterator<Item = Vec2> {
    let side = (count as f32).sqrt().ceil() as u32;
    let step = 2.0 / side.max(1) as f32;
    (0..side)
        .flat_map(move |row| (0..side).map(move |col| (row, col)))
        .take(count as usize)
        .map(move |(row, col)| {
            Vec2::new(
                -1.0 + (col as f32 + 0.5) * step,
                -1.0 + (row as f32 + 0.5) * step,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn in_unit_square(p: Vec2) -> bool {
        (0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y)
    }

    #[test]
    fn test_none_is_single_center() {
        let mut rng = StdRng::seed_from_u64(1);
        for n in [0, 1, 4, 17] {
            assert_eq!(antialiasing_offsets(AntialiasingKind::None, n, &mut rng), vec![Vec2::ZERO]);
        }
    }

    #[test]
    fn test_uniform_counts_and_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for n in 1..=20u32 {
            let side = (n as f32).sqrt().ceil() as u32;
            let offsets = antialiasing_offsets(AntialiasingKind::Uniform, n, &mut rng);
            assert_eq!(offsets.len() as u32, n.min(side * side));
            assert!(offsets.iter().all(|&p| in_unit_square(p)));
        }

        let four = antialiasing_offsets(AntialiasingKind::Uniform, 4, &mut rng);
        assert_eq!(
            four,
            vec![
                Vec2::new(0.25, 0.25),
                Vec2::new(0.75, 0.25),
                Vec2::new(0.25, 0.75),
                Vec2::new(0.75, 0.75)
            ]
        );
    }

    #[test]
    fn test_stochastic_counts_and_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in [1, 3, 16, 64] {
            let offsets = antialiasing_offsets(AntialiasingKind::Stochastic, n, &mut rng);
            assert_eq!(offsets.len(), n as usize);
            assert!(offsets.iter().all(|&p| in_unit_square(p)));
        }
    }

    #[test]
    fn test_polygonal_on_circle() {
        let mut rng = StdRng::seed_from_u64(1);
        let offsets = antialiasing_offsets(AntialiasingKind::Polygonal, 6, &mut rng);

        assert_eq!(offsets.len(), 6);
        for p in offsets {
            assert!(((p - Vec2::splat(0.5)).length() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_lens_offsets() {
        assert_eq!(lens_offsets(FocusKind::None, 9, 0.5), vec![Vec2::ZERO]);
        assert_eq!(lens_offsets(FocusKind::Stochastic, 9, 0.5), vec![Vec2::ZERO]);

        let uniform = lens_offsets(FocusKind::Uniform, 9, 0.5);
        assert_eq!(uniform.len(), 9);
        assert!(uniform.iter().all(|p| p.x.abs() <= 0.5 && p.y.abs() <= 0.5));
        assert!(uniform.iter().any(|p| p.length() < 1e-5));
    }
}
