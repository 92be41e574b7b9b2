use glam::Vec2;
use rand::Rng;
use smallvec::SmallVec;
use std::f32::consts::TAU;

pub const MIN_LOBES: usize = 8;
pub const MAX_LOBES: usize = 12;

/// Two points closing the outline at the bottom, drawn as a tiny stem.
const STEM: [Vec2; 2] = [Vec2::new(-0.05, 1.05), Vec2::new(0.05, 1.05)];

pub type Outline = SmallVec<[Vec2; MAX_LOBES + 2]>;

/// A soft, leaf-ish polygon in normalized coordinates (roughly unit radius).
///
/// Generated once per leaf and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafShape {
    points: Outline,
}

impl LeafShape {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let lobes = rng.gen_range(MIN_LOBES..=MAX_LOBES);
        // slight asymmetry, slightly wider than tall
        let bias: f32 = rng.gen_range(0.9..=1.2);

        let mut points = Outline::with_capacity(lobes + STEM.len());
        for i in 0..lobes {
            let a = i as f32 / lobes as f32 * TAU;
            let r = (0.55 + 0.45 * rng.gen::<f32>()) * (1.0 + 0.25 * (a * 3.0).sin());
            points.push(Vec2::new(a.cos() * r * 1.1 * bias, a.sin() * r));
        }
        points.extend_from_slice(&STEM);

        Self { points }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Number of outline points excluding the stem.
    pub fn lobes(&self) -> usize {
        self.points.len() - STEM.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn same_seed_same_shape() {
        let a = LeafShape::generate(&mut StdRng::seed_from_u64(7));
        let b = LeafShape::generate(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn shapes_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let shape = LeafShape::generate(&mut rng);
            assert!((MIN_LOBES..=MAX_LOBES).contains(&shape.lobes()));
            assert_eq!(&shape.points()[shape.lobes()..], &STEM);
            for p in &shape.points()[..shape.lobes()] {
                // r <= 1.25, x stretched by at most 1.1 * 1.2
                assert!(p.y.abs() <= 1.25 + 1e-5);
                assert!(p.x.abs() <= 1.25 * 1.1 * 1.2 + 1e-5);
            }
        }
    }

    #[test]
    fn first_point_lies_on_positive_x_axis() {
        let shape = LeafShape::generate(&mut StdRng::seed_from_u64(3));
        let first = shape.points()[0];
        assert!(first.x > 0.0);
        assert!(first.y.abs() < 1e-6);
    }
}
