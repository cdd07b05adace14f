use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bounds::Bounds;
use crate::vector::Vector;

/// Source of initial agent state
pub trait AgentSampler<V> {
    fn position(&mut self, bounds: &Bounds<V>) -> V;
    fn velocity(&mut self) -> V;
}

/// A pair of closures works as a sampler, which keeps test setups short
impl<V, P, Q> AgentSampler<V> for (P, Q)
where
    P: FnMut(&Bounds<V>) -> V,
    Q: FnMut() -> V,
{
    fn position(&mut self, bounds: &Bounds<V>) -> V {
        (self.0)(bounds)
    }

    fn velocity(&mut self) -> V {
        (self.1)()
    }
}

/// Uniform positions inside the bounds and uniform velocities in
/// `[-velocity_range, +velocity_range]` per axis
pub struct UniformSampler<R, V> {
    rng: R,
    velocity_range: V,
}

impl<R: Rng, V: Vector> UniformSampler<R, V> {
    pub fn new(rng: R, velocity_range: V) -> Self {
        Self {
            rng,
            velocity_range,
        }
    }
}

impl<V: Vector> UniformSampler<StdRng, V> {
    pub fn seeded(seed: u64, velocity_range: V) -> Self {
        Self::new(StdRng::seed_from_u64(seed), velocity_range)
    }

    pub fn from_entropy(velocity_range: V) -> Self {
        Self::new(StdRng::from_entropy(), velocity_range)
    }
}

impl<R: Rng, V: Vector> AgentSampler<V> for UniformSampler<R, V> {
    fn position(&mut self, bounds: &Bounds<V>) -> V {
        let mut position = V::zero();
        for axis in 0..V::AXES {
            *position.axis_mut(axis) = self
                .rng
                .gen_range(bounds.min.axis(axis)..bounds.max.axis(axis));
        }
        position
    }

    fn velocity(&mut self) -> V {
        let mut velocity = V::zero();
        for axis in 0..V::AXES {
            let half = self.velocity_range.axis(axis).abs();
            if half > 0.0 {
                *velocity.axis_mut(axis) = self.rng.gen_range(-half..half);
            }
        }
        velocity
    }
}
