#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spatial sampling system that draws tile coordinates from a run's domain.

use rand::Rng;
use tilegen_core::{Coordinate, Domain, JitterClamp};

/// Draws coordinates uniformly from a fixed domain.
///
/// The sampler owns no randomness; every call borrows the run's shared random
/// source so that a seed reproduces the whole stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpatialSampler {
    domain: Domain,
    clamp: JitterClamp,
}

impl SpatialSampler {
    /// Creates a sampler over `domain` using `clamp` for jittered draws.
    #[must_use]
    pub const fn new(domain: Domain, clamp: JitterClamp) -> Self {
        Self { domain, clamp }
    }

    /// Domain every uniform draw lies in.
    #[must_use]
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// Clamping applied by [`SpatialSampler::sample_nearby`].
    #[must_use]
    pub const fn clamp(&self) -> JitterClamp {
        self.clamp
    }

    /// Draws both axes independently and uniformly from the domain.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Coordinate {
        let axis = self.domain.lo()..=self.domain.hi();
        let x = rng.gen_range(axis.clone());
        let y = rng.gen_range(axis);
        Coordinate::new(x, y)
    }

    /// Draws a coordinate within `±radius` of `origin` on each axis.
    ///
    /// With [`JitterClamp::LowerOnly`] only the lower bound is enforced, so an
    /// origin near the upper edge may produce a coordinate past `hi`.
    pub fn sample_nearby<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        origin: Coordinate,
        radius: i32,
    ) -> Coordinate {
        let radius = radius.max(0);
        let x = self.jitter_axis(rng, origin.x(), radius);
        let y = self.jitter_axis(rng, origin.y(), radius);
        Coordinate::new(x, y)
    }

    fn jitter_axis<R: Rng + ?Sized>(&self, rng: &mut R, center: i32, radius: i32) -> i32 {
        let offset = rng.gen_range(-radius..=radius);
        let value = center.saturating_add(offset);
        match self.clamp {
            JitterClamp::LowerOnly => value.max(self.domain.lo()),
            JitterClamp::Both => value.clamp(self.domain.lo(), self.domain.hi()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tilegen_core::DomainShape;

    #[test]
    fn zero_radius_returns_origin_inside_domain() {
        let domain = Domain::new(DomainShape::ZeroBased, 10).expect("valid domain");
        let sampler = SpatialSampler::new(domain, JitterClamp::Both);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let origin = Coordinate::new(4, 9);
        assert_eq!(sampler.sample_nearby(&mut rng, origin, 0), origin);
    }
}
