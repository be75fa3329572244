use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Nominal value with a symmetric random spread.
///
/// Samples fall in `[num - range / 2, num + range / 2]`. A zero range always
/// yields `num` without touching the random source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Fuzzy {
    pub num: f32,
    pub range: f32,
}

impl Fuzzy {
    pub const fn new(num: f32, range: f32) -> Self {
        Self { num, range }
    }

    pub const fn exact(num: f32) -> Self {
        Self::new(num, 0.0)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.range == 0.0 {
            self.num
        } else {
            rng.gen::<f32>() * self.range + self.num - self.range / 2.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FuzzyVec3 {
    pub x: Fuzzy,
    pub y: Fuzzy,
    pub z: Fuzzy,
}

impl FuzzyVec3 {
    pub const fn new(x: Fuzzy, y: Fuzzy, z: Fuzzy) -> Self {
        Self { x, y, z }
    }

    /// Pairs nominal components with per-axis ranges.
    pub fn from_parts(num: Vec3, range: Vec3) -> Self {
        Self::new(
            Fuzzy::new(num.x, range.x),
            Fuzzy::new(num.y, range.y),
            Fuzzy::new(num.z, range.z),
        )
    }

    pub fn nominal(&self) -> Vec3 {
        Vec3::new(self.x.num, self.y.num, self.z.num)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        Vec3::new(self.x.sample(rng), self.y.sample(rng), self.z.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::*;

    /// Fails the test if the sampler asks for randomness.
    struct NoRandom;

    impl RngCore for NoRandom {
        fn next_u32(&mut self) -> u32 {
            panic!("random source used")
        }

        fn next_u64(&mut self) -> u64 {
            panic!("random source used")
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            panic!("random source used")
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            panic!("random source used")
        }
    }

    #[test]
    fn zero_range_is_exact() {
        let fuzzy = Fuzzy::exact(3.5);
        let mut rng = NoRandom;
        for _ in 0..10 {
            assert_eq!(fuzzy.sample(&mut rng), 3.5);
        }
        let vec = FuzzyVec3::from_parts(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO);
        assert_eq!(vec.sample(&mut rng), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn samples_stay_in_range_around_nominal() {
        let fuzzy = Fuzzy::new(10.0, 4.0);
        let mut rng = StdRng::seed_from_u64(7);
        let count = 20_000;
        let mut sum = 0.0_f64;
        for _ in 0..count {
            let value = fuzzy.sample(&mut rng);
            assert!((8.0..=12.0).contains(&value), "{value} out of range");
            sum += value as f64;
        }
        let mean = sum / count as f64;
        assert!((mean - 10.0).abs() < 0.05, "mean {mean}");
    }
}
