//! Random number generator abstraction for the solver.
//!
//! The solver draws randomness through the `WfcRng` trait so a driver
//! can inject its own source. `StdRandom` wraps `rand::rngs::StdRng`
//! and is what the solver uses when only a seed is given.
//!
//! # Example
//!
//! ```
//! use wfc_core::rng::{StdRandom, WfcRng};
//!
//! let mut rng = StdRandom::from_seed(42);
//! let index = rng.next_usize_max(10); // 0..10
//! let draw = rng.next_double(); // 0.0..1.0
//! assert!(index < 10 && draw < 1.0);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of randomness consumed by selection and collapse.
///
/// The solver only ever asks for two things: a uniform index for
/// breaking entropy ties, and a uniform double for weighted sampling.
pub trait WfcRng: WfcRngClone {
    /// Returns a random usize in `[0, max)`. Returns 0 when `max == 0`.
    fn next_usize_max(&mut self, max: usize) -> usize;

    /// Returns a random double in `[0.0, 1.0)`.
    fn next_double(&mut self) -> f64;
}

/// Helper trait for cloning boxed `WfcRng` trait objects.
pub trait WfcRngClone {
    fn clone_box(&self) -> Box<dyn WfcRng>;
}

impl<T: WfcRng + Clone + 'static> WfcRngClone for T {
    fn clone_box(&self) -> Box<dyn WfcRng> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn WfcRng> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Standard Rust RNG wrapper using `rand::rngs::StdRng`.
#[derive(Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A fresh seed from OS entropy, for unseeded solves.
    pub fn entropy_seed() -> u64 {
        rand::thread_rng().gen()
    }
}

impl WfcRng for StdRandom {
    fn next_usize_max(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(0..max)
    }

    fn next_double(&mut self) -> f64 {
        self.rng.gen()
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted.
///
/// Used in tests to force specific tie-breaks and collapse choices.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    doubles: Vec<f64>,
    indices: Vec<usize>,
    next_double: usize,
    next_index: usize,
}

impl ScriptedRandom {
    pub fn new(doubles: Vec<f64>, indices: Vec<usize>) -> Self {
        Self {
            doubles,
            indices,
            next_double: 0,
            next_index: 0,
        }
    }
}

impl WfcRng for ScriptedRandom {
    fn next_usize_max(&mut self, max: usize) -> usize {
        if max == 0 || self.indices.is_empty() {
            return 0;
        }
        let v = self.indices[self.next_index % self.indices.len()];
        self.next_index += 1;
        v % max
    }

    fn next_double(&mut self) -> f64 {
        if self.doubles.is_empty() {
            return 0.0;
        }
        let v = self.doubles[self.next_double % self.doubles.len()];
        self.next_double += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_random_ranges() {
        let mut rng = StdRandom::from_seed(42);
        for _ in 0..100 {
            assert!(rng.next_usize_max(7) < 7);
            let d = rng.next_double();
            assert!((0.0..1.0).contains(&d));
        }
        assert_eq!(rng.next_usize_max(0), 0);
    }

    #[test]
    fn test_std_random_is_deterministic() {
        let mut a = StdRandom::from_seed(123);
        let mut b = StdRandom::from_seed(123);
        for _ in 0..100 {
            assert_eq!(a.next_usize_max(1000), b.next_usize_max(1000));
            assert_eq!(a.next_double(), b.next_double());
        }
    }

    #[test]
    fn test_boxed_clone_continues_same_sequence() {
        let mut original: Box<dyn WfcRng> = Box::new(StdRandom::from_seed(9));
        original.next_double();
        let mut copy = original.clone();
        for _ in 0..10 {
            assert_eq!(original.next_double(), copy.next_double());
        }
    }

    #[test]
    fn test_scripted_random_cycles() {
        let mut rng = ScriptedRandom::new(vec![0.25, 0.75], vec![3]);
        assert_eq!(rng.next_double(), 0.25);
        assert_eq!(rng.next_double(), 0.75);
        assert_eq!(rng.next_double(), 0.25);
        assert_eq!(rng.next_usize_max(2), 1);
    }
}
