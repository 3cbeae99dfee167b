/*!

Reproducible randomness.

Every person gets an independent [`Sampler`] stream whose seed is derived from the run's base
seed and the person's id: `base_seed.wrapping_add(hash_u64(person_id))`. Because a person's
draws never depend on anyone else's, a run produces the same per-person results whether the
population is processed sequentially or in parallel, and adding a person to the cohort does not
perturb anyone else's trajectory. Changing this derivation changes every simulated outcome for
a given seed.

All draws come from one primitive, [`Sampler::draw`], a uniform float in `[0, 1)`. Bernoulli
and categorical decisions compare that single draw against cumulative probabilities, so each
decision point consumes exactly one draw.

*/

use crate::{
    PersonId,
    context::{Context, DataPlugin},
    error::HepceError,
    hashing::hash_u64,
    log::trace,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Tolerance for decision vectors whose probabilities are meant to sum to at most one.
pub const DECISION_TOLERANCE: f64 = 1e-5;

pub struct Sampler {
    rng: StdRng,
    draws: u64,
}

impl Sampler {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Sampler {
            rng: StdRng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// The stream assigned to `person_id` for a run with the given base seed.
    #[must_use]
    pub fn for_person(base_seed: u64, person_id: PersonId) -> Self {
        Sampler::new(base_seed.wrapping_add(hash_u64(person_id.0 as u64)))
    }

    /// A uniform sample from `[0, 1)`.
    pub fn draw(&mut self) -> f64 {
        self.draws += 1;
        self.rng.random::<f64>()
    }

    /// True with probability `p`. Probabilities at or below zero never fire and at or above one
    /// always fire; either way one draw is consumed.
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.draw() < p
    }

    /// Chooses among mutually exclusive outcomes whose probabilities may sum to less than one.
    ///
    /// Returns the index of the first outcome whose running sum exceeds the draw, or
    /// `probabilities.len()` when the draw lands in the remainder (nothing happens).
    pub fn decide(&mut self, probabilities: &[f64]) -> Result<usize, HepceError> {
        let sum: f64 = probabilities.iter().sum();
        if sum > 1.0 + DECISION_TOLERANCE {
            return Err(HepceError::ProbabilityOverflow { sum });
        }

        let u = self.draw();
        let mut cumulative = 0.0;
        for (i, p) in probabilities.iter().enumerate() {
            cumulative += p;
            if u < cumulative {
                return Ok(i);
            }
        }
        Ok(probabilities.len())
    }

    /// Chooses among outcomes that partition `[0, 1)`. A draw that falls past the running sum
    /// through rounding goes to the last outcome.
    pub fn categorical(&mut self, probabilities: &[f64]) -> Result<usize, HepceError> {
        let index = self.decide(probabilities)?;
        Ok(index.min(probabilities.len().saturating_sub(1)))
    }

    /// The number of draws consumed so far.
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

/// Holds the run's base seed. Samplers are handed out per person rather than stored here so
/// they can move to worker threads with their person.
struct RngPlugin {
    base_seed: u64,
}

impl DataPlugin for RngPlugin {
    #[allow(non_upper_case_globals)]
    const new: &'static dyn Fn() -> Self = &|| RngPlugin { base_seed: 0 };
}

pub trait ContextRandomExt {
    fn init_random(&mut self, base_seed: u64);

    /// The seed set by `init_random`, or zero if it was never called.
    fn get_base_seed(&self) -> u64;

    /// A fresh sampler for the person's stream, positioned at its first draw.
    fn sampler_for(&self, person_id: PersonId) -> Sampler;
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module with base seed {base_seed}");
        self.get_data_container_mut::<RngPlugin>().base_seed = base_seed;
    }

    fn get_base_seed(&self) -> u64 {
        self.get_data_container::<RngPlugin>()
            .map_or(0, |plugin| plugin.base_seed)
    }

    fn sampler_for(&self, person_id: PersonId) -> Sampler {
        Sampler::for_person(self.get_base_seed(), person_id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn consecutive_draws_differ() {
        let mut sampler = Sampler::new(42);
        assert_ne!(sampler.draw(), sampler.draw());
        assert_eq!(sampler.draws(), 2);
    }

    #[test]
    fn person_streams_are_independent() {
        let mut context = Context::new();
        context.init_random(42);

        let mut first = context.sampler_for(PersonId(0));
        let mut second = context.sampler_for(PersonId(1));
        assert_ne!(first.draw(), second.draw());
    }

    #[test]
    fn reset_seed() {
        let mut context = Context::new();
        context.init_random(42);

        let mut sampler = context.sampler_for(PersonId(3));
        let run_0 = sampler.draw();
        let run_1 = sampler.draw();

        // Same seed, same stream
        let mut sampler = context.sampler_for(PersonId(3));
        assert_eq!(run_0, sampler.draw());
        assert_eq!(run_1, sampler.draw());

        // Different seed, different stream
        context.init_random(88);
        let mut sampler = context.sampler_for(PersonId(3));
        assert_ne!(run_0, sampler.draw());
        assert_ne!(run_1, sampler.draw());
    }

    #[test]
    fn draws_are_in_unit_interval() {
        let mut sampler = Sampler::new(7);
        for _ in 0..10_000 {
            let u = sampler.draw();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn bernoulli_extremes() {
        let mut sampler = Sampler::new(42);
        for _ in 0..1000 {
            assert!(sampler.bernoulli(1.0));
            assert!(!sampler.bernoulli(0.0));
        }
        assert_eq!(sampler.draws(), 2000);
    }

    #[test]
    fn bernoulli_frequency() {
        let mut sampler = Sampler::new(42);
        let hits = (0..3000).filter(|_| sampler.bernoulli(1.0 / 3.0)).count() as i32;
        assert!((hits - 1000_i32).abs() < 80);
    }

    #[test]
    fn decide_uses_remainder() {
        let mut sampler = Sampler::new(42);
        assert_eq!(sampler.decide(&[0.0, 0.0]).unwrap(), 2);
        assert_eq!(sampler.decide(&[1.0]).unwrap(), 0);
        assert_eq!(sampler.decide(&[0.0, 1.0, 0.0]).unwrap(), 1);
    }

    #[test]
    fn decide_rejects_overflow() {
        let mut sampler = Sampler::new(42);
        let result = sampler.decide(&[0.7, 0.7]);
        assert!(matches!(result, Err(HepceError::ProbabilityOverflow { .. })));
        // No draw is consumed for a rejected vector.
        assert_eq!(sampler.draws(), 0);
    }

    #[test]
    fn categorical_frequencies() {
        let mut sampler = Sampler::new(42);
        let mut counts = [0_i32; 3];
        for _ in 0..3000 {
            counts[sampler.categorical(&[0.5, 0.25, 0.25]).unwrap()] += 1;
        }
        assert!((counts[0] - 1500).abs() < 100);
        assert!((counts[1] - 750).abs() < 80);
        assert!((counts[2] - 750).abs() < 80);
    }

    #[test]
    fn categorical_clamps_rounding() {
        let mut sampler = Sampler::new(1);
        // Sums to slightly less than one; any draw in the gap lands in the last bucket.
        for _ in 0..1000 {
            let index = sampler.categorical(&[0.3, 0.3, 0.399_999_9]).unwrap();
            assert!(index < 3);
        }
    }

    #[test]
    fn base_seed_defaults_to_zero() {
        let context = Context::new();
        assert_eq!(context.get_base_seed(), 0);
    }
}
