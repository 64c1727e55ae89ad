//! Synthetic replacement values
//!
//! A single seeded random source drives every generated value, so a fresh
//! process with the same seed produces the same sequence of replacements.

use fake::faker::address::raw::CityName;
use fake::faker::company::raw::CompanyName;
use fake::faker::internet::raw::SafeEmail;
use fake::faker::name::raw::Name;
use fake::faker::phone_number::raw::PhoneNumber;
use fake::locales::FR_FR;
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Kind of realistic value to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticKind {
    Name,
    City,
    Company,
    Email,
    Phone,
}

/// Seeded generator for plausible French personal data
pub struct SyntheticGenerator {
    rng: Mutex<StdRng>,
    seed: u64,
}

impl SyntheticGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next value of the requested kind
    pub fn generate(&self, kind: SyntheticKind) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let rng = &mut *rng;
        match kind {
            SyntheticKind::Name => Name(FR_FR).fake_with_rng(rng),
            SyntheticKind::City => CityName(FR_FR).fake_with_rng(rng),
            SyntheticKind::Company => CompanyName(FR_FR).fake_with_rng(rng),
            SyntheticKind::Email => SafeEmail(FR_FR).fake_with_rng(rng),
            SyntheticKind::Phone => PhoneNumber(FR_FR).fake_with_rng(rng),
        }
    }

    /// Uniform day offset in `[-bound, bound]`
    pub fn day_offset(&self, bound: i64) -> i64 {
        let bound = bound.abs();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(-bound..=bound)
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new(42)
    }
}

impl std::fmt::Debug for SyntheticGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticGenerator")
            .field("seed", &self.seed)
            .finish()
    }
}
