//! Injectable randomness for physiologic jitter and stochastic events.
//!
//! The stepper never reaches for a global generator. Every draw goes through a
//! [`NoiseSource`], so tests can run with [`Noise::Quiet`] for bit-identical
//! trajectories and trainers can replay a session from its seed.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Simulation domain a draw belongs to. Each domain owns its own stream so
/// that adding draws in one subsystem never shifts another subsystem's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseDomain {
    Setup,
    Vitals,
    Chest,
    Neuro,
}

impl NoiseDomain {
    const fn tag(self) -> &'static [u8] {
        match self {
            Self::Setup => b"setup",
            Self::Vitals => b"vitals",
            Self::Chest => b"chest",
            Self::Neuro => b"neuro",
        }
    }
}

/// Source of symmetric jitter and Bernoulli trials.
pub trait NoiseSource {
    /// Uniform perturbation in `[-amplitude, amplitude]`.
    fn jitter(&mut self, domain: NoiseDomain, amplitude: f64) -> f64;

    /// Returns true with the given probability (clamped to `[0, 1]`).
    fn chance(&mut self, domain: NoiseDomain, probability: f64) -> bool;
}

/// Position of one domain stream within its ChaCha20 keystream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamCursor {
    pub word_pos: u128,
    pub draws: u64,
}

/// Positions of every domain stream; with the seed, enough to resume a bundle
/// exactly where it left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoiseCursor {
    pub setup: StreamCursor,
    pub vitals: StreamCursor,
    pub chest: StreamCursor,
    pub neuro: StreamCursor,
}

/// Deterministic bundle of RNG streams segregated by simulation domain.
#[derive(Debug, Clone)]
pub struct SeededNoise {
    seed: u64,
    setup: CountingRng<ChaCha20Rng>,
    vitals: CountingRng<ChaCha20Rng>,
    chest: CountingRng<ChaCha20Rng>,
    neuro: CountingRng<ChaCha20Rng>,
}

impl SeededNoise {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            setup: CountingRng::new(derive_stream_seed(seed, NoiseDomain::Setup.tag())),
            vitals: CountingRng::new(derive_stream_seed(seed, NoiseDomain::Vitals.tag())),
            chest: CountingRng::new(derive_stream_seed(seed, NoiseDomain::Chest.tag())),
            neuro: CountingRng::new(derive_stream_seed(seed, NoiseDomain::Neuro.tag())),
        }
    }

    /// Rebuild the bundle for `seed` and move every stream to `cursor`.
    #[must_use]
    pub fn resume(seed: u64, cursor: &NoiseCursor) -> Self {
        let mut noise = Self::from_user_seed(seed);
        noise.setup.seek(cursor.setup);
        noise.vitals.seek(cursor.vitals);
        noise.chest.seek(cursor.chest);
        noise.neuro.seek(cursor.neuro);
        noise
    }

    #[must_use]
    pub fn cursor(&self) -> NoiseCursor {
        NoiseCursor {
            setup: self.setup.position(),
            vitals: self.vitals.position(),
            chest: self.chest.position(),
            neuro: self.neuro.position(),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of draws taken from a domain stream so far.
    #[must_use]
    pub const fn draws(&self, domain: NoiseDomain) -> u64 {
        match domain {
            NoiseDomain::Setup => self.setup.draws(),
            NoiseDomain::Vitals => self.vitals.draws(),
            NoiseDomain::Chest => self.chest.draws(),
            NoiseDomain::Neuro => self.neuro.draws(),
        }
    }

    fn stream(&mut self, domain: NoiseDomain) -> &mut CountingRng<ChaCha20Rng> {
        match domain {
            NoiseDomain::Setup => &mut self.setup,
            NoiseDomain::Vitals => &mut self.vitals,
            NoiseDomain::Chest => &mut self.chest,
            NoiseDomain::Neuro => &mut self.neuro,
        }
    }
}

impl NoiseSource for SeededNoise {
    fn jitter(&mut self, domain: NoiseDomain, amplitude: f64) -> f64 {
        if amplitude.is_nan() || amplitude <= 0.0 {
            return 0.0;
        }
        self.stream(domain).gen_range(-amplitude..=amplitude)
    }

    fn chance(&mut self, domain: NoiseDomain, probability: f64) -> bool {
        if probability.is_nan() || probability <= 0.0 {
            return false;
        }
        self.stream(domain).gen_bool(probability.min(1.0))
    }
}

/// Noise configuration owned by a session.
#[derive(Debug, Clone, Default)]
pub enum Noise {
    Seeded(Box<SeededNoise>),
    /// Zero jitter and no stochastic events.
    #[default]
    Quiet,
}

impl Noise {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::Seeded(Box::new(SeededNoise::from_user_seed(seed)))
    }

    /// Seeded noise for `seed`, resumed at `cursor` when one was recorded.
    #[must_use]
    pub fn resumed(seed: Option<u64>, cursor: Option<&NoiseCursor>) -> Self {
        match (seed, cursor) {
            (Some(seed), Some(cursor)) => {
                Self::Seeded(Box::new(SeededNoise::resume(seed, cursor)))
            }
            (Some(seed), None) => Self::seeded(seed),
            (None, _) => Self::Quiet,
        }
    }

    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        matches!(self, Self::Quiet)
    }

    #[must_use]
    pub fn cursor(&self) -> Option<NoiseCursor> {
        match self {
            Self::Seeded(noise) => Some(noise.cursor()),
            Self::Quiet => None,
        }
    }
}

impl NoiseSource for Noise {
    fn jitter(&mut self, domain: NoiseDomain, amplitude: f64) -> f64 {
        match self {
            Self::Seeded(noise) => noise.jitter(domain, amplitude),
            Self::Quiet => 0.0,
        }
    }

    fn chance(&mut self, domain: NoiseDomain, probability: f64) -> bool {
        match self {
            Self::Seeded(noise) => noise.chance(domain, probability),
            Self::Quiet => false,
        }
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    fn position(&self) -> StreamCursor {
        StreamCursor {
            word_pos: self.rng.get_word_pos(),
            draws: self.draws,
        }
    }

    fn seek(&mut self, cursor: StreamCursor) {
        self.rng.set_word_pos(cursor.word_pos);
        self.draws = cursor.draws;
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_use_domain_hmac() {
        let seed = 0xFEED_CAFE_u64;
        let mut bundle = SeededNoise::from_user_seed(seed);

        let mut expected = ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, b"vitals"));
        assert_eq!(bundle.stream(NoiseDomain::Vitals).next_u32(), expected.next_u32());
        assert_eq!(bundle.draws(NoiseDomain::Vitals), 1);
        assert_eq!(bundle.draws(NoiseDomain::Chest), 0);

        assert_ne!(
            derive_stream_seed(seed, b"vitals"),
            derive_stream_seed(seed, b"chest"),
            "domain tags must derive distinct seeds"
        );
    }

    #[test]
    fn resumed_bundle_continues_each_stream() {
        let mut live = SeededNoise::from_user_seed(99);
        for _ in 0..37 {
            live.jitter(NoiseDomain::Vitals, 2.0);
        }
        live.chance(NoiseDomain::Chest, 0.5);

        let mut resumed = SeededNoise::resume(99, &live.cursor());
        assert_eq!(resumed.draws(NoiseDomain::Vitals), live.draws(NoiseDomain::Vitals));
        for domain in [NoiseDomain::Vitals, NoiseDomain::Chest, NoiseDomain::Neuro] {
            for _ in 0..10 {
                assert_eq!(
                    live.jitter(domain, 1.0).to_bits(),
                    resumed.jitter(domain, 1.0).to_bits()
                );
            }
        }
    }

    #[test]
    fn quiet_noise_has_no_cursor() {
        assert!(Noise::Quiet.cursor().is_none());
        assert!(Noise::resumed(None, Some(&NoiseCursor::default())).is_quiet());
        assert_eq!(Noise::seeded(3).cursor(), Some(NoiseCursor::default()));
    }

    #[test]
    fn jitter_stays_within_amplitude() {
        let mut noise = Noise::seeded(7);
        for _ in 0..1_000 {
            let value = noise.jitter(NoiseDomain::Vitals, 1.5);
            assert!((-1.5..=1.5).contains(&value));
        }
        assert!(noise.jitter(NoiseDomain::Vitals, 0.0).abs() < f64::EPSILON);
        assert!(noise.jitter(NoiseDomain::Vitals, f64::NAN).abs() < f64::EPSILON);
    }

    #[test]
    fn chance_clamps_probability() {
        let mut noise = Noise::seeded(11);
        assert!(noise.chance(NoiseDomain::Chest, 2.0));
        assert!(!noise.chance(NoiseDomain::Chest, -1.0));
        assert!(!noise.chance(NoiseDomain::Chest, f64::NAN));
    }

    #[test]
    fn quiet_noise_is_inert() {
        let mut noise = Noise::Quiet;
        assert!(noise.is_quiet());
        assert!(noise.jitter(NoiseDomain::Vitals, 5.0).abs() < f64::EPSILON);
        assert!(!noise.chance(NoiseDomain::Neuro, 1.0));
    }

    #[test]
    fn equal_seeds_replay_identically() {
        let mut a = SeededNoise::from_user_seed(99);
        let mut b = SeededNoise::from_user_seed(99);
        for _ in 0..64 {
            assert_eq!(
                a.jitter(NoiseDomain::Vitals, 2.0).to_bits(),
                b.jitter(NoiseDomain::Vitals, 2.0).to_bits()
            );
        }
        assert_eq!(a.seed(), 99);
    }
}
