//! Deterministic RNG streams segregated by economic domain.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Domains drawing randomness; each owns an independent stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngDomain {
    Robbery,
    Casino,
    Loot,
    Pvp,
    Missions,
}

impl RngDomain {
    #[must_use]
    pub const fn tag(self) -> &'static [u8] {
        match self {
            Self::Robbery => b"robbery",
            Self::Casino => b"casino",
            Self::Loot => b"loot",
            Self::Pvp => b"pvp",
            Self::Missions => b"missions",
        }
    }
}

/// Bundle of seeded streams shared by all engine operations.
#[derive(Debug)]
pub struct RngStreams {
    robbery: Mutex<CountingRng<SmallRng>>,
    casino: Mutex<CountingRng<SmallRng>>,
    loot: Mutex<CountingRng<SmallRng>>,
    pvp: Mutex<CountingRng<SmallRng>>,
    missions: Mutex<CountingRng<SmallRng>>,
}

impl RngStreams {
    /// Construct every stream from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        let stream = |domain: RngDomain| {
            Mutex::new(CountingRng::new(derive_stream_seed(seed, domain.tag())))
        };
        Self {
            robbery: stream(RngDomain::Robbery),
            casino: stream(RngDomain::Casino),
            loot: stream(RngDomain::Loot),
            pvp: stream(RngDomain::Pvp),
            missions: stream(RngDomain::Missions),
        }
    }

    /// Seed from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_user_seed(rand::random())
    }

    /// Lock one stream. A poisoned stream is still handed out; its state is
    /// a plain generator and remains valid.
    pub fn stream(&self, domain: RngDomain) -> MutexGuard<'_, CountingRng<SmallRng>> {
        let slot = match domain {
            RngDomain::Robbery => &self.robbery,
            RngDomain::Casino => &self.casino,
            RngDomain::Loot => &self.loot,
            RngDomain::Pvp => &self.pvp,
            RngDomain::Missions => &self.missions,
        };
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draw counts per domain, in declaration order.
    #[must_use]
    pub fn draws(&self) -> [(RngDomain, u64); 5] {
        [
            RngDomain::Robbery,
            RngDomain::Casino,
            RngDomain::Loot,
            RngDomain::Pvp,
            RngDomain::Missions,
        ]
        .map(|domain| (domain, self.stream(domain).draws()))
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self::wrap(SmallRng::seed_from_u64(seed))
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Wrap an existing generator.
    pub const fn wrap(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
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
    // HMAC accepts keys of any length, so the fallback is unreachable.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
