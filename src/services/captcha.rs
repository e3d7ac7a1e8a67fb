//! One-time-use captcha challenges held in process memory.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rand::{rngs::OsRng, Rng, RngCore};

/// Glyphs that survive distortion: no 0/O, 1/I, 5/S confusion.
pub const CAPTCHA_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CAPTCHA_LENGTH: usize = 5;

struct Challenge {
    answer: String,
    expires_at: Instant,
}

/// Challenge registry owned by the composition root.
///
/// A single mutex guards both paths: `verify` always removes, so there is
/// nothing a reader lock would buy.
#[derive(Default)]
pub struct CaptchaStore {
    entries: Mutex<HashMap<String, Challenge>>,
}

impl CaptchaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Challenge>> {
        // Critical sections never panic midway; the map is always coherent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store the expected answer under a fresh unguessable id.
    pub fn issue(&self, text: &str, ttl: Duration) -> String {
        let id = random_id();
        let challenge = Challenge {
            answer: normalize(text),
            expires_at: Instant::now() + ttl,
        };
        self.lock().insert(id.clone(), challenge);
        id
    }

    /// Consumes the challenge whatever the outcome. Of several concurrent
    /// calls with the same id, at most one can see it present.
    pub fn verify(&self, id: &str, answer: &str) -> bool {
        let Some(challenge) = self.lock().remove(id) else {
            return false;
        };

        if Instant::now() >= challenge.expires_at {
            return false;
        }
        normalize(answer) == challenge.answer
    }

    /// Drop challenges nobody came back for. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, c| c.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_uppercase()
}

fn random_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Random challenge text drawn from [`CAPTCHA_CHARSET`].
pub fn random_text(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| CAPTCHA_CHARSET[rng.gen_range(0..CAPTCHA_CHARSET.len())] as char)
        .collect()
}
