//! Round-robin rotation over one provider's credentials.

use std::sync::{Mutex, PoisonError};

use super::{Credential, CredentialSet};

#[derive(Debug, Default)]
struct PoolState {
    items: Vec<Credential>,
    cursor: usize,
}

/// Thread-safe round-robin cursor over a [`CredentialSet`].
///
/// The cursor keeps advancing across calls; [`reseed`](Self::reseed)
/// replaces the items and starts over at index 0.
#[derive(Debug, Default)]
pub struct RotationPool {
    state: Mutex<PoolState>,
}

impl RotationPool {
    pub fn new(set: CredentialSet) -> Self {
        Self {
            state: Mutex::new(PoolState {
                items: set.into_vec(),
                cursor: 0,
            }),
        }
    }

    /// Next credential in round-robin order, or `None` if the pool is empty.
    pub fn take(&self) -> Option<Credential> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.items.is_empty() {
            return None;
        }
        let idx = state.cursor % state.items.len();
        state.cursor = state.cursor.wrapping_add(1);
        Some(state.items[idx].clone())
    }

    /// Replace the credentials and reset the cursor.
    pub fn reseed(&self, set: CredentialSet) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.items = set.into_vec();
        state.cursor = 0;
    }

    /// Reseed only if `set` differs from the current credentials.
    ///
    /// Returns `true` if the pool was reseeded. An unchanged set keeps the
    /// cursor where it is, so rotation continues across refreshes.
    pub fn reseed_if_changed(&self, set: CredentialSet) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.items.as_slice() == set.as_slice() {
            return false;
        }
        state.items = set.into_vec();
        state.cursor = 0;
        true
    }

    /// Copy of the current credentials, in pool order.
    pub fn snapshot(&self) -> Vec<Credential> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .clone()
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reorder `base` so that `head` comes first; the rest keep their order.
///
/// If `head` is not in `base`, `base` is returned unchanged.
pub fn rotated(head: &Credential, base: &[Credential]) -> Vec<Credential> {
    if !base.contains(head) {
        return base.to_vec();
    }
    let mut out = Vec::with_capacity(base.len());
    out.push(head.clone());
    out.extend(base.iter().filter(|c| *c != head).cloned());
    out
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
