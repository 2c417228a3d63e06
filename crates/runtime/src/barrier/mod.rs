//! Rendezvous between battle logic and the presentation layer.
//!
//! Battle logic awaits a [`BarrierKey`] (token + phase); the presentation
//! layer signals the same key once its animation reached that point. Either
//! side may arrive first:
//!
//! - A signal for a key with a pending wait releases it.
//! - A signal that arrives before any wait is buffered (one per key) and the
//!   next wait on that key completes immediately.
//! - Once a wait on a key has been satisfied, further signals for that key are
//!   ignored until a new wait is registered on it.
//! - Signals for a retired token are ignored.
//!
//! Waits end early with [`BarrierError::Cancelled`] when the battle's
//! [`CancelToken`] fires or when the wait is withdrawn via
//! [`InteractionBarrier::try_cancel`].

mod cancel;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::events::CorrelationId;

pub use cancel::CancelToken;

/// Identifies one rendezvous sequence, typically one action or one spawn.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct BarrierToken(u64);

impl BarrierToken {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn key(self, phase: BarrierPhase) -> BarrierKey {
        BarrierKey { token: self, phase }
    }
}

impl fmt::Display for BarrierToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token-{}", self.0)
    }
}

impl From<BarrierToken> for CorrelationId {
    fn from(token: BarrierToken) -> Self {
        CorrelationId(token.0)
    }
}

/// Synchronization point within a token's sequence.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum BarrierPhase {
    /// Every combatant view is on screen.
    Spawn,
    /// The attack animation reached its impact frame.
    Hit,
    /// The action's animation finished.
    End,
    /// A multi-step card finished presenting step `n`.
    Step(u16),
}

impl fmt::Display for BarrierPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn => f.write_str("spawn"),
            Self::Hit => f.write_str("hit"),
            Self::End => f.write_str("end"),
            Self::Step(step) => write!(f, "step-{step}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct BarrierKey {
    pub token: BarrierToken,
    pub phase: BarrierPhase,
}

impl BarrierKey {
    pub const fn new(token: BarrierToken, phase: BarrierPhase) -> Self {
        Self { token, phase }
    }
}

impl fmt::Display for BarrierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token, self.phase)
    }
}

/// What a [`InteractionBarrier::signal`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// A pending wait was released.
    Released,
    /// No wait yet; the signal is held for the next one.
    Buffered,
    /// Duplicate, already-consumed or retired key.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BarrierError {
    #[error("wait on {0} was cancelled")]
    Cancelled(BarrierKey),

    #[error("a wait on {0} is already pending")]
    AlreadyWaiting(BarrierKey),
}

impl BarrierError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

struct PendingWait {
    wait_id: u64,
    tx: oneshot::Sender<()>,
}

#[derive(Default)]
struct BarrierState {
    pending: HashMap<BarrierKey, PendingWait>,
    buffered: HashSet<BarrierKey>,
    satisfied: HashSet<BarrierKey>,
    retired: RetiredTokens,
    next_wait: u64,
}

/// Retired tokens as a contiguous prefix plus the retirements past its end.
///
/// Tokens are minted in increasing order and retired roughly in that order,
/// so `ahead` only holds the few tokens retired before an older one.
#[derive(Debug, Default)]
struct RetiredTokens {
    through: u64,
    ahead: BTreeSet<u64>,
}

impl RetiredTokens {
    fn contains(&self, token: BarrierToken) -> bool {
        token.0 <= self.through || self.ahead.contains(&token.0)
    }

    fn insert(&mut self, token: BarrierToken) {
        if token.0 <= self.through {
            return;
        }
        self.ahead.insert(token.0);
        while self.ahead.remove(&(self.through + 1)) {
            self.through += 1;
        }
    }
}

/// Keyed rendezvous registry.
///
/// Cloning is cheap; clones share state, so the presentation side can hold
/// its own handle.
#[derive(Clone, Default)]
pub struct InteractionBarrier {
    state: Arc<Mutex<BarrierState>>,
    next_token: Arc<AtomicU64>,
}

impl InteractionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mints a token that no other caller of this barrier has seen.
    pub fn mint_token(&self) -> BarrierToken {
        BarrierToken(self.next_token.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Waits until `key` is signalled or the wait is cancelled.
    ///
    /// Completes immediately if a signal for `key` is already buffered. Only
    /// one wait per key may be pending at a time. Dropping the returned
    /// future withdraws the wait.
    pub async fn wait(
        &self,
        key: BarrierKey,
        cancel: &CancelToken,
    ) -> Result<(), BarrierError> {
        if cancel.is_cancelled() {
            return Err(BarrierError::Cancelled(key));
        }

        let (wait_id, rx) = {
            let mut state = self.lock();
            if state.buffered.remove(&key) {
                state.satisfied.insert(key);
                tracing::trace!(target: "runtime::barrier", %key, "Consumed buffered signal");
                return Ok(());
            }
            if state.pending.contains_key(&key) {
                return Err(BarrierError::AlreadyWaiting(key));
            }
            // A fresh wait re-arms a key that was satisfied before.
            state.satisfied.remove(&key);
            state.next_wait += 1;
            let wait_id = state.next_wait;
            let (tx, rx) = oneshot::channel();
            state.pending.insert(key, PendingWait { wait_id, tx });
            (wait_id, rx)
        };

        tracing::trace!(target: "runtime::barrier", %key, "Waiting");
        let _guard = WaitGuard {
            barrier: self,
            key,
            wait_id,
        };

        tokio::select! {
            received = rx => received.map_err(|_| {
                tracing::debug!(target: "runtime::barrier", %key, "Wait withdrawn");
                BarrierError::Cancelled(key)
            }),
            () = cancel.cancelled() => {
                tracing::debug!(target: "runtime::barrier", %key, "Wait cancelled");
                Err(BarrierError::Cancelled(key))
            }
        }
    }

    /// Signals `key`, releasing or buffering as described in the module docs.
    pub fn signal(&self, key: BarrierKey) -> SignalOutcome {
        let mut state = self.lock();

        if let Some(wait) = state.pending.remove(&key) {
            if wait.tx.send(()).is_ok() {
                state.satisfied.insert(key);
                tracing::trace!(target: "runtime::barrier", %key, "Released wait");
                return SignalOutcome::Released;
            }
            // The waiter went away between registering and now; keep the
            // signal for whoever waits next.
        }

        if state.retired.contains(key.token) || state.satisfied.contains(&key) {
            tracing::trace!(target: "runtime::barrier", %key, "Ignored signal");
            return SignalOutcome::Ignored;
        }
        if !state.buffered.insert(key) {
            tracing::trace!(target: "runtime::barrier", %key, "Ignored duplicate signal");
            return SignalOutcome::Ignored;
        }
        tracing::trace!(target: "runtime::barrier", %key, "Buffered signal");
        SignalOutcome::Buffered
    }

    /// Signals `key` after `delay` on a background task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn signal_after_delay(
        &self,
        key: BarrierKey,
        delay: Duration,
    ) -> JoinHandle<SignalOutcome> {
        let barrier = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            barrier.signal(key)
        })
    }

    /// Withdraws a pending wait on `key`; the waiter sees `Cancelled`.
    ///
    /// Returns false when no wait was pending.
    pub fn try_cancel(&self, key: BarrierKey) -> bool {
        let removed = self.lock().pending.remove(&key);
        removed.is_some()
    }

    /// Forgets every buffered or consumed signal of `token` and ignores any
    /// later signal for it.
    pub fn retire(&self, token: BarrierToken) {
        let mut state = self.lock();
        state.buffered.retain(|key| key.token != token);
        state.satisfied.retain(|key| key.token != token);
        state.retired.insert(token);
    }

    pub fn is_waiting(&self, key: BarrierKey) -> bool {
        self.lock().pending.contains_key(&key)
    }

    pub fn pending_waits(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn buffered_signals(&self) -> usize {
        self.lock().buffered.len()
    }

    /// Retired tokens tracked individually because an older token is still live.
    pub fn retired_backlog(&self) -> usize {
        self.lock().retired.ahead.len()
    }
}

impl fmt::Debug for InteractionBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("InteractionBarrier")
            .field("pending", &state.pending.len())
            .field("buffered", &state.buffered.len())
            .field("retired_through", &state.retired.through)
            .field("retired_backlog", &state.retired.ahead.len())
            .finish()
    }
}

/// Removes a wait's registration if its future is dropped before completion.
struct WaitGuard<'a> {
    barrier: &'a InteractionBarrier,
    key: BarrierKey,
    wait_id: u64,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.barrier.lock();
        if state
            .pending
            .get(&self.key)
            .is_some_and(|wait| wait.wait_id == self.wait_id)
        {
            state.pending.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(token: u64, phase: BarrierPhase) -> BarrierKey {
        BarrierToken::new(token).key(phase)
    }

    #[tokio::test]
    async fn signal_before_wait_is_buffered_once() {
        let barrier = InteractionBarrier::new();
        let cancel = CancelToken::new();
        let hit = key(1, BarrierPhase::Hit);

        assert_eq!(barrier.signal(hit), SignalOutcome::Buffered);
        assert_eq!(barrier.signal(hit), SignalOutcome::Ignored);
        barrier.wait(hit, &cancel).await.unwrap();
        assert_eq!(barrier.buffered_signals(), 0);
    }

    #[tokio::test]
    async fn wait_then_signal_releases() {
        let barrier = InteractionBarrier::new();
        let cancel = CancelToken::new();
        let end = key(2, BarrierPhase::End);

        let waiter = {
            let barrier = barrier.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { barrier.wait(end, &cancel).await })
        };
        while !barrier.is_waiting(end) {
            tokio::task::yield_now().await;
        }

        assert_eq!(barrier.signal(end), SignalOutcome::Released);
        waiter.await.unwrap().unwrap();
        assert_eq!(barrier.signal(end), SignalOutcome::Ignored);
        assert_eq!(barrier.pending_waits(), 0);
    }

    #[tokio::test]
    async fn second_concurrent_wait_is_rejected() {
        let barrier = InteractionBarrier::new();
        let cancel = CancelToken::new();
        let spawn = key(3, BarrierPhase::Spawn);

        let first = {
            let barrier = barrier.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { barrier.wait(spawn, &cancel).await })
        };
        while !barrier.is_waiting(spawn) {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            barrier.wait(spawn, &cancel).await,
            Err(BarrierError::AlreadyWaiting(spawn))
        );
        barrier.signal(spawn);
        first.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn retired_token_ignores_signals() {
        let barrier = InteractionBarrier::new();
        let token = barrier.mint_token();
        barrier.signal(token.key(BarrierPhase::End));
        barrier.retire(token);

        assert_eq!(barrier.buffered_signals(), 0);
        assert_eq!(barrier.signal(token.key(BarrierPhase::Hit)), SignalOutcome::Ignored);
    }

    #[test]
    fn retired_tokens_collapse_into_a_prefix() {
        let barrier = InteractionBarrier::new();
        for _ in 0..10_000 {
            let token = barrier.mint_token();
            barrier.retire(token);
        }
        assert_eq!(barrier.retired_backlog(), 0);

        let older = barrier.mint_token();
        let middle = barrier.mint_token();
        let newer = barrier.mint_token();
        barrier.retire(newer);
        barrier.retire(middle);
        assert_eq!(barrier.retired_backlog(), 2);
        assert_eq!(barrier.signal(middle.key(BarrierPhase::Hit)), SignalOutcome::Ignored);
        assert_eq!(barrier.signal(older.key(BarrierPhase::Hit)), SignalOutcome::Buffered);

        barrier.retire(older);
        assert_eq!(barrier.retired_backlog(), 0);
        assert_eq!(barrier.buffered_signals(), 0);
        assert_eq!(barrier.signal(older.key(BarrierPhase::End)), SignalOutcome::Ignored);
        assert_eq!(barrier.signal(newer.key(BarrierPhase::End)), SignalOutcome::Ignored);
    }

    #[test]
    fn minted_tokens_are_unique() {
        let barrier = InteractionBarrier::new();
        let clone = barrier.clone();
        let a = barrier.mint_token();
        let b = clone.mint_token();
        assert_ne!(a, b);
    }

    #[test]
    fn try_cancel_without_wait_is_false() {
        let barrier = InteractionBarrier::new();
        assert!(!barrier.try_cancel(key(9, BarrierPhase::Hit)));
    }
}
