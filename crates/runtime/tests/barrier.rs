//! Interaction barrier orderings between a waiting battle and a presenter.

use std::time::Duration;

use runtime::{BarrierError, BarrierPhase, CancelToken, InteractionBarrier, SignalOutcome};

#[tokio::test]
async fn delayed_signal_releases_a_pending_wait() {
    let barrier = InteractionBarrier::new();
    let token = barrier.mint_token();
    let hit = token.key(BarrierPhase::Hit);

    let signal = barrier.signal_after_delay(hit, Duration::from_millis(5));
    barrier.wait(hit, &CancelToken::new()).await.unwrap();

    assert_eq!(signal.await.unwrap(), SignalOutcome::Released);
    assert_eq!(barrier.pending_waits(), 0);
}

#[tokio::test]
async fn early_signal_is_consumed_by_exactly_one_wait() {
    let barrier = InteractionBarrier::new();
    let key = barrier.mint_token().key(BarrierPhase::End);
    let cancel = CancelToken::new();

    assert_eq!(barrier.signal(key), SignalOutcome::Buffered);
    assert_eq!(barrier.signal(key), SignalOutcome::Ignored);
    barrier.wait(key, &cancel).await.unwrap();

    // The buffered signal is gone; a fresh wait blocks until signalled again.
    let waiter = {
        let barrier = barrier.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { barrier.wait(key, &cancel).await })
    };
    while !barrier.is_waiting(key) {
        tokio::task::yield_now().await;
    }
    assert_eq!(barrier.signal(key), SignalOutcome::Released);
    waiter.await.unwrap().unwrap();
}

#[tokio::test]
async fn step_keys_of_one_token_are_independent() {
    let barrier = InteractionBarrier::new();
    let token = barrier.mint_token();
    let cancel = CancelToken::new();

    barrier.signal(token.key(BarrierPhase::Step(1)));
    assert_eq!(barrier.buffered_signals(), 1);

    let step_zero = {
        let barrier = barrier.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { barrier.wait(token.key(BarrierPhase::Step(0)), &cancel).await })
    };
    while !barrier.is_waiting(token.key(BarrierPhase::Step(0))) {
        tokio::task::yield_now().await;
    }
    barrier.signal(token.key(BarrierPhase::Step(0)));
    step_zero.await.unwrap().unwrap();
    barrier.wait(token.key(BarrierPhase::Step(1)), &cancel).await.unwrap();
}

#[tokio::test]
async fn cancel_token_ends_every_wait_of_a_battle() {
    let barrier = InteractionBarrier::new();
    let cancel = CancelToken::new();
    let spawn = barrier.mint_token().key(BarrierPhase::Spawn);

    let waiter = {
        let barrier = barrier.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { barrier.wait(spawn, &cancel).await })
    };
    while barrier.pending_waits() == 0 {
        tokio::task::yield_now().await;
    }
    cancel.cancel();

    assert_eq!(waiter.await.unwrap(), Err(BarrierError::Cancelled(spawn)));
    assert_eq!(barrier.pending_waits(), 0);

    // Waits started after cancellation fail straight away.
    let late = barrier.mint_token().key(BarrierPhase::Hit);
    assert_eq!(
        barrier.wait(late, &cancel).await,
        Err(BarrierError::Cancelled(late))
    );
}

#[tokio::test]
async fn dropped_wait_leaves_no_pending_entry() {
    let barrier = InteractionBarrier::new();
    let key = barrier.mint_token().key(BarrierPhase::Hit);
    let cancel = CancelToken::new();

    let timed_out =
        tokio::time::timeout(Duration::from_millis(5), barrier.wait(key, &cancel)).await;
    assert!(timed_out.is_err());
    assert!(!barrier.is_waiting(key));

    // A later signal is buffered for the next wait instead of being lost.
    assert_eq!(barrier.signal(key), SignalOutcome::Buffered);
    barrier.wait(key, &cancel).await.unwrap();
}

#[tokio::test]
async fn withdrawn_wait_reports_cancelled() {
    let barrier = InteractionBarrier::new();
    let end = barrier.mint_token().key(BarrierPhase::End);

    let waiter = {
        let barrier = barrier.clone();
        tokio::spawn(async move { barrier.wait(end, &CancelToken::new()).await })
    };
    while !barrier.is_waiting(end) {
        tokio::task::yield_now().await;
    }

    assert!(barrier.try_cancel(end));
    assert_eq!(waiter.await.unwrap(), Err(BarrierError::Cancelled(end)));
    assert!(!barrier.try_cancel(end));
    assert_eq!(barrier.pending_waits(), 0);
}
