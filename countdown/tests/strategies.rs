mod common;

use common::*;
use countdown::{
    BackgroundScheduler, CancellationToken, CooperativeTask, DeferredCallbackQueue,
    ExecutionStrategy, PushStream, StrategyKind, TaskState,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn every_strategy_runs_to_completion() {
    let owner = owner();

    for kind in StrategyKind::ALL {
        let (recorder, rx) = Recorder::new(owner.delivery());
        let handle = start(&owner, kind, &recorder);

        assert_eq!(wait_for_end(&rx), Event::Complete, "{kind}");
        linger();

        assert_eq!(recorder.events(), full_run(), "{kind}");
        assert_eq!(recorder.violations(), 0, "{kind}");
        assert_eq!(handle.state(), TaskState::Completed, "{kind}");
    }

    owner.shutdown();
}

#[test]
fn ticks_keep_their_spacing() {
    let owner = owner();

    for kind in StrategyKind::ALL {
        let (recorder, rx) = Recorder::new(owner.delivery());
        let started = Instant::now();
        start(&owner, kind, &recorder);
        assert_eq!(wait_for_end(&rx), Event::Complete, "{kind}");

        let timeline = recorder.timeline();
        assert_eq!(timeline.len(), 12, "{kind}");
        let (ticks, complete) = timeline.split_at(11);

        // Tick `n` is never early, however late the ones before it were
        for (n, (at, _)) in ticks.iter().enumerate() {
            let elapsed = at.duration_since(started);
            assert!(elapsed >= INTERVAL * n as u32, "{kind}: tick {n} after {elapsed:?}");
        }

        // Only the stream's timer catches up after a late delivery
        if kind != StrategyKind::PushStream {
            for pair in ticks.windows(2) {
                let gap = pair[1].0.duration_since(pair[0].0);
                assert!(gap >= INTERVAL, "{kind}: {:?} then {:?} {gap:?} apart", pair[0].1, pair[1].1);
            }
        }

        let last_tick = ticks[10].0;
        let completion = complete[0].0.duration_since(last_tick);
        if kind == StrategyKind::PushStream {
            assert!(completion < INTERVAL, "{kind}: completed {completion:?} after tick 0");
        } else {
            assert!(completion >= INTERVAL, "{kind}: completed {completion:?} after tick 0");
        }
    }

    owner.shutdown();
}

#[test]
fn zero_interval_runs_at_the_minimum_spacing() {
    let owner = owner_with_interval(Duration::ZERO);

    for kind in StrategyKind::ALL {
        let (recorder, rx) = Recorder::new(owner.delivery());
        let handle = start(&owner, kind, &recorder);

        assert_eq!(wait_for_end(&rx), Event::Complete, "{kind}");
        linger();

        assert_eq!(recorder.events(), full_run(), "{kind}");
        assert_eq!(recorder.violations(), 0, "{kind}");
        assert_eq!(handle.state(), TaskState::Completed, "{kind}");
    }

    owner.shutdown();
}

#[test]
fn cancel_before_the_first_tick_delivers_nothing() {
    let owner = owner();

    for kind in StrategyKind::ALL {
        let (recorder, _rx) = Recorder::new(owner.delivery());
        let o = owner.clone();
        let r = recorder.clone();

        // Still on the delivery context, so no tick can have run yet
        let handle = owner
            .delivery()
            .run_sync(move || {
                let handle = o.start(kind, r);
                handle.cancel();
                handle
            })
            .unwrap();
        linger();

        assert!(recorder.events().is_empty(), "{kind}");
        assert_eq!(handle.state(), TaskState::Cancelled, "{kind}");
    }

    owner.shutdown();
}

#[test]
fn cancel_after_a_tick_stops_the_run_there() {
    let owner = owner();

    for kind in StrategyKind::ALL {
        let (recorder, rx) = Recorder::cancelling_at(owner.delivery(), 7);
        let handle = start(&owner, kind, &recorder);

        wait_for_tick(&rx, 7);
        linger();

        assert_eq!(recorder.ticks(), [10, 9, 8, 7], "{kind}");
        assert!(!recorder.events().contains(&Event::Complete), "{kind}");
        assert_eq!(recorder.violations(), 0, "{kind}");
        assert_eq!(handle.state(), TaskState::Cancelled, "{kind}");
    }

    owner.shutdown();
}

#[test]
fn cancel_from_another_thread_stops_the_run() {
    let owner = owner();

    for kind in StrategyKind::ALL {
        let (recorder, rx) = Recorder::new(owner.delivery());
        let handle = start(&owner, kind, &recorder);

        wait_for_tick(&rx, 8);
        handle.cancel();
        linger();

        let ticks = recorder.ticks();
        let last = *ticks.last().unwrap();
        assert!(last <= 8 && last > 0, "{kind}: {ticks:?}");
        assert!(!recorder.events().contains(&Event::Complete), "{kind}");
        assert_eq!(handle.state(), TaskState::Cancelled, "{kind}");
    }

    owner.shutdown();
}

#[test]
fn repeated_and_late_cancels_are_harmless() {
    let owner = owner();

    for kind in StrategyKind::ALL {
        let (recorder, rx) = Recorder::new(owner.delivery());
        let handle = start(&owner, kind, &recorder);

        assert_eq!(wait_for_end(&rx), Event::Complete, "{kind}");
        handle.cancel();
        handle.cancel();
        handle.clone().cancel();

        assert_eq!(handle.state(), TaskState::Completed, "{kind}");
        assert_eq!(recorder.events(), full_run(), "{kind}");
    }

    owner.shutdown();
}

#[test]
fn concurrent_runs_share_one_orderly_delivery_context() {
    let owner = owner();

    let runs: Vec<_> = StrategyKind::ALL
        .into_iter()
        .map(|kind| {
            let (recorder, rx) = Recorder::new(owner.delivery());
            start(&owner, kind, &recorder);
            (kind, recorder, rx)
        })
        .collect();

    for (kind, recorder, rx) in &runs {
        assert_eq!(wait_for_end(rx), Event::Complete, "{kind}");
        assert_eq!(recorder.events(), full_run(), "{kind}");
        assert_eq!(recorder.violations(), 0, "{kind}");
    }

    owner.shutdown();
}

#[test]
fn stream_reports_an_unavailable_scheduler() {
    let owner = owner();
    owner.scheduler().shutdown();

    let (recorder, rx) = Recorder::new(owner.delivery());
    let handle = start(&owner, StrategyKind::PushStream, &recorder);

    assert!(matches!(wait_for_end(&rx), Event::Error(_)));
    linger();

    assert_eq!(recorder.events().len(), 1);
    assert_eq!(handle.state(), TaskState::Cancelled);

    owner.shutdown();
}

#[test]
fn scheduler_shutdown_mid_run_ends_background_runs() {
    for kind in [StrategyKind::PushStream, StrategyKind::CooperativeTask] {
        let owner = owner();
        let (recorder, rx) = Recorder::new(owner.delivery());
        let handle = start(&owner, kind, &recorder);

        wait_for_tick(&rx, 8);
        owner.scheduler().shutdown();
        linger();

        let events = recorder.events();
        let errors = events.iter().filter(|e| matches!(e, Event::Error(_))).count();
        assert!(!events.contains(&Event::Complete), "{kind}");
        assert_eq!(handle.state(), TaskState::Cancelled, "{kind}");
        assert!(!owner.is_busy(), "{kind}");
        assert_eq!(recorder.violations(), 0, "{kind}");

        if kind == StrategyKind::PushStream {
            assert_eq!(errors, 1, "{kind}");
            assert_eq!(
                events.last(),
                Some(&Event::Error(
                    "The background scheduler is unavailable".to_string()
                ))
            );
        } else {
            assert_eq!(errors, 0, "{kind}");
        }

        owner.shutdown();
    }
}

#[test]
fn stream_reports_a_failing_timer() {
    let owner = owner();

    // No timer driver, so the interval cannot be created
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()
        .unwrap();
    let scheduler = Arc::new(BackgroundScheduler::from_handle(runtime.handle().clone()));
    let strategy = PushStream::new(owner.delivery().clone(), scheduler);

    let (recorder, rx) = Recorder::new(owner.delivery());
    let handle = strategy.start(recorder.clone(), &CancellationToken::new());

    match wait_for_end(&rx) {
        Event::Error(message) => assert!(message.starts_with("Failed to schedule"), "{message}"),
        other => panic!("unexpected {other:?}"),
    }
    linger();

    assert!(recorder.ticks().is_empty());
    assert_eq!(recorder.violations(), 0);
    assert_eq!(handle.state(), TaskState::Cancelled);

    owner.shutdown();
}

#[test]
fn cooperative_task_without_a_scheduler_ends_quietly() {
    let owner = owner();
    let scheduler = Arc::new(BackgroundScheduler::from_handle(
        owner.scheduler().handle().clone(),
    ));
    scheduler.shutdown();

    let (recorder, _rx) = Recorder::new(owner.delivery());
    let handle = CooperativeTask::new(owner.delivery().clone(), scheduler)
        .start(recorder.clone(), &CancellationToken::new());
    linger();

    assert!(recorder.events().is_empty());
    assert_eq!(handle.state(), TaskState::Cancelled);

    owner.shutdown();
}

#[test]
fn deferred_callbacks_need_a_live_delivery_context() {
    let owner = owner();
    owner.delivery().join();

    let (recorder, _rx) = Recorder::new(owner.delivery());
    let handle = DeferredCallbackQueue::new(owner.delivery().clone())
        .start(recorder.clone(), &CancellationToken::new());

    assert!(recorder.events().is_empty());
    assert_eq!(handle.state(), TaskState::Cancelled);

    owner.shutdown();
}

#[test]
fn cancelling_the_parent_token_cancels_the_run() {
    let owner = owner();
    let parent = CancellationToken::new();

    let (recorder, rx) = Recorder::new(owner.delivery());
    let strategy = DeferredCallbackQueue::new(owner.delivery().clone());
    let handle = strategy.start(recorder.clone(), &parent);

    wait_for_tick(&rx, 10);
    parent.cancel();
    linger();

    assert!(!recorder.events().contains(&Event::Complete));
    assert_eq!(handle.state(), TaskState::Cancelled);

    owner.shutdown();
}
