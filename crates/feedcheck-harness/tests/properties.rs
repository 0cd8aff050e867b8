//! Run-level guarantees of the harness.
#![cfg_attr(
    test,
    allow(
        clippy::tests_outside_test_module,
        clippy::expect_used,
        reason = "Allow for integration tests"
    )
)]

use feedcheck_harness::{CaseOutcome, Done, RunConfig, Runner, Suite};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};

fn config_with_timeout(timeout_ms: u64) -> RunConfig {
    RunConfig {
        default_timeout_ms: timeout_ms,
        ..RunConfig::default()
    }
}

#[tokio::test]
async fn every_registered_case_gets_exactly_one_outcome() {
    let mut suite = Suite::new();
    suite
        .describe("First", |group| {
            group
                .it("sync pass", |_| Ok(()))
                .it("sync fail", |expect| {
                    expect.equal(&1, &2);
                    Ok(())
                })
                .it_async("async pass", |_, done| async move {
                    done.complete();
                    Ok(())
                });
            group.describe("Nested", |inner| {
                inner.it("nested pass", |_| Ok(()));
            });
        })
        .expect("valid suite");
    suite
        .describe("Second", |group| {
            group.it("errors", |_| Err(anyhow::anyhow!("fault")));
        })
        .expect("valid suite");

    let report = Runner::new(RunConfig::default()).run(&suite).await;

    assert_eq!(report.summary().total, suite.case_count());
    let mut names = report.completion_order();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), suite.case_count());
}

#[tokio::test]
async fn completion_order_follows_registration_order() {
    let mut suite = Suite::new();
    suite
        .describe("G1", |group| {
            group.it("A", |_| Ok(())).it("B", |_| Ok(()));
        })
        .expect("valid suite");
    suite
        .describe("G2", |group| {
            group.it("C", |_| Ok(()));
        })
        .expect("valid suite");

    let report = Runner::new(RunConfig::default()).run(&suite).await;

    assert!(report.is_success());
    assert_eq!(report.completion_order(), vec!["G1 > A", "G1 > B", "G2 > C"]);
}

#[tokio::test]
async fn interleaved_nested_groups_keep_execution_order() {
    let mut suite = Suite::new();
    suite
        .describe("Outer", |group| {
            group.it("first", |_| Ok(()));
            group.describe("Inner", |inner| {
                inner.it("second", |_| Ok(()));
            });
            group.it("third", |_| Ok(()));
        })
        .expect("valid suite");

    let report = Runner::new(RunConfig::default()).run(&suite).await;

    assert_eq!(
        report.completion_order(),
        vec!["Outer > first", "Outer > Inner > second", "Outer > third"]
    );
}

#[tokio::test]
async fn calling_done_twice_matches_calling_it_once() {
    let mut once = Suite::new();
    once.describe("Load", |group| {
        group.it_async("completes", |expect, done| async move {
            expect.greater_than(&3, &0);
            done.complete();
            Ok(())
        });
    })
    .expect("valid suite");

    let mut twice = Suite::new();
    twice
        .describe("Load", |group| {
            group.it_async("completes", |expect, done| async move {
                expect.greater_than(&3, &0);
                done.complete();
                done.complete();
                Ok(())
            });
        })
        .expect("valid suite");

    let first = Runner::new(RunConfig::default()).run(&once).await;
    let second = Runner::new(RunConfig::default()).run(&twice).await;

    let outcome = |report: &feedcheck_harness::Report| {
        report
            .case("Load", "completes")
            .expect("case ran")
            .outcome
            .clone()
    };
    assert_eq!(outcome(&first), CaseOutcome::Passed);
    assert_eq!(outcome(&first), outcome(&second));
}

#[tokio::test(start_paused = true)]
async fn silent_async_case_times_out_at_the_bound_and_run_continues() {
    let mut suite = Suite::new();
    suite
        .describe("Initial Entries", |group| {
            group
                .it_async("never completes", |_, done| async move {
                    sleep(Duration::from_secs(3600)).await;
                    done.complete();
                    Ok(())
                })
                .it("still runs", |_| Ok(()));
        })
        .expect("valid suite");

    let start = Instant::now();
    let report = Runner::new(config_with_timeout(5000)).run(&suite).await;

    let timed_out = report
        .case("Initial Entries", "never completes")
        .expect("case ran");
    assert_eq!(timed_out.outcome, CaseOutcome::TimedOut { after_ms: 5000 });
    assert_eq!(timed_out.elapsed_ms, 5000);
    assert_eq!(start.elapsed(), Duration::from_millis(5000));

    let next = report.case("Initial Entries", "still runs").expect("case ran");
    assert_eq!(next.outcome, CaseOutcome::Passed);
}

#[tokio::test(start_paused = true)]
async fn per_case_timeout_overrides_run_default() {
    let mut suite = Suite::new();
    suite
        .describe("Slow", |group| {
            group.it_async_with_timeout(
                "short bound",
                Duration::from_millis(250),
                |_, _done| async { Ok(()) },
            );
        })
        .expect("valid suite");

    let report = Runner::new(RunConfig::default()).run(&suite).await;
    assert_eq!(
        report.case("Slow", "short bound").expect("case ran").outcome,
        CaseOutcome::TimedOut { after_ms: 250 }
    );
}

#[tokio::test(start_paused = true)]
async fn stale_completion_after_timeout_is_ignored() {
    let stale: Arc<Mutex<Option<(Done, feedcheck_harness::Expect)>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&stale);

    let mut suite = Suite::new();
    suite
        .describe("Stale", |group| {
            group.it_async("times out", move |expect, done| {
                *slot.lock().expect("slot lock") = Some((done, expect));
                async { Ok(()) }
            });
        })
        .expect("valid suite");

    let report = Runner::new(config_with_timeout(100)).run(&suite).await;
    let outcome = report.case("Stale", "times out").expect("case ran").outcome.clone();
    assert_eq!(outcome, CaseOutcome::TimedOut { after_ms: 100 });

    let (done, expect) = stale.lock().expect("slot lock").take().expect("handles kept");
    expect.fail("late assertion");
    done.complete();

    assert!(expect.is_sealed());
    assert!(expect.failures().is_empty());
    assert_eq!(
        report.case("Stale", "times out").expect("case ran").outcome,
        outcome
    );
}

#[tokio::test]
async fn faulting_before_each_is_isolated_to_its_group() {
    let body_ran = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&body_ran);

    let mut suite = Suite::new();
    suite
        .describe("Broken setup", move |group| {
            group
                .before_each(|| Err(anyhow::anyhow!("page not ready")))
                .it("first", move |_| {
                    *flag.lock().expect("flag lock") = true;
                    Ok(())
                })
                .it("second", |_| Ok(()));
        })
        .expect("valid suite");
    suite
        .describe("Sibling", |group| {
            group.it("passes", |expect| {
                expect.is_true(true);
                Ok(())
            });
        })
        .expect("valid suite");

    let report = Runner::new(RunConfig::default()).run(&suite).await;

    for name in ["first", "second"] {
        assert_eq!(
            report.case("Broken setup", name).expect("case ran").outcome,
            CaseOutcome::Errored {
                fault: "beforeEach hook failed: page not ready".to_owned()
            }
        );
    }
    assert!(!*body_ran.lock().expect("flag lock"));
    assert_eq!(
        report.case("Sibling", "passes").expect("case ran").outcome,
        CaseOutcome::Passed
    );
    assert!(!report.is_success());
}
