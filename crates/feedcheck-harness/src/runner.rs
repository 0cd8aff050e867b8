//! Suite execution.
//!
//! Groups run in registration order and cases run strictly one after another:
//! each case is fully resolved (passed, failed, errored, or timed out) before
//! the next one starts. Async bodies are spawned onto the runtime only so that
//! they can be aborted once their bound elapses.

use crate::completion::{Completion, Done, Signal};
use crate::config::RunConfig;
use crate::expect::Expect;
use crate::report::{CaseOutcome, CaseReport, GroupReport, Report, full_name, millis};
use crate::reporter::Reporter;
use crate::suite::{BodyResult, Case, CaseBody, Entry, Group, Hook, HookKind, Suite};
use core::any::Any;
use core::time::Duration;
use futures::FutureExt as _;
use futures::future::BoxFuture;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::task::JoinError;
use tokio::time::{Instant, sleep};

/// How an async body ended.
#[derive(Debug, PartialEq, Eq)]
enum Settled {
    /// Completion was signalled
    Completed,
    /// The body errored, panicked, or called [`Done::fail`]
    Faulted(String),
    /// The bound elapsed first
    TimedOut,
}

/// Executes suites and collects their reports.
pub struct Runner {
    /// Run settings
    config: RunConfig,
    /// Streaming observers
    reporters: Vec<Box<dyn Reporter>>,
    /// Execution index handed to the next finished case
    next_index: usize,
}

impl Runner {
    /// Create a runner with the given settings and no reporters.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            reporters: Vec::new(),
            next_index: 0,
        }
    }

    /// Add a streaming reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    /// Run settings.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute every registered group and return the report.
    pub async fn run(&mut self, suite: &Suite) -> Report {
        let start = Instant::now();
        self.next_index = 0;
        tracing::debug!(
            "Running {} groups ({} cases)",
            suite.group_count(),
            suite.case_count()
        );

        let mut groups = Vec::new();
        for group in suite.groups() {
            self.run_group(group, Vec::new(), &mut groups).await;
        }

        let report = Report {
            groups,
            elapsed_ms: millis(start.elapsed()),
        };
        let summary = report.summary();
        tracing::info!(
            "{} cases: {} passed, {} failed, {} errored, {} timed out",
            summary.total,
            summary.passed,
            summary.failed,
            summary.errored,
            summary.timed_out
        );
        report
    }

    fn run_group<'run>(
        &'run mut self,
        group: &'run Group,
        parents: Vec<&'run Group>,
        out: &'run mut Vec<GroupReport>,
    ) -> BoxFuture<'run, ()> {
        async move {
            let config = self.config.clone();
            if !group.has_selected(&|name: &str| config.selects(name)) {
                tracing::debug!("Skipping group '{}': no selected cases", group.name);
                return;
            }

            for reporter in &mut self.reporters {
                reporter.group_started(&group.name);
            }

            let slot = out.len();
            out.push(GroupReport {
                name: group.name.clone(),
                ..GroupReport::default()
            });

            let mut lineage = parents;
            lineage.push(group);

            let setup_fault = match &group.hooks.before_all {
                Some(hook) => {
                    run_hook(hook, HookKind::BeforeAll, &group.name, config.default_timeout())
                        .await
                        .err()
                }
                None => None,
            };

            for entry in &group.entries {
                match entry {
                    Entry::Case(case) => {
                        if !config.selects(&full_name(&group.name, &case.name)) {
                            continue;
                        }
                        let (outcome, elapsed) = match &setup_fault {
                            Some(fault) => (
                                CaseOutcome::Errored {
                                    fault: format!("beforeAll hook failed: {fault}"),
                                },
                                Duration::ZERO,
                            ),
                            None => run_case(case, &group.name, &lineage, &config).await,
                        };
                        let report = self.finish_case(&group.name, &case.name, outcome, elapsed);
                        out[slot].cases.push(report);
                    }
                    Entry::Group(nested) => match &setup_fault {
                        Some(fault) => self.skip_group(nested, fault, out),
                        None => self.run_group(nested, lineage.clone(), out).await,
                    },
                }
            }

            out[slot].setup_fault = setup_fault;
            if let Some(hook) = &group.hooks.after_all {
                out[slot].teardown_fault =
                    run_hook(hook, HookKind::AfterAll, &group.name, config.default_timeout())
                        .await
                        .err();
            }

            for reporter in &mut self.reporters {
                reporter.group_finished(&out[slot]);
            }
        }
        .boxed()
    }

    /// Mark every selected case under `group` as errored by an ancestor's
    /// failed setup-once hook. No hooks of `group` run.
    fn skip_group(&mut self, group: &Group, fault: &str, out: &mut Vec<GroupReport>) {
        if !group.has_selected(&|name: &str| self.config.selects(name)) {
            return;
        }

        let slot = out.len();
        out.push(GroupReport {
            name: group.name.clone(),
            ..GroupReport::default()
        });

        for entry in &group.entries {
            match entry {
                Entry::Case(case) => {
                    if !self.config.selects(&full_name(&group.name, &case.name)) {
                        continue;
                    }
                    let outcome = CaseOutcome::Errored {
                        fault: format!("beforeAll hook failed: {fault}"),
                    };
                    let report = self.finish_case(&group.name, &case.name, outcome, Duration::ZERO);
                    out[slot].cases.push(report);
                }
                Entry::Group(nested) => self.skip_group(nested, fault, out),
            }
        }
    }

    fn finish_case(
        &mut self,
        group: &str,
        name: &str,
        outcome: CaseOutcome,
        elapsed: Duration,
    ) -> CaseReport {
        let report = CaseReport {
            group: group.to_owned(),
            name: name.to_owned(),
            outcome,
            elapsed_ms: millis(elapsed),
            index: self.next_index,
        };
        self.next_index += 1;

        for reporter in &mut self.reporters {
            reporter.case_finished(&report);
        }
        report
    }
}

/// Run one case with the per-case hooks of its whole lineage.
async fn run_case(
    case: &Case,
    group: &str,
    lineage: &[&Group],
    config: &RunConfig,
) -> (CaseOutcome, Duration) {
    let start = Instant::now();
    let hook_bound = config.default_timeout();
    tracing::debug!("Running case '{}'", full_name(group, &case.name));

    let mut setup_fault = None;
    for hook in lineage
        .iter()
        .filter_map(|ancestor| ancestor.hooks.before_each.as_ref())
    {
        if let Err(fault) = run_hook(hook, HookKind::BeforeEach, group, hook_bound).await {
            setup_fault = Some(fault);
            break;
        }
    }

    let mut outcome = match setup_fault {
        Some(fault) => CaseOutcome::Errored {
            fault: format!("beforeEach hook failed: {fault}"),
        },
        None => run_body(case, case.timeout.unwrap_or(hook_bound)).await,
    };

    for hook in lineage
        .iter()
        .rev()
        .filter_map(|ancestor| ancestor.hooks.after_each.as_ref())
    {
        let Err(fault) = run_hook(hook, HookKind::AfterEach, group, hook_bound).await else {
            continue;
        };
        if matches!(outcome, CaseOutcome::Passed | CaseOutcome::Failed { .. }) {
            outcome = CaseOutcome::Errored {
                fault: format!("afterEach hook failed: {fault}"),
            };
        } else {
            tracing::warn!(
                "afterEach hook failed after '{}' was already {}: {fault}",
                case.name,
                outcome.label()
            );
        }
    }

    (outcome, start.elapsed())
}

/// Run a case body and turn its ending into an outcome.
async fn run_body(case: &Case, bound: Duration) -> CaseOutcome {
    let expect = Expect::new();

    match &case.body {
        CaseBody::Sync(body) => {
            let fault = match catch_unwind(AssertUnwindSafe(|| body(&expect))) {
                Ok(Ok(())) => None,
                Ok(Err(error)) => Some(format!("{error:#}")),
                Err(payload) => Some(panic_message(payload.as_ref())),
            };
            let failures = expect.seal();
            fault.map_or_else(
                || CaseOutcome::from_failures(failures),
                |fault| CaseOutcome::Errored { fault },
            )
        }
        CaseBody::Async(body) => {
            let (done, completion) = Done::pair();
            let settled = match catch_unwind(AssertUnwindSafe(|| body(expect.clone(), done))) {
                Ok(future) => await_completion(future, completion, bound).await,
                Err(payload) => Settled::Faulted(panic_message(payload.as_ref())),
            };
            let failures = expect.seal();
            match settled {
                Settled::Completed => CaseOutcome::from_failures(failures),
                Settled::Faulted(fault) => CaseOutcome::Errored { fault },
                Settled::TimedOut => {
                    tracing::warn!("Case '{}' timed out after {bound:?}", case.name);
                    CaseOutcome::timed_out(bound)
                }
            }
        }
    }
}

/// Run a hook. A timeout counts as a fault.
async fn run_hook(
    hook: &Hook,
    kind: HookKind,
    group: &str,
    bound: Duration,
) -> Result<(), String> {
    tracing::debug!("Running {} hook of '{group}'", kind.label());

    let result = match hook {
        Hook::Sync(body) => match catch_unwind(AssertUnwindSafe(|| body())) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(format!("{error:#}")),
            Err(payload) => Err(panic_message(payload.as_ref())),
        },
        Hook::Async(body) => {
            let (done, completion) = Done::pair();
            let settled = match catch_unwind(AssertUnwindSafe(|| body(done))) {
                Ok(future) => await_completion(future, completion, bound).await,
                Err(payload) => Settled::Faulted(panic_message(payload.as_ref())),
            };
            match settled {
                Settled::Completed => Ok(()),
                Settled::Faulted(fault) => Err(fault),
                Settled::TimedOut => Err(format!("timed out after {}ms", millis(bound))),
            }
        }
    };

    if let Err(fault) = &result {
        tracing::warn!("{} hook of '{group}' failed: {fault}", kind.label());
    }
    result
}

/// Race the completion signal, the body task, and the bound.
///
/// A body that returns `Ok` without signalling keeps the case pending. If
/// every [`Done`] handle is dropped unresolved, only the bound is left.
async fn await_completion(
    future: BoxFuture<'static, BodyResult>,
    mut completion: Completion,
    bound: Duration,
) -> Settled {
    let mut task = tokio::spawn(future);
    let deadline = sleep(bound);
    tokio::pin!(deadline);

    let mut body_returned = false;
    let mut handles_dropped = false;

    let settled = loop {
        tokio::select! {
            biased;
            joined = &mut task, if !body_returned => match joined {
                Ok(Ok(())) => body_returned = true,
                Ok(Err(error)) => break Settled::Faulted(format!("{error:#}")),
                Err(error) => break Settled::Faulted(join_fault(error)),
            },
            signal = &mut completion, if !handles_dropped => match signal {
                Ok(Signal::Complete) => break Settled::Completed,
                Ok(Signal::Fail(reason)) => break Settled::Faulted(reason),
                Err(_) => handles_dropped = true,
            },
            () = &mut deadline => break Settled::TimedOut,
        }
    };

    task.abort();
    settled
}

fn join_fault(error: JoinError) -> String {
    match error.try_into_panic() {
        Ok(payload) => panic_message(payload.as_ref()),
        Err(error) => format!("task failed: {error}"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    format!("panicked: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn explode() -> BodyResult {
        panic!("async boom")
    }

    fn run_config(timeout_ms: u64) -> RunConfig {
        RunConfig {
            default_timeout_ms: timeout_ms,
            ..RunConfig::default()
        }
    }

    #[tokio::test]
    async fn test_sync_outcomes() {
        let mut suite = Suite::new();
        suite
            .describe("Sync", |group| {
                group
                    .it("passes", |expect| {
                        expect.equal(&1, &1);
                        Ok(())
                    })
                    .it("fails twice", |expect| {
                        expect.is_true(false);
                        expect.greater_than(&0, &1);
                        Ok(())
                    })
                    .it("errors", |_| Err(anyhow::anyhow!("no feed list")))
                    .it("panics", |_| panic!("boom"));
            })
            .expect("valid suite");

        let report = Runner::new(RunConfig::default()).run(&suite).await;

        let outcome = |name: &str| report.case("Sync", name).expect("case ran").outcome.clone();
        assert_eq!(outcome("passes"), CaseOutcome::Passed);
        assert!(matches!(outcome("fails twice"), CaseOutcome::Failed { failures } if failures.len() == 2));
        assert_eq!(
            outcome("errors"),
            CaseOutcome::Errored {
                fault: "no feed list".to_owned()
            }
        );
        assert_eq!(
            outcome("panics"),
            CaseOutcome::Errored {
                fault: "panicked: boom".to_owned()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_body_returning_without_done_waits_for_bound() {
        let mut suite = Suite::new();
        suite
            .describe("Async", |group| {
                group.it_async("never signals", |_, _done| async { Ok(()) });
            })
            .expect("valid suite");

        let report = Runner::new(run_config(300)).run(&suite).await;
        let case = report.case("Async", "never signals").expect("case ran");
        assert_eq!(case.outcome, CaseOutcome::TimedOut { after_ms: 300 });
        assert_eq!(case.elapsed_ms, 300);
    }

    #[tokio::test]
    async fn test_done_fail_and_async_panic_are_faults() {
        let mut suite = Suite::new();
        suite
            .describe("Async", |group| {
                group
                    .it_async("fails", |_, done| async move {
                        done.fail("feed unavailable");
                        Ok(())
                    })
                    .it_async("panics", |_, _done| async { explode() });
            })
            .expect("valid suite");

        let report = Runner::new(RunConfig::default()).run(&suite).await;
        assert_eq!(
            report.case("Async", "fails").expect("case ran").outcome,
            CaseOutcome::Errored {
                fault: "feed unavailable".to_owned()
            }
        );
        assert_eq!(
            report.case("Async", "panics").expect("case ran").outcome,
            CaseOutcome::Errored {
                fault: "panicked: async boom".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_hook_order_with_nesting() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut suite = Suite::new();

        let record = |entry: &'static str| {
            let log = Arc::clone(&log);
            move || -> BodyResult {
                log.lock().expect("log lock").push(entry);
                Ok(())
            }
        };

        suite
            .describe("Outer", |group| {
                group
                    .before_all(record("outer beforeAll"))
                    .before_each(record("outer beforeEach"))
                    .after_each(record("outer afterEach"))
                    .after_all(record("outer afterAll"));
                let case_log = Arc::clone(&log);
                group.describe("Inner", move |inner| {
                    inner
                        .before_each(record("inner beforeEach"))
                        .after_each(record("inner afterEach"))
                        .it("case", move |_| {
                            case_log.lock().expect("log lock").push("case");
                            Ok(())
                        });
                });
            })
            .expect("valid suite");

        let report = Runner::new(RunConfig::default()).run(&suite).await;
        assert!(report.is_success());
        assert_eq!(
            *log.lock().expect("log lock"),
            vec![
                "outer beforeAll",
                "outer beforeEach",
                "inner beforeEach",
                "case",
                "inner afterEach",
                "outer afterEach",
                "outer afterAll",
            ]
        );
    }

    #[tokio::test]
    async fn test_before_all_fault_errors_whole_group_but_teardown_runs() {
        let torn_down = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&torn_down);
        let mut suite = Suite::new();
        suite
            .describe("Broken", |group| {
                group
                    .before_all(|| Err(anyhow::anyhow!("no page")))
                    .after_all(move || {
                        *flag.lock().expect("flag lock") = true;
                        Ok(())
                    })
                    .it("first", |_| Ok(()));
                group.describe("Nested", |inner| {
                    inner.it("second", |_| Ok(()));
                });
            })
            .expect("valid suite");

        let report = Runner::new(RunConfig::default()).run(&suite).await;

        assert_eq!(report.summary().errored, 2);
        assert_eq!(report.groups[0].setup_fault.as_deref(), Some("no page"));
        let nested = report.case("Broken > Nested", "second").expect("case reported");
        assert_eq!(
            nested.outcome,
            CaseOutcome::Errored {
                fault: "beforeAll hook failed: no page".to_owned()
            }
        );
        assert!(*torn_down.lock().expect("flag lock"));
    }

    #[tokio::test]
    async fn test_after_each_fault_turns_pass_into_error() {
        let mut suite = Suite::new();
        suite
            .describe("Teardown", |group| {
                group
                    .after_each(|| Err(anyhow::anyhow!("cleanup failed")))
                    .it("passes", |_| Ok(()));
            })
            .expect("valid suite");

        let report = Runner::new(RunConfig::default()).run(&suite).await;
        assert_eq!(
            report.case("Teardown", "passes").expect("case ran").outcome,
            CaseOutcome::Errored {
                fault: "afterEach hook failed: cleanup failed".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_after_all_fault_is_recorded_on_group_only() {
        let mut suite = Suite::new();
        suite
            .describe("Restore", |group| {
                group
                    .after_all(|| Err(anyhow::anyhow!("restore failed")))
                    .it("passes", |_| Ok(()));
            })
            .expect("valid suite");

        let report = Runner::new(RunConfig::default()).run(&suite).await;
        assert_eq!(report.summary().passed, 1);
        assert_eq!(
            report.groups[0].teardown_fault.as_deref(),
            Some("restore failed")
        );
        assert!(!report.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_hook_timeout_is_a_fault() {
        let mut suite = Suite::new();
        suite
            .describe("Slow setup", |group| {
                group
                    .before_each_async(|_done| async { Ok(()) })
                    .it("case", |_| Ok(()));
            })
            .expect("valid suite");

        let report = Runner::new(run_config(100)).run(&suite).await;
        assert_eq!(
            report.case("Slow setup", "case").expect("case ran").outcome,
            CaseOutcome::Errored {
                fault: "beforeEach hook failed: timed out after 100ms".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_filter_skips_unselected_groups_entirely() {
        let setup_ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&setup_ran);
        let mut suite = Suite::new();
        suite
            .describe("RSS Feeds", |group| {
                group.it("are defined", |_| Ok(()));
            })
            .expect("valid suite");
        suite
            .describe("The menu", move |group| {
                group
                    .before_all(move || {
                        *flag.lock().expect("flag lock") = true;
                        Ok(())
                    })
                    .it("menu is hidden", |_| Ok(()));
            })
            .expect("valid suite");

        let config = RunConfig {
            filter: Some("are defined".to_owned()),
            ..RunConfig::default()
        };
        let report = Runner::new(config).run(&suite).await;

        assert_eq!(report.completion_order(), vec!["RSS Feeds > are defined"]);
        assert_eq!(report.groups.len(), 1);
        assert!(!*setup_ran.lock().expect("flag lock"));
    }

    #[derive(Default)]
    struct Recording {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Reporter for Recording {
        fn group_started(&mut self, name: &str) {
            self.events.lock().expect("events lock").push(format!("start {name}"));
        }

        fn case_finished(&mut self, case: &CaseReport) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("{} {}", case.name, case.outcome.label()));
        }

        fn group_finished(&mut self, group: &GroupReport) {
            self.events.lock().expect("events lock").push(format!("end {}", group.name));
        }
    }

    #[tokio::test]
    async fn test_reporters_are_streamed_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut suite = Suite::new();
        suite
            .describe("Group", |group| {
                group
                    .it("a", |_| Ok(()))
                    .it("b", |expect| {
                        expect.fail("nope");
                        Ok(())
                    });
            })
            .expect("valid suite");

        let mut runner = Runner::new(RunConfig::default())
            .with_reporter(Recording {
                events: Arc::clone(&events),
            })
            .with_reporter(crate::reporter::TracingReporter);
        runner.run(&suite).await;

        assert_eq!(
            *events.lock().expect("events lock"),
            vec!["start Group", "a passed", "b failed", "end Group"]
        );
    }

    #[test]
    fn test_panic_message_payloads() {
        let text: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(text.as_ref()), "panicked: static");

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "panicked: owned");

        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(other.as_ref()), "panicked: non-string panic payload");
    }
}
