//! Registration of groups, cases, and hooks.
//!
//! Registration is explicit: [`Suite::describe`] hands a [`GroupBuilder`] to
//! the body closure, and everything registered on that builder belongs to the
//! group. Nothing is tracked in ambient state.

use crate::completion::Done;
use crate::error::{HarnessError, Result};
use crate::expect::Expect;
use crate::report::full_name;
use core::future::Future;
use core::time::Duration;
use futures::FutureExt as _;
use futures::future::BoxFuture;
use std::sync::Arc;

/// What case and hook bodies return. Any error is captured as a fault.
pub type BodyResult = anyhow::Result<()>;

/// Sync case body
type SyncCaseFn = Arc<dyn Fn(&Expect) -> BodyResult + Send + Sync>;
/// Async case body
type AsyncCaseFn = Arc<dyn Fn(Expect, Done) -> BoxFuture<'static, BodyResult> + Send + Sync>;
/// Sync hook body
type SyncHookFn = Arc<dyn Fn() -> BodyResult + Send + Sync>;
/// Async hook body
type AsyncHookFn = Arc<dyn Fn(Done) -> BoxFuture<'static, BodyResult> + Send + Sync>;

/// Completion mode and body of a case.
#[derive(Clone)]
pub(crate) enum CaseBody {
    /// Finishes when the closure returns
    Sync(SyncCaseFn),
    /// Finishes when its [`Done`] is resolved
    Async(AsyncCaseFn),
}

/// Completion mode and body of a hook.
#[derive(Clone)]
pub(crate) enum Hook {
    /// Finishes when the closure returns
    Sync(SyncHookFn),
    /// Finishes when its [`Done`] is resolved
    Async(AsyncHookFn),
}

/// Hook slots of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HookKind {
    /// Setup-once
    BeforeAll,
    /// Teardown-once
    AfterAll,
    /// Per-case setup
    BeforeEach,
    /// Per-case teardown
    AfterEach,
}

impl HookKind {
    /// Name used in fault messages.
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::BeforeAll => "beforeAll",
            Self::AfterAll => "afterAll",
            Self::BeforeEach => "beforeEach",
            Self::AfterEach => "afterEach",
        }
    }
}

/// A registered case.
pub(crate) struct Case {
    /// Case name
    pub(crate) name: String,
    /// Body and completion mode
    pub(crate) body: CaseBody,
    /// Bound overriding the run default
    pub(crate) timeout: Option<Duration>,
}

/// Hooks registered on one group.
#[derive(Default)]
pub(crate) struct Hooks {
    /// Setup-once
    pub(crate) before_all: Option<Hook>,
    /// Teardown-once
    pub(crate) after_all: Option<Hook>,
    /// Per-case setup
    pub(crate) before_each: Option<Hook>,
    /// Per-case teardown
    pub(crate) after_each: Option<Hook>,
}

/// Either a case or a nested group, in registration order.
pub(crate) enum Entry {
    /// A case registered with `it`
    Case(Case),
    /// A nested `describe`
    Group(Group),
}

/// A registered group.
pub(crate) struct Group {
    /// Full name, including ancestors
    pub(crate) name: String,
    /// Cases and nested groups in registration order
    pub(crate) entries: Vec<Entry>,
    /// Hooks of this group only
    pub(crate) hooks: Hooks,
}

impl Group {
    /// Cases in this group and all nested groups.
    pub(crate) fn case_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Case(_) => 1,
                Entry::Group(group) => group.case_count(),
            })
            .sum()
    }

    /// Whether any case here or below is selected by `selects`.
    pub(crate) fn has_selected<F>(&self, selects: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        self.entries.iter().any(|entry| match entry {
            Entry::Case(case) => selects(&full_name(&self.name, &case.name)),
            Entry::Group(group) => group.has_selected(selects),
        })
    }
}

/// Collects the cases, hooks, and nested groups of one group.
pub struct GroupBuilder {
    /// Group under construction
    group: Group,
    /// Registration errors, reported when the group is finished
    errors: Vec<HarnessError>,
}

impl GroupBuilder {
    /// Start a group with the given full name.
    fn new(name: String) -> Self {
        Self {
            group: Group {
                name,
                entries: Vec::new(),
                hooks: Hooks::default(),
            },
            errors: Vec::new(),
        }
    }

    /// Full name of the group being built.
    pub fn name(&self) -> &str {
        &self.group.name
    }

    /// Register a synchronous case.
    pub fn it<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn(&Expect) -> BodyResult + Send + Sync + 'static,
    {
        self.push_case(name.into(), CaseBody::Sync(Arc::new(body)), None)
    }

    /// Register an asynchronous case that finishes when its [`Done`] resolves.
    pub fn it_async<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn(Expect, Done) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BodyResult> + Send + 'static,
    {
        self.push_case(name.into(), async_case(body), None)
    }

    /// Register an asynchronous case with its own bound.
    pub fn it_async_with_timeout<F, Fut>(
        &mut self,
        name: impl Into<String>,
        timeout: Duration,
        body: F,
    ) -> &mut Self
    where
        F: Fn(Expect, Done) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BodyResult> + Send + 'static,
    {
        self.push_case(name.into(), async_case(body), Some(timeout))
    }

    /// Register a nested group.
    pub fn describe<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let name = name.into();
        if name.trim().is_empty() {
            self.errors.push(HarnessError::EmptyGroupName);
            return self;
        }

        let mut nested = Self::new(full_name(&self.group.name, &name));
        body(&mut nested);
        match nested.finish() {
            Ok(group) => self.group.entries.push(Entry::Group(group)),
            Err(error) => self.errors.push(error),
        }
        self
    }

    /// Setup-once hook.
    pub fn before_all<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> BodyResult + Send + Sync + 'static,
    {
        self.set_hook(HookKind::BeforeAll, Hook::Sync(Arc::new(hook)))
    }

    /// Asynchronous setup-once hook.
    pub fn before_all_async<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(Done) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BodyResult> + Send + 'static,
    {
        self.set_hook(HookKind::BeforeAll, async_hook(hook))
    }

    /// Teardown-once hook.
    pub fn after_all<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> BodyResult + Send + Sync + 'static,
    {
        self.set_hook(HookKind::AfterAll, Hook::Sync(Arc::new(hook)))
    }

    /// Asynchronous teardown-once hook.
    pub fn after_all_async<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(Done) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BodyResult> + Send + 'static,
    {
        self.set_hook(HookKind::AfterAll, async_hook(hook))
    }

    /// Per-case setup hook, also applied to nested groups.
    pub fn before_each<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> BodyResult + Send + Sync + 'static,
    {
        self.set_hook(HookKind::BeforeEach, Hook::Sync(Arc::new(hook)))
    }

    /// Asynchronous per-case setup hook.
    pub fn before_each_async<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(Done) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BodyResult> + Send + 'static,
    {
        self.set_hook(HookKind::BeforeEach, async_hook(hook))
    }

    /// Per-case teardown hook, also applied to nested groups.
    pub fn after_each<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> BodyResult + Send + Sync + 'static,
    {
        self.set_hook(HookKind::AfterEach, Hook::Sync(Arc::new(hook)))
    }

    /// Asynchronous per-case teardown hook.
    pub fn after_each_async<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(Done) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BodyResult> + Send + 'static,
    {
        self.set_hook(HookKind::AfterEach, async_hook(hook))
    }

    fn push_case(&mut self, name: String, body: CaseBody, timeout: Option<Duration>) -> &mut Self {
        if name.trim().is_empty() {
            self.errors.push(HarnessError::EmptyCaseName {
                group: self.group.name.clone(),
            });
            return self;
        }
        self.group
            .entries
            .push(Entry::Case(Case { name, body, timeout }));
        self
    }

    /// Last registration wins.
    fn set_hook(&mut self, kind: HookKind, hook: Hook) -> &mut Self {
        let hooks = &mut self.group.hooks;
        let slot = match kind {
            HookKind::BeforeAll => &mut hooks.before_all,
            HookKind::AfterAll => &mut hooks.after_all,
            HookKind::BeforeEach => &mut hooks.before_each,
            HookKind::AfterEach => &mut hooks.after_each,
        };
        if slot.replace(hook).is_some() {
            tracing::debug!(
                "Replacing {} hook of group '{}'",
                kind.label(),
                self.group.name
            );
        }
        self
    }

    fn finish(mut self) -> Result<Group> {
        if self.errors.is_empty() {
            Ok(self.group)
        } else {
            Err(self.errors.remove(0))
        }
    }
}

fn async_case<F, Fut>(body: F) -> CaseBody
where
    F: Fn(Expect, Done) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BodyResult> + Send + 'static,
{
    CaseBody::Async(Arc::new(move |expect, done| body(expect, done).boxed()))
}

fn async_hook<F, Fut>(hook: F) -> Hook
where
    F: Fn(Done) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BodyResult> + Send + 'static,
{
    Hook::Async(Arc::new(move |done| hook(done).boxed()))
}

/// Ordered collection of top-level groups.
#[derive(Default)]
pub struct Suite {
    /// Groups in registration order
    groups: Vec<Group>,
}

impl Suite {
    /// Create an empty suite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group; `body` runs immediately to collect its contents.
    ///
    /// # Errors
    /// Returns an error if the group name, a nested group name, or a case name
    /// is empty. The group is not registered in that case.
    pub fn describe<F>(&mut self, name: impl Into<String>, body: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut GroupBuilder),
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(HarnessError::EmptyGroupName);
        }

        let mut builder = GroupBuilder::new(name);
        body(&mut builder);
        let group = builder.finish()?;
        tracing::debug!(
            "Registered group '{}' with {} cases",
            group.name,
            group.case_count()
        );
        self.groups.push(group);
        Ok(self)
    }

    /// Number of registered cases, nested groups included.
    pub fn case_count(&self) -> usize {
        self.groups.iter().map(Group::case_count).sum()
    }

    /// Number of top-level groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Top-level groups in registration order.
    pub(crate) fn groups(&self) -> &[Group] {
        &self.groups
    }
}
