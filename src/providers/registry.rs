// src/providers/registry.rs
//
// Provider Registry
//
// RESPONSIBILITIES:
// - Owns every provider instance, keyed by unique name
// - Wires each provider's subscriptions and routes at registration
// - Runs lifecycle phases: registration order for BeforeStart/AfterInit,
//   reverse order for OnDestroy
// - Resolves name-keyed lookups for providers (through a weak resolver)
//
// Registration closes as soon as the first phase runs.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use super::provider::{run_hook, LifecyclePhase, Provider, ProviderContext};
use crate::error::{AppError, AppResult};
use crate::events::{CommandRouter, EventBus, SubscriptionId};

struct RegisteredProvider {
    name: String,
    hooks: &'static [LifecyclePhase],
    instance: Arc<dyn Provider>,
    /// Same instance, kept for typed lookups.
    typed: Arc<dyn Any + Send + Sync>,
    subscriptions: Vec<SubscriptionId>,
}

/// A hook that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub provider: String,
    pub error: String,
}

/// Outcome of one [`ProviderRegistry::run_phase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: LifecyclePhase,
    /// Providers whose hook completed, in execution order.
    pub completed: Vec<String>,
    pub failures: Vec<HookFailure>,
}

impl PhaseReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ProviderRegistry {
    bus: EventBus,
    router: CommandRouter,
    self_ref: Weak<ProviderRegistry>,
    providers: RwLock<Vec<RegisteredProvider>>,
    lifecycle_started: AtomicBool,
}

impl ProviderRegistry {
    pub fn new(bus: EventBus, router: CommandRouter) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            bus,
            router,
            self_ref: weak.clone(),
            providers: RwLock::new(Vec::new()),
            lifecycle_started: AtomicBool::new(false),
        })
    }

    pub fn resolver(&self) -> ProviderResolver {
        ProviderResolver(self.self_ref.clone())
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    /// Construct a provider via `factory` and wire its subscriptions and
    /// routes. The factory must not look up other providers; lookups belong
    /// in hooks and handlers.
    pub fn register<T, F>(&self, name: &str, factory: F) -> AppResult<Arc<T>>
    where
        T: Provider,
        F: FnOnce(ProviderContext) -> AppResult<T>,
    {
        if self.lifecycle_started.load(Ordering::SeqCst) {
            return Err(AppError::RegistrationClosed(name.to_string()));
        }
        if self.contains(name) {
            return Err(AppError::DuplicateProvider(name.to_string()));
        }

        let context = ProviderContext {
            bus: self.bus.clone(),
            router: self.router.clone(),
            resolver: self.resolver(),
        };
        let provider = Arc::new(factory(context)?);

        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        if providers.iter().any(|p| p.name == name) {
            return Err(AppError::DuplicateProvider(name.to_string()));
        }

        let mut claimed: Vec<String> = Vec::new();
        for route in Arc::clone(&provider).routes() {
            let route_name = route.name().to_string();
            if let Err(e) = self.router.register(route) {
                for claimed_name in &claimed {
                    self.router.unregister(claimed_name);
                }
                return Err(e);
            }
            claimed.push(route_name);
        }
        let subscriptions: Vec<SubscriptionId> = Arc::clone(&provider)
            .subscriptions()
            .into_iter()
            .map(|subscription| self.bus.subscribe(subscription))
            .collect();

        let hooks = provider.hooks();
        let instance: Arc<dyn Provider> = provider.clone();
        let typed: Arc<dyn Any + Send + Sync> = provider.clone();

        log::debug!(
            "[REGISTRY] registered {} ({} subscriptions, hooks {:?})",
            name,
            subscriptions.len(),
            hooks
        );
        providers.push(RegisteredProvider {
            name: name.to_string(),
            hooks,
            instance,
            typed,
            subscriptions,
        });

        Ok(provider)
    }

    /// Typed lookup by name.
    pub fn get<T: Provider>(&self, name: &str) -> AppResult<Arc<T>> {
        let typed = {
            let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
            providers
                .iter()
                .find(|p| p.name == name)
                .map(|p| Arc::clone(&p.typed))
                .ok_or_else(|| AppError::ProviderNotFound(name.to_string()))?
        };

        typed
            .downcast::<T>()
            .map_err(|_| AppError::ProviderTypeMismatch(name.to_string()))
    }

    pub fn get_dyn(&self, name: &str) -> AppResult<Arc<dyn Provider>> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers
            .iter()
            .find(|p| p.name == name)
            .map(|p| Arc::clone(&p.instance))
            .ok_or_else(|| AppError::ProviderNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|p| p.name == name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn subscription_count(&self, name: &str) -> usize {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.name == name)
            .map_or(0, |p| p.subscriptions.len())
    }

    /// Run `phase` on every provider implementing it, one at a time.
    ///
    /// Each hook runs in its own task so a panic is contained. Failures are
    /// logged and collected; they never stop the remaining hooks.
    pub async fn run_phase(&self, phase: LifecyclePhase) -> PhaseReport {
        self.lifecycle_started.store(true, Ordering::SeqCst);

        let mut targets: Vec<(String, Arc<dyn Provider>)> = {
            let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
            providers
                .iter()
                .filter(|p| p.hooks.contains(&phase))
                .map(|p| (p.name.clone(), Arc::clone(&p.instance)))
                .collect()
        };
        if phase == LifecyclePhase::OnDestroy {
            targets.reverse();
        }

        log::info!("[REGISTRY] {} ({} providers)", phase, targets.len());

        let mut report = PhaseReport {
            phase,
            completed: Vec::new(),
            failures: Vec::new(),
        };

        for (name, provider) in targets {
            let outcome =
                tokio::spawn(async move { run_hook(provider.as_ref(), phase).await }).await;

            let error = match outcome {
                Ok(Ok(())) => {
                    report.completed.push(name);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(join_error) if join_error.is_panic() => "hook panicked".to_string(),
                Err(join_error) => join_error.to_string(),
            };

            log::error!("[REGISTRY] {} failed for {}: {}", phase, name, error);
            report.failures.push(HookFailure {
                provider: name,
                error,
            });
        }

        report
    }
}

/// Name-keyed lookup capability held by providers.
///
/// Holds the registry weakly, so providers can refer to each other in cycles
/// without keeping each other alive.
#[derive(Clone)]
pub struct ProviderResolver(Weak<ProviderRegistry>);

impl ProviderResolver {
    pub fn get<T: Provider>(&self, name: &str) -> AppResult<Arc<T>> {
        self.0
            .upgrade()
            .ok_or(AppError::RegistryUnavailable)?
            .get::<T>(name)
    }

    /// Resolver attached to no registry; every lookup fails.
    pub fn detached() -> Self {
        Self(Weak::new())
    }
}

impl fmt::Debug for ProviderResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderResolver")
            .field("attached", &(self.0.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Route, Subscription};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    const ALL_HOOKS: &[LifecyclePhase] = &[
        LifecyclePhase::BeforeStart,
        LifecyclePhase::AfterInit,
        LifecyclePhase::OnDestroy,
    ];

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Recording {
        label: &'static str,
        journal: Journal,
        fail_on: Option<LifecyclePhase>,
        panic_on: Option<LifecyclePhase>,
    }

    impl Recording {
        fn new(label: &'static str, journal: &Journal) -> Self {
            Self {
                label,
                journal: Arc::clone(journal),
                fail_on: None,
                panic_on: None,
            }
        }

        fn note(&self, phase: LifecyclePhase) -> AppResult<()> {
            if self.panic_on == Some(phase) {
                panic!("{} exploded", self.label);
            }
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", phase, self.label));
            if self.fail_on == Some(phase) {
                return Err(AppError::Other(format!("{} failed", self.label)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Provider for Recording {
        fn hooks(&self) -> &'static [LifecyclePhase] {
            ALL_HOOKS
        }

        async fn before_start(&self) -> AppResult<()> {
            self.note(LifecyclePhase::BeforeStart)
        }

        async fn after_init(&self) -> AppResult<()> {
            self.note(LifecyclePhase::AfterInit)
        }

        async fn on_destroy(&self) -> AppResult<()> {
            self.note(LifecyclePhase::OnDestroy)
        }
    }

    struct Silent;

    #[async_trait]
    impl Provider for Silent {
        async fn after_init(&self) -> AppResult<()> {
            panic!("hook not declared, must not run");
        }

        fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
            vec![Subscription::new("silent:ping", |_| async { Ok(()) })]
        }

        fn routes(self: Arc<Self>) -> Vec<Route> {
            vec![Route::new("silent/echo", |args| async move {
                Ok(args.into_iter().next().unwrap_or_default())
            })]
        }
    }

    /// Claims one fresh route, then one that `Silent` already owns.
    struct Clashing;

    #[async_trait]
    impl Provider for Clashing {
        fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
            vec![Subscription::new("clash:ping", |_| async { Ok(()) })]
        }

        fn routes(self: Arc<Self>) -> Vec<Route> {
            vec![
                Route::new("clash/fresh", |_| async { Ok(serde_json::Value::Null) }),
                Route::new("silent/echo", |_| async { Ok(serde_json::Value::Null) }),
            ]
        }
    }

    fn registry() -> Arc<ProviderRegistry> {
        ProviderRegistry::new(EventBus::new(), CommandRouter::new())
    }

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_register_and_get() {
        let registry = registry();
        let log = journal();
        registry
            .register("a", |_| Ok(Recording::new("a", &log)))
            .unwrap();

        let a = registry.get::<Recording>("a").unwrap();
        assert_eq!(a.label, "a");
        assert_eq!(registry.names(), vec!["a".to_string()]);
    }

    #[test]
    fn test_lookup_failures() {
        let registry = registry();
        registry.register("silent", |_| Ok(Silent)).unwrap();

        assert!(matches!(
            registry.get::<Silent>("missing"),
            Err(AppError::ProviderNotFound(_))
        ));
        assert!(matches!(
            registry.get::<Recording>("silent"),
            Err(AppError::ProviderTypeMismatch(_))
        ));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = registry();
        let log = journal();
        registry
            .register("a", |_| Ok(Recording::new("a", &log)))
            .unwrap();
        let err = registry
            .register("a", |_| Ok(Recording::new("again", &log)))
            .err()
            .unwrap();
        assert!(matches!(err, AppError::DuplicateProvider(_)));
    }

    #[tokio::test]
    async fn test_route_clash_leaves_nothing_behind() {
        let registry = registry();
        registry.register("silent", |_| Ok(Silent)).unwrap();

        let err = registry.register("clashing", |_| Ok(Clashing)).err().unwrap();

        assert!(matches!(err, AppError::DuplicateRoute(_)));
        assert!(!registry.contains("clashing"));
        assert!(!registry.router().has_route("clash/fresh"));
        assert!(registry.router().has_route("silent/echo"));
        assert_eq!(registry.bus().subscriber_count("clash:ping"), 0);
        let echoed = registry
            .router()
            .invoke("silent/echo", vec![json!(1)])
            .await
            .unwrap();
        assert_eq!(echoed, json!(1));
    }

    #[test]
    fn test_duplicate_leaves_first_routes_intact() {
        let registry = registry();
        registry.register("silent", |_| Ok(Silent)).unwrap();
        let err = registry.register("silent", |_| Ok(Silent)).err().unwrap();

        assert!(matches!(err, AppError::DuplicateProvider(_)));
        assert_eq!(registry.router().route_names(), vec!["silent/echo".to_string()]);
        assert_eq!(registry.bus().subscriber_count("silent:ping"), 1);
    }

    #[tokio::test]
    async fn test_registration_closes_once_lifecycle_begins() {
        let registry = registry();
        registry.run_phase(LifecyclePhase::BeforeStart).await;
        let err = registry.register("late", |_| Ok(Silent)).err().unwrap();
        assert!(matches!(err, AppError::RegistrationClosed(_)));
    }

    #[tokio::test]
    async fn test_phase_order_and_reverse_teardown() {
        let registry = registry();
        let log = journal();
        for label in ["a", "b", "c"] {
            registry
                .register(label, |_| Ok(Recording::new(label, &log)))
                .unwrap();
        }

        registry.run_phase(LifecyclePhase::BeforeStart).await;
        registry.run_phase(LifecyclePhase::AfterInit).await;
        let report = registry.run_phase(LifecyclePhase::OnDestroy).await;

        assert_eq!(report.completed, vec!["c", "b", "a"]);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "BeforeStart:a",
                "BeforeStart:b",
                "BeforeStart:c",
                "AfterInit:a",
                "AfterInit:b",
                "AfterInit:c",
                "OnDestroy:c",
                "OnDestroy:b",
                "OnDestroy:a",
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_and_panicking_hooks_do_not_abort_phase() {
        let registry = registry();
        let log = journal();
        registry
            .register("a", |_| {
                let mut p = Recording::new("a", &log);
                p.fail_on = Some(LifecyclePhase::AfterInit);
                Ok(p)
            })
            .unwrap();
        registry
            .register("b", |_| {
                let mut p = Recording::new("b", &log);
                p.panic_on = Some(LifecyclePhase::AfterInit);
                Ok(p)
            })
            .unwrap();
        registry
            .register("c", |_| Ok(Recording::new("c", &log)))
            .unwrap();

        let report = registry.run_phase(LifecyclePhase::AfterInit).await;

        assert!(!report.is_clean());
        assert_eq!(report.completed, vec!["c"]);
        let failed: Vec<&str> = report.failures.iter().map(|f| f.provider.as_str()).collect();
        assert_eq!(failed, vec!["a", "b"]);
        assert!(log.lock().unwrap().contains(&"AfterInit:c".to_string()));
    }

    #[tokio::test]
    async fn test_undeclared_hooks_are_skipped_and_tables_wired() {
        let registry = registry();
        registry.register("silent", |_| Ok(Silent)).unwrap();

        let report = registry.run_phase(LifecyclePhase::AfterInit).await;
        assert!(report.is_clean());
        assert!(report.completed.is_empty());

        assert_eq!(registry.subscription_count("silent"), 1);
        assert_eq!(registry.bus().subscriber_count("silent:ping"), 1);
        let echoed = registry
            .router()
            .invoke("silent/echo", vec![json!(7)])
            .await
            .unwrap();
        assert_eq!(echoed, json!(7));
    }

    #[test]
    fn test_resolver_outliving_registry() {
        let registry = registry();
        registry.register("silent", |_| Ok(Silent)).unwrap();
        let resolver = registry.resolver();
        assert!(resolver.get::<Silent>("silent").is_ok());

        drop(registry);
        assert!(matches!(
            resolver.get::<Silent>("silent"),
            Err(AppError::RegistryUnavailable)
        ));
        assert!(ProviderResolver::detached().get::<Silent>("silent").is_err());
    }
}
