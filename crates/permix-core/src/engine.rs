//! Permission state container — the main entry point for permission checks.

use crate::check::check_with_rules;
use crate::hooks::{HookEmitter, Unsubscribe};
use crate::ready::ReadySignal;
use crate::serialize::{from_state_json, to_state_json};
use crate::template::Template;
use crate::types::{Hook, HookEvent};
use crate::validator::rules_from_value;
use permix_types::{Actions, Definition, PermixError, Rules, Schema, StateJson, ValidationError};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mutable container state, always updated under one lock.
#[derive(Default)]
struct State {
    rules: Option<Arc<Rules>>,
    setup_called: bool,
    ready: bool,
}

struct Inner {
    schema: Schema,
    state: Mutex<State>,
    hooks: HookEmitter,
    ready: ReadySignal,
}

/// Holds the current rule set and answers permission checks against it.
///
/// Cloning yields another handle to the same container.
///
/// ```ignore
/// let permix = Permix::new(schema);
/// permix.setup(
///     Rules::new()
///         .with_entity("post", EntityRules::new().with("create", true))
///         .with_entity("user", EntityRules::new().with("read", false)),
/// );
///
/// assert!(permix.check("post", "create"));
/// assert!(!permix.check("user", "read"));
/// ```
#[derive(Clone)]
pub struct Permix {
    inner: Arc<Inner>,
}

impl Permix {
    /// Create an empty container for the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            inner: Arc::new(Inner {
                schema,
                state: Mutex::new(State::default()),
                hooks: HookEmitter::new(),
                ready: ReadySignal::new(),
            }),
        }
    }

    /// Create a container and immediately `setup` the initial rules.
    pub fn with_rules(schema: Schema, initial: Rules) -> Self {
        let permix = Self::new(schema);
        permix.setup(initial);
        permix
    }

    /// Create an empty container for a compile-time definition.
    pub fn for_definition<D: Definition>() -> Self {
        Self::new(D::schema())
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn current_rules(&self) -> Option<Arc<Rules>> {
        self.state().rules.clone()
    }

    /// Check whether `actions` are allowed on `entity` under the current rules.
    ///
    /// Never blocks and never fails: anything unknown is denied.
    pub fn check(&self, entity: &str, actions: impl Into<Actions>) -> bool {
        self.evaluate(entity, &actions.into(), None)
    }

    /// Like [`check`](Self::check), passing `data` to predicate rules.
    pub fn check_with(&self, entity: &str, actions: impl Into<Actions>, data: &Value) -> bool {
        self.evaluate(entity, &actions.into(), Some(data))
    }

    /// Wait until the first `setup`, then check.
    pub async fn check_async(&self, entity: &str, actions: impl Into<Actions>) -> bool {
        let actions = actions.into();
        self.inner.ready.wait().await;
        self.evaluate(entity, &actions, None)
    }

    /// Wait until the first `setup`, then check with data.
    pub async fn check_async_with(
        &self,
        entity: &str,
        actions: impl Into<Actions>,
        data: &Value,
    ) -> bool {
        let actions = actions.into();
        self.inner.ready.wait().await;
        self.evaluate(entity, &actions, Some(data))
    }

    fn evaluate(&self, entity: &str, actions: &Actions, data: Option<&Value>) -> bool {
        // Predicates run without the lock held so they may call back into the container.
        let rules = self.current_rules();
        check_with_rules(rules.as_deref(), &self.inner.schema, entity, actions, data)
    }

    /// Replace the whole rule set.
    ///
    /// Fires `setup` with the new rules; on the first call also fires `ready`
    /// and releases every pending async check. A typed rule set is always
    /// well-formed; untyped input goes through [`setup_value`](Self::setup_value).
    pub fn setup(&self, rules: Rules) {
        let rules = Arc::new(rules);
        let first = {
            let mut state = self.state();
            state.rules = Some(Arc::clone(&rules));
            state.setup_called = true;
            !std::mem::replace(&mut state.ready, true)
        };
        tracing::debug!(entities = rules.len(), first, "Permissions set up");

        self.inner.hooks.call_hook(&Hook::Setup(&rules));
        if first {
            self.inner.hooks.call_hook(&Hook::Ready);
            self.inner.ready.resolve();
        }
    }

    /// Setup from untyped JSON, e.g. rules read from a file.
    ///
    /// A malformed value is rejected and leaves the container untouched.
    pub fn setup_value(&self, rules: &Value) -> Result<(), ValidationError> {
        self.setup(rules_from_value(rules)?);
        Ok(())
    }

    /// Setup from a template and its context.
    pub fn setup_template<C>(&self, template: &Template<C>, context: C) {
        self.setup(template.build(context));
    }

    /// Register a handler for `event`.
    pub fn hook<F>(&self, event: HookEvent, handler: F) -> Unsubscribe
    where
        F: Fn(&Hook<'_>) + Send + Sync + 'static,
    {
        self.inner.hooks.hook(event, handler)
    }

    /// Register a handler for the next emission of `event` only.
    pub fn hook_once<F>(&self, event: HookEvent, handler: F) -> Unsubscribe
    where
        F: Fn(&Hook<'_>) + Send + Sync + 'static,
    {
        self.inner.hooks.hook_once(event, handler)
    }

    /// Define rules to `setup` later, without a container at hand.
    pub fn template<C>(rules: Rules) -> Template<C> {
        Template::new(rules)
    }

    /// Define a rules factory to `setup` later with a context value.
    pub fn template_fn<C, F>(factory: F) -> Template<C>
    where
        F: Fn(C) -> Rules + Send + Sync + 'static,
    {
        Template::from_fn(factory)
    }

    pub fn is_ready(&self) -> bool {
        self.state().ready
    }

    /// Wait until the first `setup`, then report readiness.
    pub async fn is_ready_async(&self) -> bool {
        self.inner.ready.wait().await;
        self.is_ready()
    }

    /// Whether `setup` has succeeded at least once.
    pub fn is_setup_called(&self) -> bool {
        self.state().setup_called
    }

    /// The current rule set.
    pub fn get_rules(&self) -> Result<Arc<Rules>, PermixError> {
        self.current_rules().ok_or(PermixError::Uninitialized)
    }

    /// Replace the rules without validation or events.
    ///
    /// Used when restoring state that must not re-trigger `setup` side effects.
    pub fn set_rules(&self, rules: Rules) {
        self.state().rules = Some(Arc::new(rules));
    }

    /// The emitter behind [`hook`](Self::hook), for adapters that emit their own events.
    pub fn hooks(&self) -> &HookEmitter {
        &self.inner.hooks
    }

    /// Current rules as a JSON-safe snapshot. Predicates become `false`.
    ///
    /// Empty when `setup` has not been called.
    pub fn get_serializable_state(&self) -> StateJson {
        self.current_rules()
            .map(|rules| to_state_json(&rules))
            .unwrap_or_default()
    }

    /// Rebuild a rule set from a snapshot.
    pub fn parse_serializable_state(&self, state: &StateJson) -> Rules {
        from_state_json(state)
    }

    /// Snapshot for transport to another container.
    pub fn dehydrate(&self) -> StateJson {
        self.get_serializable_state()
    }

    /// Restore rules from a snapshot produced by [`dehydrate`](Self::dehydrate).
    ///
    /// Every name must be declared in the schema. The rules are replaced
    /// without firing `setup` or `ready`; `hydrate` fires instead.
    pub fn hydrate(&self, state: &StateJson) -> Result<(), ValidationError> {
        self.inner.schema.check_state(state)?;
        self.set_rules(self.parse_serializable_state(state));
        tracing::debug!("Permissions hydrated");
        self.inner.hooks.call_hook(&Hook::Hydrate);
        Ok(())
    }
}

impl std::fmt::Debug for Permix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Permix")
            .field("schema", &self.inner.schema)
            .field("rules", &state.rules)
            .field("setup_called", &state.setup_called)
            .field("ready", &state.ready)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permix_types::{EntityRules, EntitySchema, Rule};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn schema() -> Schema {
        Schema::new()
            .with_entity("post", EntitySchema::new(["create", "read", "edit", "delete"]))
            .with_entity("user", EntitySchema::new(["create", "read"]))
    }

    fn post(rules: EntityRules) -> Rules {
        Rules::new().with_entity("post", rules)
    }

    #[test]
    fn test_check_before_setup_denies() {
        let permix = Permix::new(schema());
        assert!(!permix.check("post", "create"));
        assert!(!permix.check("post", "all"));
        assert!(!permix.is_ready());
        assert!(!permix.is_setup_called());
    }

    #[test]
    fn test_setup_then_check() {
        let permix = Permix::new(schema());
        permix.setup(
            post(EntityRules::new().with("create", false))
                .with_entity("user", EntityRules::new().with("read", true)),
        );
        assert!(!permix.check("post", "create"));
        assert!(permix.check("user", "read"));
        assert!(permix.is_ready());
        assert!(permix.is_setup_called());
    }

    #[test]
    fn test_with_rules_runs_setup() {
        let permix = Permix::with_rules(schema(), post(EntityRules::new().with("create", true)));
        assert!(permix.is_ready());
        assert!(permix.check("post", "create"));
    }

    #[test]
    fn test_all_flips_when_one_action_denied() {
        let permix = Permix::new(schema());
        permix.setup(post(
            EntityRules::new()
                .with("create", true)
                .with("read", true)
                .with("edit", true),
        ));
        assert!(permix.check("post", "all"));

        permix.setup(post(
            EntityRules::new()
                .with("create", true)
                .with("read", false)
                .with("edit", true),
        ));
        assert!(!permix.check("post", "all"));
    }

    #[test]
    fn test_list_equals_and_of_singles() {
        let permix = Permix::new(schema());
        permix.setup(post(
            EntityRules::new()
                .with("create", true)
                .with("read", true)
                .with("edit", false),
        ));
        for (a, b) in [("create", "read"), ("create", "edit"), ("edit", "delete")] {
            assert_eq!(
                permix.check("post", [a, b]),
                permix.check("post", a) && permix.check("post", b)
            );
        }
    }

    #[test]
    fn test_predicate_rule() {
        let permix = Permix::new(schema());
        permix.setup(post(EntityRules::new().with(
            "edit",
            Rule::when(|data| data.and_then(|d| d.get("authorId")) == Some(&json!("1"))),
        )));
        assert!(permix.check_with("post", "edit", &json!({"authorId": "1"})));
        assert!(!permix.check_with("post", "edit", &json!({"authorId": "2"})));
    }

    #[test]
    fn test_invalid_setup_keeps_previous_rules() {
        let permix = Permix::new(schema());
        permix.setup(post(EntityRules::new().with("create", true)));

        assert!(permix.setup_value(&json!(["post"])).is_err());
        assert!(permix.setup_value(&json!({"post": true})).is_err());
        assert!(permix.setup_value(&json!({"post": {"create": "no"}})).is_err());
        assert!(permix.check("post", "create"));
    }

    #[test]
    fn test_invalid_first_setup_stays_uninitialized() {
        let permix = Permix::new(schema());
        assert!(permix.setup_value(&json!(42)).is_err());
        assert!(!permix.is_setup_called());
        assert!(!permix.is_ready());
        assert!(matches!(permix.get_rules(), Err(PermixError::Uninitialized)));
    }

    #[test]
    fn test_setup_value_accepts_what_validator_accepts() {
        use crate::validator::is_rules_valid;

        let candidates = [
            json!({"post": {"all": true, "create": true}}),
            json!({"": {}}),
            json!([{"post": {}}]),
            json!({"post": true}),
            json!({"post": {"create": "no"}}),
        ];
        for candidate in &candidates {
            let permix = Permix::new(schema());
            assert_eq!(
                is_rules_valid(candidate),
                permix.setup_value(candidate).is_ok(),
                "{candidate}"
            );
            assert_eq!(permix.is_setup_called(), is_rules_valid(candidate));
        }
    }

    #[test]
    fn test_setup_with_all_action_is_stored() {
        let permix = Permix::new(schema());
        permix.setup(post(EntityRules::new().with("all", true).with("create", true)));
        assert!(permix.is_setup_called());
        assert!(permix.check("post", "all"));
        assert!(permix.check("post", ["all"]));
        assert!(permix.get_rules().unwrap().entity("post").unwrap().get("all").is_some());
    }

    #[test]
    fn test_setup_replaces_not_merges() {
        let permix = Permix::new(schema());
        permix.setup(post(EntityRules::new().with("create", true)));
        let users = Rules::new().with_entity("user", EntityRules::new().with("read", true));
        permix.setup(users);
        assert!(!permix.check("post", "create"));
        assert!(permix.check("user", "read"));
    }

    #[test]
    fn test_hook_once_setup_fires_once() {
        let permix = Permix::new(schema());
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        permix.hook_once(HookEvent::Setup, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        permix.setup(post(EntityRules::new()));
        permix.setup(post(EntityRules::new()));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ready_fires_only_on_first_setup() {
        let permix = Permix::new(schema());
        let setups = Arc::new(AtomicUsize::new(0));
        let readies = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&setups);
        let r = Arc::clone(&readies);
        permix.hook(HookEvent::Setup, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        permix.hook(HookEvent::Ready, move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..3 {
            permix.setup(post(EntityRules::new()));
        }
        assert_eq!(setups.load(Ordering::SeqCst), 3);
        assert_eq!(readies.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_setup_hook_sees_new_rules() {
        let permix = Permix::new(schema());
        let handle = permix.clone();
        let allowed = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&allowed);
        permix.hook(HookEvent::Setup, move |hook| {
            assert!(hook.rules().is_some());
            if handle.check("post", "create") {
                a.fetch_add(1, Ordering::SeqCst);
            }
        });
        permix.setup(post(EntityRules::new().with("create", true)));
        assert_eq!(allowed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_rules_fires_nothing() {
        let permix = Permix::new(schema());
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        permix.hook(HookEvent::Setup, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        permix.set_rules(post(EntityRules::new().with("create", true)));
        assert!(permix.check("post", "create"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!permix.is_setup_called());
        assert!(!permix.is_ready());
    }

    #[test]
    fn test_serializable_state_collapses_predicates() {
        let permix = Permix::new(schema());
        permix.setup(post(
            EntityRules::new()
                .with("create", true)
                .with(
                    "delete",
                    Rule::when(|data| {
                        !data
                            .and_then(|d| d.get("published"))
                            .and_then(Value::as_bool)
                            .unwrap_or(false)
                    }),
                ),
        ));
        assert_eq!(
            serde_json::to_value(permix.get_serializable_state()).unwrap(),
            json!({"post": {"create": true, "delete": false}})
        );
    }

    #[test]
    fn test_serializable_state_empty_before_setup() {
        assert!(Permix::new(schema()).get_serializable_state().is_empty());
    }

    #[test]
    fn test_hydrate_restores_without_setup_events() {
        let source = Permix::new(schema());
        source.setup(post(
            EntityRules::new()
                .with("create", true)
                .with("edit", Rule::when(|_| true)),
        ));
        let snapshot = source.dehydrate();

        let target = Permix::new(schema());
        let setups = Arc::new(AtomicUsize::new(0));
        let hydrates = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&setups);
        let h = Arc::clone(&hydrates);
        target.hook(HookEvent::Setup, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        target.hook(HookEvent::Hydrate, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        target.hydrate(&snapshot).unwrap();
        assert!(target.check("post", "create"));
        assert!(!target.check_with("post", "edit", &json!({})));
        assert_eq!(setups.load(Ordering::SeqCst), 0);
        assert_eq!(hydrates.load(Ordering::SeqCst), 1);
        assert!(!target.is_ready());
    }

    #[test]
    fn test_hydrate_rejects_undeclared_names() {
        let permix = Permix::new(schema());
        let state: StateJson =
            serde_json::from_value(json!({"comment": {"create": true}})).unwrap();
        assert!(matches!(
            permix.hydrate(&state),
            Err(ValidationError::UnknownEntity { .. })
        ));
        assert!(matches!(permix.get_rules(), Err(PermixError::Uninitialized)));
    }

    #[test]
    fn test_template_applied_later() {
        let admin = Permix::template::<()>(post(
            EntityRules::new().with("create", true).with("delete", true),
        ));
        let by_role = Permix::template_fn(|is_admin: bool| {
            post(EntityRules::new().with("delete", is_admin))
        });

        let permix = Permix::new(schema());
        permix.setup_template(&admin, ());
        assert!(permix.check("post", ["create", "delete"]));

        permix.setup_template(&by_role, false);
        assert!(!permix.check("post", "delete"));
    }

    struct Blog;

    impl Definition for Blog {
        fn schema() -> Schema {
            Schema::new().with_entity("post", EntitySchema::new(["create"]))
        }
    }

    #[test]
    fn test_for_definition_uses_schema() {
        let permix = Permix::for_definition::<Blog>();
        assert!(permix.schema().entity("post").is_some());
        assert!(permix.schema().entity("user").is_none());
    }

    #[tokio::test]
    async fn test_check_async_after_setup_resolves_immediately() {
        let permix = Permix::new(schema());
        permix.setup(post(EntityRules::new().with("create", true)));
        assert!(permix.check_async("post", "create").await);
        assert!(permix.is_ready_async().await);
    }
}
