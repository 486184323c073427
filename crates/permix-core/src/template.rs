//! Templates — rule sets defined in one place and applied with `setup` elsewhere.

use permix_types::Rules;
use std::fmt;
use std::sync::Arc;

enum Source<C> {
    Static(Rules),
    Factory(Arc<dyn Fn(C) -> Rules + Send + Sync>),
}

/// A deferred rule set, optionally parameterized by a context value `C`.
///
/// No validation happens here; the produced rules are validated by `setup`.
pub struct Template<C = ()> {
    source: Source<C>,
}

impl<C> Template<C> {
    /// A template that always produces the same rules.
    pub fn new(rules: Rules) -> Self {
        Self {
            source: Source::Static(rules),
        }
    }

    /// A template that builds rules from a context supplied later.
    pub fn from_fn<F>(factory: F) -> Self
    where
        F: Fn(C) -> Rules + Send + Sync + 'static,
    {
        Self {
            source: Source::Factory(Arc::new(factory)),
        }
    }

    /// Produce the rule set for `context`.
    pub fn build(&self, context: C) -> Rules {
        match &self.source {
            Source::Static(rules) => rules.clone(),
            Source::Factory(factory) => factory(context),
        }
    }
}

impl<C> Clone for Template<C> {
    fn clone(&self) -> Self {
        let source = match &self.source {
            Source::Static(rules) => Source::Static(rules.clone()),
            Source::Factory(factory) => Source::Factory(Arc::clone(factory)),
        };
        Self { source }
    }
}

impl<C> fmt::Debug for Template<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Static(rules) => f.debug_tuple("Template").field(rules).finish(),
            Source::Factory(_) => f.write_str("Template(<factory>)"),
        }
    }
}

impl<C> From<Rules> for Template<C> {
    fn from(rules: Rules) -> Self {
        Template::new(rules)
    }
}
