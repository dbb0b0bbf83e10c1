//! Binding registry
//!
//! Registration needs `&mut Container` and happens during startup; resolution
//! only needs `&Container`, so a fully built container can be shared behind an
//! `Arc` across threads.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::binding::{Binding, ContractKey, Lifetime};
use crate::error::ContainerResult;
use crate::resolver::Resolver;

#[derive(Default)]
pub struct Container {
    bindings: HashMap<ContractKey, Binding>,
    /// Keyed by (consumer, contract)
    contextual: HashMap<(ContractKey, ContractKey), Binding>,
    /// Keyed by (tag, contract)
    tags: HashMap<(String, ContractKey), Vec<Binding>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a contract to a producer, built again on every resolution
    ///
    /// A later registration for the same contract replaces the earlier one.
    pub fn bind<A, F>(&mut self, producer: F) -> &mut Self
    where
        A: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> ContainerResult<Arc<A>> + Send + Sync + 'static,
    {
        self.register::<A>(Binding::producer(producer, Lifetime::Transient))
    }

    /// Bind a contract to a producer that runs at most once
    pub fn singleton<A, F>(&mut self, producer: F) -> &mut Self
    where
        A: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> ContainerResult<Arc<A>> + Send + Sync + 'static,
    {
        self.register::<A>(Binding::producer(
            producer,
            Lifetime::Singleton(OnceLock::new()),
        ))
    }

    /// Bind a contract to an already built value
    pub fn instance<A>(&mut self, value: Arc<A>) -> &mut Self
    where
        A: ?Sized + Send + Sync + 'static,
    {
        self.register::<A>(Binding::instance(value))
    }

    /// Bind contract `A` to whatever contract `C` resolves to
    ///
    /// `cast` performs the unsizing, typically `|c| c as Arc<dyn A>`.
    pub fn alias<A, C, F>(&mut self, cast: F) -> &mut Self
    where
        A: ?Sized + Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<A> + Send + Sync + 'static,
    {
        self.register::<A>(Binding::concrete::<A, C, F>(cast))
    }

    /// Bind contract `A` for consumer `C` only
    ///
    /// The contextual binding shadows the global one for that consumer and
    /// leaves every other consumer untouched.
    pub fn bind_contextual<C, A, F>(&mut self, producer: F) -> &mut Self
    where
        C: ?Sized + 'static,
        A: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> ContainerResult<Arc<A>> + Send + Sync + 'static,
    {
        self.register_contextual::<C, A>(Binding::producer(producer, Lifetime::Transient))
    }

    /// Contextual counterpart of [`Container::alias`]
    pub fn alias_contextual<Consumer, A, C, F>(&mut self, cast: F) -> &mut Self
    where
        Consumer: ?Sized + 'static,
        A: ?Sized + Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<A> + Send + Sync + 'static,
    {
        self.register_contextual::<Consumer, A>(Binding::concrete::<A, C, F>(cast))
    }

    /// Add contract `C` to the `tag` group of contract `A`
    pub fn tag<A, C, F>(&mut self, tag: &str, cast: F) -> &mut Self
    where
        A: ?Sized + Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<A> + Send + Sync + 'static,
    {
        self.tags
            .entry((tag.to_string(), ContractKey::of::<A>()))
            .or_default()
            .push(Binding::concrete::<A, C, F>(cast));
        self
    }

    /// Whether a global binding exists for `A`
    pub fn bound<A: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains_key(&ContractKey::of::<A>())
    }

    /// Whether consumer `C` has its own binding for `A`
    pub fn has_contextual<C: ?Sized + 'static, A: ?Sized + 'static>(&self) -> bool {
        self.contextual
            .contains_key(&(ContractKey::of::<C>(), ContractKey::of::<A>()))
    }

    /// Resolve `A` with no consumer
    pub fn resolve<A>(&self) -> ContainerResult<Arc<A>>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        Resolver::new(self).resolve_for_consumer::<A>(None)
    }

    /// Resolve `A` on behalf of consumer `C`
    pub fn resolve_for<C, A>(&self) -> ContainerResult<Arc<A>>
    where
        C: ?Sized + 'static,
        A: ?Sized + Send + Sync + 'static,
    {
        Resolver::new(self).resolve_for_consumer::<A>(Some(ContractKey::of::<C>()))
    }

    /// Resolve every member of the `tag` group of `A`, in registration order
    pub fn tagged<A>(&self, tag: &str) -> ContainerResult<Vec<Arc<A>>>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        Resolver::new(self).tagged::<A>(tag)
    }

    /// Contextual entry first, then the global one
    ///
    /// The flag tells whether the contextual entry was used.
    pub(crate) fn lookup(
        &self,
        key: ContractKey,
        consumer: Option<ContractKey>,
    ) -> Option<(&Binding, bool)> {
        consumer
            .and_then(|consumer| self.contextual.get(&(consumer, key)))
            .map(|binding| (binding, true))
            .or_else(|| self.bindings.get(&key).map(|binding| (binding, false)))
    }

    pub(crate) fn tag_members(&self, tag: &str, key: ContractKey) -> &[Binding] {
        self.tags
            .get(&(tag.to_string(), key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn register<A: ?Sized + 'static>(&mut self, binding: Binding) -> &mut Self {
        let key = ContractKey::of::<A>();
        let shared = binding.is_shared();
        if self.bindings.insert(key, binding).is_some() {
            tracing::debug!(contract = key.name(), shared, "Binding replaced");
        } else {
            tracing::debug!(contract = key.name(), shared, "Binding registered");
        }
        self
    }

    fn register_contextual<C: ?Sized + 'static, A: ?Sized + 'static>(
        &mut self,
        binding: Binding,
    ) -> &mut Self {
        let consumer = ContractKey::of::<C>();
        let key = ContractKey::of::<A>();
        tracing::debug!(
            contract = key.name(),
            consumer = consumer.name(),
            "Contextual binding registered"
        );
        self.contextual.insert((consumer, key), binding);
        self
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .field("contextual", &self.contextual.keys().collect::<Vec<_>>())
            .field("tags", &self.tags.keys().collect::<Vec<_>>())
            .finish()
    }
}
