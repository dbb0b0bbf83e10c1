//! Resolution
//!
//! A [`Resolver`] lives for one top-level `resolve` call. It carries the chain
//! of contracts currently being built: the top of the chain is the consumer
//! for nested lookups, and a contract that shows up twice is a cycle.

use std::sync::Arc;

use crate::binding::{Binding, ContractKey, Erased, Implementation, Lifetime, recover};
use crate::container::Container;
use crate::error::{ContainerError, ContainerResult};

pub struct Resolver<'c> {
    container: &'c Container,
    stack: Vec<ContractKey>,
}

impl<'c> Resolver<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self {
            container,
            stack: Vec::new(),
        }
    }

    /// Contract whose producer is currently running
    pub fn consumer(&self) -> Option<ContractKey> {
        self.stack.last().copied()
    }

    pub fn container(&self) -> &'c Container {
        self.container
    }

    /// Resolve `T` as a dependency of the current consumer
    ///
    /// Contextual bindings registered for the consumer win over global ones.
    pub fn make<T: ?Sized + Send + Sync + 'static>(&mut self) -> ContainerResult<Arc<T>> {
        let consumer = self.consumer();
        self.resolve_for_consumer::<T>(consumer)
    }

    pub(crate) fn resolve_for_consumer<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        consumer: Option<ContractKey>,
    ) -> ContainerResult<Arc<T>> {
        let key = ContractKey::of::<T>();
        let value = self.resolve_key(key, consumer)?;
        recover::<T>(value, key)
    }

    /// Resolve every member of a tag group
    pub fn tagged<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        tag: &str,
    ) -> ContainerResult<Vec<Arc<T>>> {
        let key = ContractKey::of::<T>();
        let members = self.container.tag_members(tag, key);
        let mut resolved = Vec::with_capacity(members.len());
        for binding in members {
            let value = self.produce(binding, key)?;
            resolved.push(recover::<T>(value, key)?);
        }
        Ok(resolved)
    }

    pub(crate) fn resolve_key(
        &mut self,
        key: ContractKey,
        consumer: Option<ContractKey>,
    ) -> ContainerResult<Erased> {
        if self.stack.contains(&key) {
            let chain = self
                .stack
                .iter()
                .chain(std::iter::once(&key))
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(" -> ");
            tracing::warn!(contract = key.name(), chain = %chain, "Circular dependency detected");
            return Err(ContainerError::Circular {
                contract: key.name(),
                chain,
            });
        }

        let (binding, contextual) =
            self.container
                .lookup(key, consumer)
                .ok_or(ContainerError::Unresolved {
                    contract: key.name(),
                    consumer: consumer.map(|c| c.name()),
                })?;

        tracing::debug!(
            contract = key.name(),
            consumer = consumer.map(|c| c.name()),
            contextual,
            "Resolving contract"
        );

        self.stack.push(key);
        let result = self.build(binding, key);
        self.stack.pop();
        result
    }

    fn build(&mut self, binding: &'c Binding, key: ContractKey) -> ContainerResult<Erased> {
        match &binding.lifetime {
            Lifetime::Singleton(cell) => {
                if cell.get().is_none() {
                    let built = self.produce(binding, key)?;
                    // Concurrent first builds race; the stored value wins for everyone.
                    let _ = cell.set(built);
                }
                cell.get()
                    .and_then(|value| (binding.share)(value))
                    .ok_or(ContainerError::TypeMismatch { contract: key.name() })
            }
            Lifetime::Transient => self.produce(binding, key),
        }
    }

    fn produce(&mut self, binding: &'c Binding, key: ContractKey) -> ContainerResult<Erased> {
        match &binding.implementation {
            Implementation::Producer(producer) => producer(self),
            Implementation::Concrete { target, cast } => {
                let value = self.resolve_key(*target, None)?;
                cast(value)
            }
            Implementation::Instance(value) => {
                (binding.share)(value).ok_or(ContainerError::TypeMismatch { contract: key.name() })
            }
        }
    }
}
