//! Binding entries
//!
//! A contract is any `'static` type, usually a trait object such as
//! `dyn UserProvider`. Values travel type-erased as `Box<dyn Any>` wrapping an
//! `Arc<T>`; the typed API on [`crate::Container`] is the only place that
//! erases and recovers them.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::error::{ContainerError, ContainerResult};
use crate::resolver::Resolver;

/// Erased `Arc<T>`
pub(crate) type Erased = Box<dyn Any + Send + Sync>;

/// Producer invoked with the resolver itself
pub(crate) type ProducerFn =
    Arc<dyn Fn(&mut Resolver<'_>) -> ContainerResult<Erased> + Send + Sync>;

/// Converts an erased concrete `Arc<C>` into an erased abstract `Arc<A>`
pub(crate) type CastFn = Arc<dyn Fn(Erased) -> ContainerResult<Erased> + Send + Sync>;

/// Clones the `Arc<T>` inside an erased value
pub(crate) type ShareFn = fn(&Erased) -> Option<Erased>;

/// Typed contract identifier
#[derive(Clone, Copy)]
pub struct ContractKey {
    id: TypeId,
    name: &'static str,
}

impl ContractKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ContractKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ContractKey {}

impl Hash for ContractKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// How a binding produces its value
pub(crate) enum Implementation {
    /// Closure receiving the resolver
    Producer(ProducerFn),
    /// Another contract, resolved recursively, then cast
    Concrete { target: ContractKey, cast: CastFn },
    /// Supplied pre-built at registration
    Instance(Erased),
}

pub(crate) enum Lifetime {
    /// Built on every resolution
    Transient,
    /// Built once, then shared
    Singleton(OnceLock<Erased>),
}

pub(crate) struct Binding {
    pub(crate) implementation: Implementation,
    pub(crate) lifetime: Lifetime,
    pub(crate) share: ShareFn,
}

impl Binding {
    pub(crate) fn new<T: ?Sized + Send + Sync + 'static>(
        implementation: Implementation,
        lifetime: Lifetime,
    ) -> Self {
        Self {
            implementation,
            lifetime,
            share: share_erased::<T>,
        }
    }

    pub(crate) fn producer<T, F>(producer: F, lifetime: Lifetime) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        let erased: ProducerFn = Arc::new(move |resolver: &mut Resolver<'_>| {
            let value = producer(resolver)?;
            Ok(erase(value))
        });
        Self::new::<T>(Implementation::Producer(erased), lifetime)
    }

    pub(crate) fn concrete<A, C, F>(cast: F) -> Self
    where
        A: ?Sized + Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<A> + Send + Sync + 'static,
    {
        let target = ContractKey::of::<C>();
        let erased: CastFn = Arc::new(move |value: Erased| {
            let concrete = recover::<C>(value, target)?;
            Ok(erase(cast(concrete)))
        });
        Self::new::<A>(
            Implementation::Concrete {
                target,
                cast: erased,
            },
            Lifetime::Transient,
        )
    }

    pub(crate) fn instance<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::new::<T>(Implementation::Instance(erase(value)), Lifetime::Transient)
    }

    pub(crate) fn is_shared(&self) -> bool {
        matches!(self.implementation, Implementation::Instance(_))
            || matches!(self.lifetime, Lifetime::Singleton(_))
    }
}

pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Erased {
    Box::new(value)
}

pub(crate) fn recover<T: ?Sized + Send + Sync + 'static>(
    value: Erased,
    key: ContractKey,
) -> ContainerResult<Arc<T>> {
    value
        .downcast::<Arc<T>>()
        .map(|boxed| *boxed)
        .map_err(|_| ContainerError::TypeMismatch { contract: key.name() })
}

fn share_erased<T: ?Sized + Send + Sync + 'static>(value: &Erased) -> Option<Erased> {
    value
        .downcast_ref::<Arc<T>>()
        .map(|arc| erase(Arc::clone(arc)))
}
