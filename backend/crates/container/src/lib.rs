//! Binding Registry and Resolver
//!
//! Maps abstract contracts (usually trait objects) to the producers that build
//! them, with per-consumer overrides:
//!
//! - [`Container::bind`] / [`Container::singleton`] / [`Container::instance`]
//!   register global bindings
//! - [`Container::bind_contextual`] registers a binding that only applies when
//!   a given consumer asks for the contract
//! - [`Container::resolve`] / [`Container::resolve_for`] build the contract,
//!   preferring the consumer's contextual binding over the global one
//!
//! A producer receives the [`Resolver`] and pulls its own dependencies through
//! [`Resolver::make`]; those nested requests are made on behalf of the
//! contract being built. A contract requested again while it is still being
//! built fails with [`ContainerError::Circular`] instead of recursing.
//!
//! ```
//! use std::sync::Arc;
//! use container::Container;
//!
//! trait Store: Send + Sync {
//!     fn name(&self) -> &'static str;
//! }
//! struct Memory;
//! impl Store for Memory {
//!     fn name(&self) -> &'static str { "memory" }
//! }
//! struct Archive;
//! impl Store for Archive {
//!     fn name(&self) -> &'static str { "archive" }
//! }
//! struct Reporting;
//!
//! let mut container = Container::new();
//! container.bind::<dyn Store, _>(|_| Ok(Arc::new(Memory) as Arc<dyn Store>));
//! container.bind_contextual::<Reporting, dyn Store, _>(|_| Ok(Arc::new(Archive) as Arc<dyn Store>));
//!
//! assert_eq!(container.resolve::<dyn Store>().unwrap().name(), "memory");
//! assert_eq!(container.resolve_for::<Reporting, dyn Store>().unwrap().name(), "archive");
//! ```

mod binding;
mod container;
pub mod error;
mod resolver;

pub use binding::ContractKey;
pub use container::Container;
pub use error::{ContainerError, ContainerResult};
pub use resolver::Resolver;
