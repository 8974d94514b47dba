//! Event bus adapters.
//!
//! - `InMemoryEventBus` - Synchronous, in-process bus used by the service
//!   binary and by tests

mod in_memory;

pub use in_memory::InMemoryEventBus;
