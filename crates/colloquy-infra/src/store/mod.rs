//! Context store backends.
//!
//! [`redis::RedisContextStore`] is the production backend;
//! [`memory::MemoryContextStore`] serves tests and Redis-less
//! development with the same semantics.

pub mod memory;
pub mod redis;

pub use memory::MemoryContextStore;
pub use redis::RedisContextStore;
