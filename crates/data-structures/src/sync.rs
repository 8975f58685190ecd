//! Synchronization primitives.

pub use parking_lot::{Mutex as Lock, MutexGuard as LockGuard, RwLock};
