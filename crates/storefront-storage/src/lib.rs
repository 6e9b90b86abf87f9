// Local key/value storage shared by every view of the storefront
// Think browser localStorage, but a SQLite file anyone on the machine can open

pub mod events;
pub mod storage;

pub use events::{StorageEvent, StorageWatcher};
pub use storage::{KeyValueStore, LocalStorage, MemoryStorage, StorageError};
