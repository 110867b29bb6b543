//! User-scoped stores.
//!
//! One contract, two persistence strategies: [`LocalStore`] keeps a JSON
//! array per user in key/value storage, [`RemoteStore`] reads and writes rows
//! through a [`UserScopedRepository`]. Both reset their view whenever the
//! session adapter reports a different user.

mod local_storage;
mod local_store;
mod memory_repository;
mod remote_store;
mod store_traits;

pub use local_storage::{FileLocalStorage, LocalStorage, MemoryLocalStorage};
pub use local_store::{storage_key, LocalStore};
pub use memory_repository::InMemoryRepository;
pub use remote_store::RemoteStore;
pub use store_traits::{
    prepare_for_insert, ScopedRecord, UserScopeListener, UserScopedRepository, UserScopedStore,
};
