//! Infrastructure for Sitecraft: filesystem paths, key/value persistence,
//! configuration files and download packaging.

pub mod archive;
pub mod config_service;
pub mod file_kv_store;
pub mod memory_kv_store;
pub mod paths;
pub mod secret_service;
pub mod state_repository;

pub use crate::archive::ZipArchivePackager;
pub use crate::config_service::ConfigService;
pub use crate::file_kv_store::FileKeyValueStore;
pub use crate::memory_kv_store::MemoryKeyValueStore;
pub use crate::paths::SitecraftPaths;
pub use crate::secret_service::SecretService;
pub use crate::state_repository::KeyValueStateRepository;
