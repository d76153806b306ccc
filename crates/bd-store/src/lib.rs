//! Key-value persistence for the Brief Desk host.
//!
//! The UI keeps its settings (credentials, comments, scraper targets) in a
//! single JSON object on disk. The host writes exactly one key of its own,
//! [`keys::API_ENDPOINT`], and seeds a few defaults on first launch.

mod error;
mod json_file_store;
mod key_value_store;
mod memory_store;
mod port_file;
mod scraper_target;
mod seed;

pub mod keys;

pub use error::{StoreError, StoreResult};
pub use json_file_store::JsonFileStore;
pub use key_value_store::{KeyValueStore, KeyValueStoreExt};
pub use memory_store::MemoryStore;
pub use port_file::{PORT_FILENAME, read_port_file, read_temp_port_file};
pub use scraper_target::ScraperTarget;
pub use seed::{DEFAULT_PREDEFINED_COMMENTS, default_scraper_targets, seed_first_launch};

const DEFAULT_STORE_FILENAME: &str = "store.json";
