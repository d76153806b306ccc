//! Well-known store keys.
//!
//! Only the keys the host reads or writes are listed here. Everything else
//! in the store belongs to the UI and is opaque to us.

/// Base URL of the running backend, written by the supervisor.
pub const API_ENDPOINT: &str = "apiEndpoint";

/// Comment presets offered by the performance form.
pub const PREDEFINED_COMMENTS: &str = "predefinedComments";

/// Scraper target definitions handed to the backend.
pub const SCRAPER: &str = "scraper";

/// First-launch marker.
pub const APP_INSTALLED: &str = "appInstalled";
