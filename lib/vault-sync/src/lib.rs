// lib/vault-sync/src/lib.rs
pub mod bootstrap;
pub mod error;
pub mod path;
pub mod settings;
pub mod target;

pub use bootstrap::{Bootstrap, SyncReport};
pub use error::SyncError;
pub use path::bootstrap_secret_path;
pub use settings::{SyncMode, SyncSettings};
pub use target::{MapTarget, ProcessEnv, SettingsTarget};
