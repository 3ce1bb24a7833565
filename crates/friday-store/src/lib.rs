//! `friday-store`: SQLite persistence for the chat, moderation and admin
//! surfaces.
//!
//! Every store wraps a [`db::SharedConn`]. The gateway opens one connection
//! per store; tests share a single in-memory connection across all of them.

pub mod admins;
pub mod content;
pub mod db;
pub mod error;
pub mod messages;
pub mod policy;
pub mod types;

pub use admins::AdminDirectory;
pub use content::ContentStore;
pub use db::{init_db, shared, SharedConn};
pub use error::{Result, StoreError};
pub use messages::{cooldown_remaining, GateOutcome, MessageStore};
pub use policy::PolicyStore;
