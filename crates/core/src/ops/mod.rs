//! Guarded operations
//!
//! Multi-step workflows that span validation, roster arithmetic and
//! companion-row creation. Everything that must be atomic runs inside
//! one immediate transaction; callers get back the freshly re-read
//! aggregate.

mod chats;
mod feed;
mod follows;
mod hackathons;
mod projects;
mod registration;

pub use chats::*;
pub use feed::*;
pub use follows::*;
pub use hackathons::*;
pub use projects::*;
pub use registration::*;
