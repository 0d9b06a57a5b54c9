//! Hackmate Core Library
//!
//! Domain models, storage, lifecycle management, and guarded operations
//! for the hackathon/mentorship platform backend. The HTTP surface is
//! supplied by a separate web layer; this crate exposes the operations
//! a request handler would call.

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod ops;
pub mod roster;
pub mod storage;

pub use error::{Error, Result};
pub use lifecycle::{run_sweep, SweepOutcome};
pub use models::*;
pub use roster::RosterError;
pub use storage::{
    ChatStore, Database, FeedStore, FollowStore, HackathonStore, ProfileStore, ProjectStore,
    ReviewStore, TeamStore, UserStore,
};
