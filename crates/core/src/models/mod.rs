//! Data models for Hackmate

mod user;
mod profile;
mod project;
mod hackathon;
mod team;
mod chat;
mod follow;
mod feed;
mod review;

pub use user::*;
pub use profile::*;
pub use project::*;
pub use hackathon::*;
pub use team::*;
pub use chat::*;
pub use follow::*;
pub use feed::*;
pub use review::*;
