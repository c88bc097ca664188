//! Side-effecting collaborators: discovery, settings, the engine subprocess,
//! and push notification.

pub mod discover;
pub mod engine;
pub mod notify;
pub mod process;
pub mod settings;
