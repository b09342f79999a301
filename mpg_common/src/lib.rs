mod helpers;
mod secret;

pub use helpers::{truncate_snippet, unix_timestamp};
pub use secret::Secret;
