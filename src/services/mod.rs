//! Domain engines. Handlers call into these after authentication; every engine takes the
//! database handle explicitly and returns typed [`crate::errors::Error`] failures.

pub mod account;
pub mod attachment;
pub mod comment;
pub mod contribution;
pub mod custom_field;
pub mod event;
pub mod invitation;
pub mod participation;
pub mod poll;
pub mod visibility;
