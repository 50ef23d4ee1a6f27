pub mod attachment;
pub mod comment;
pub mod contribution;
pub mod custom_field;
pub mod event;
pub mod invitation;
pub mod participation;
pub mod poll;
pub mod user;
