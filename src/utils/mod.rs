pub mod jwt;
pub mod patch;
pub mod pwd;
pub mod record_id;
pub mod slug;
pub mod time;
pub mod token;
pub mod validated_form;
pub mod validator;
