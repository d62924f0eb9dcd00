pub mod intake;
pub mod notify;
pub mod poll;
pub mod revision_event;
pub mod submit;
