pub mod capsule_types;
pub mod error;
pub mod notice_types;
