pub mod classify;
pub mod convert;
