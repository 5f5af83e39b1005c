//! User interface components which are reused between different pages.

pub mod actions;
pub mod alert;
pub mod score;
