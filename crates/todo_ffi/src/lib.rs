//! Flutter bridge crate for the to-do core.

pub mod api;
