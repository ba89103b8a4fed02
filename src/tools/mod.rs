//! Built-in tools of the quill CLI and the registry that holds them.

pub mod fs;
pub mod registry;
pub mod web;
