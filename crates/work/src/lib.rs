//! Work Functions
//!
//! The per-item work a dispatch run applies: in-process closures or external
//! commands rendered from a template.

#![warn(missing_docs)]

pub mod r#trait;
pub mod command;

pub use r#trait::{FnWork, Work};
pub use command::{CommandTemplate, CommandWork, RenderedCommand, TemplateError};
