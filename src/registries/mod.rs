mod language_registry;
mod mime_registry;

pub use language_registry::{LanguageRegistry, DEFAULT_EXTENSION};
pub use mime_registry::mime_type_for;
