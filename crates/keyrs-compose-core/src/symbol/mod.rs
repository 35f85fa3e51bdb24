// Keyrs Compose Symbol Module
// Keysym name resolution and reference table loading

pub mod resolver;
pub mod tables;

pub use resolver::{is_unicode_literal, parse_literal, ResolveError, Symbol, SymbolResolver};
pub use tables::{apply_patches, parse_keysym_header, parse_keysyms_txt, KeysymTableError};
