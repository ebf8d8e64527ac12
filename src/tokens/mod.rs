//! Token registry: static metadata for the tradable assets

mod registry;
mod types;

pub use registry::TokenRegistry;
pub use types::{Token, TokenList};
