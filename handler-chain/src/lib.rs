//! # Handler chain
//!
//! Update routing: [`CommandHandler`] and [`PrefixHandler`] decide whether an update is for them
//! and extract arguments, [`filters`] narrow that down, and [`HandlerChain`] runs middleware and
//! grouped handlers for each update.

pub mod chain;
pub mod command;
pub mod filters;
pub mod prefix;

pub use chain::{HandlerChain, DEFAULT_GROUP};
pub use command::{normalize_commands, CommandHandler};
pub use filters::{
    AndFilter, BoxedFilter, Filter, FilterExt, FilterResult, FnFilter, NotFilter, OrFilter,
    RegexFilter, UpdateFilter,
};
pub use prefix::PrefixHandler;
