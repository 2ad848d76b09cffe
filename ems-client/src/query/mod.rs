//! URL-backed list state
//!
//! - [`params`]: page / search / division read from and written to the location
//! - [`debounce`]: search box that commits to the location after a quiet period

pub mod debounce;
pub mod params;

pub use debounce::SearchInput;
pub use params::{ListQuery, ParamsPatch, QueryParams, parse_leading_int};
