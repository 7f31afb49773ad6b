//! Resource graph — types, construction, ordering, validation.

pub mod builder;
pub mod order;
pub mod types;
pub mod validate;
