//! Read entities definitions.

pub mod favorite;
pub mod listing;
