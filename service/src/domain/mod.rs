//! Domain entities definitions.

pub mod category;
pub mod favorite;
pub mod listing;

pub use self::{
    category::Category,
    favorite::{Favorite, FavoriteItem},
    listing::{Listing, Status},
};
