//! [`Favorite`]-related read definitions.

#[cfg(doc)]
use crate::domain::Favorite;

pub mod list {
    //! [`Favorite`]s list definitions.

    use crate::domain::{listing, Favorite};

    /// All [`Favorite`]s saved by one user, newest first.
    #[derive(Clone, Debug, Default)]
    pub struct List(pub Vec<Favorite>);

    /// Selector of a [`List`].
    #[derive(Clone, Copy, Debug)]
    pub struct Selector {
        /// ID of the account to select [`Favorite`]s of.
        pub user_id: listing::UserId,
    }
}
