//! [`Command`] for toggling a [`Favorite`].

use common::{
    operations::{By, Delete, Insert},
    DateTimeOf,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Listing;
use crate::{
    domain::{favorite, listing, Favorite, FavoriteItem},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] saving a [`Listing`] as a [`Favorite`], or removing it if
/// already saved.
#[derive(Clone, Debug)]
pub struct ToggleFavorite {
    /// ID of the account toggling the [`Favorite`].
    pub user_id: listing::UserId,

    /// [`FavoriteItem`] being toggled.
    pub item: FavoriteItem,
}

/// Resulting state of a [`ToggleFavorite`] [`Command`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Toggled {
    /// The [`Favorite`] is saved now.
    Saved,

    /// The [`Favorite`] is removed now.
    Removed,
}

impl<Db> Command<ToggleFavorite> for Service<Db>
where
    Db: Database<Insert<Favorite>, Ok = bool, Err = Traced<database::Error>>
        + Database<
            Delete<By<Favorite, favorite::Key>>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = Toggled;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ToggleFavorite,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ToggleFavorite { user_id, item } = cmd;
        let key = favorite::Key {
            user_id,
            kind: item.kind,
            id: item.id,
        };

        // Insertion is idempotent at the store level, so a concurrent double
        // toggle settles on one of the two states instead of erroring.
        let inserted = self
            .database()
            .execute(Insert(Favorite {
                user_id,
                item,
                created_at: DateTimeOf::now(),
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if inserted {
            return Ok(Toggled::Saved);
        }

        self.database()
            .execute(Delete(By::new(key)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        Ok(Toggled::Removed)
    }
}

/// Error of [`ToggleFavorite`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}
