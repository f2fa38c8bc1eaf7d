//! [`Command`] for promoting a [`Listing`].

use common::operations::Update;
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Listing;
use crate::{
    domain::{
        listing::{self, promotion},
        Category,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] marking a [`Listing`] as promoted until the provided end date.
///
/// Promoting an already promoted [`Listing`] just moves its end date; the
/// accumulated impressions are kept, so the [`Listing`] doesn't jump the
/// rotation queue by re-promoting.
#[derive(Clone, Copy, Debug)]
pub struct PromoteListing {
    /// [`Category`] of the [`Listing`] to be promoted.
    pub category: Category,

    /// ID of the [`Listing`] to be promoted.
    pub id: listing::Id,

    /// [`DateTime`] the promotion lasts until.
    ///
    /// [`DateTime`]: common::DateTime
    pub end_date: listing::PromotionEndDateTime,
}

impl<Db> Command<PromoteListing> for Service<Db>
where
    Db: Database<
        Update<promotion::Activation>,
        Ok = bool,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: PromoteListing,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let PromoteListing {
            category,
            id,
            end_date,
        } = cmd;

        let updated = self
            .database()
            .execute(Update(promotion::Activation {
                category,
                id,
                end_date,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !updated {
            return Err(tracerr::new!(E::ListingNotExists(id)));
        }

        Ok(())
    }
}

/// Error of [`PromoteListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),
}
