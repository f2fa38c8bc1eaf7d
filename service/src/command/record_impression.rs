//! [`Command`] for recording a top-slot impression.

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

/// [`Command`] recording one top-slot impression of a promoted [`Listing`].
///
/// Increments the impression counter and stamps the top-position time in one
/// atomic write. Unknown IDs are ignored, since the [`Listing`] may have been
/// removed between being served and the impression arriving.
#[derive(Clone, Copy, Debug)]
pub struct RecordImpression {
    /// [`Category`] of the [`Listing`] that occupied the top slot.
    pub category: Category,

    /// ID of the [`Listing`] that occupied the top slot.
    pub id: listing::Id,
}

impl<Db> Command<RecordImpression> for Service<Db>
where
    Db: Database<
        Update<promotion::Impression>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecordImpression,
    ) -> Result<Self::Ok, Self::Err> {
        let RecordImpression { category, id } = cmd;

        self.database()
            .execute(Update(promotion::Impression { category, id }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
    }
}

/// Error of [`RecordImpression`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}
