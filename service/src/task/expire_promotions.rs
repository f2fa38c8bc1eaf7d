//! [`ExpirePromotions`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Start, Update};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{listing::promotion, Category},
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::Listing;

use super::Task;

/// Configuration for [`ExpirePromotions`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between promotion expiry sweeps.
    pub interval: time::Duration,
}

/// [`Task`] sweeping expired promotions of [`Listing`]s.
///
/// Expired promotions are already invisible to queries, since those check the
/// end date themselves. The sweep only reconciles the stored flag, keeping
/// the promoted partial index small.
#[derive(Clone, Copy, Debug)]
pub struct ExpirePromotions<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ExpirePromotions<Self>, Config>>> for Service<Db>
where
    ExpirePromotions<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpirePromotions<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpirePromotions {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ExpirePromotions` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for ExpirePromotions<Service<Db>>
where
    Db: Database<
        Update<promotion::Expiry>,
        Ok = u64,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        for category in Category::ALL {
            let swept = self
                .service
                .database()
                .execute(Update(promotion::Expiry { category }))
                .await
                .map_err(tracerr::map_from_and_wrap!())?;
            if swept > 0 {
                log::debug!(%category, "swept {swept} expired promotions");
            }
        }
        Ok(())
    }
}

/// Error of [`ExpirePromotions`] execution.
pub type ExecutionError = Traced<database::Error>;
