//! Service contains the business logic of the marketplace.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod browse;
pub mod command;
pub mod domain;
pub mod filter;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::error::Error;

use common::operations::{By, Start, Update};
use tokio::sync::mpsc;
use tracerr::Traced;
use tracing as log;

use self::{domain::listing::promotion, infra::database};
use infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// [`task::ExpirePromotions`] configuration.
    pub expire_promotions: task::expire_promotions::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// Sink of top-slot impressions to be recorded in the background.
    impressions: mpsc::UnboundedSender<promotion::Impression>,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, spawning its
    /// background [`Task`]s.
    ///
    /// The returned [`task::Background`] environment must be driven for the
    /// [`task::ExpirePromotions`] sweep and impression recording to make
    /// progress.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Db: Database<
                Update<promotion::Impression>,
                Ok = (),
                Err = Traced<database::Error>,
            > + Clone
            + 'static,
        Self: Task<
                Start<
                    By<
                        task::ExpirePromotions<Self>,
                        task::expire_promotions::Config,
                    >,
                >,
                Ok = (),
                Err: Error + 'static,
            > + Clone
            + 'static,
    {
        let (impressions, mut recorded) = mpsc::unbounded_channel();
        let this = Service {
            config,
            database,
            impressions,
        };

        let mut bg = task::Background::default();

        let svc = this.clone();
        bg.spawn(async move {
            svc.execute(Start(By::new(svc.config().expire_promotions)))
                .await
        });

        // Impressions are recorded out of the page load's critical path: a
        // failed increment is logged and the page is served regardless.
        let db = this.database.clone();
        bg.spawn(async move {
            while let Some(impression) = recorded.recv().await {
                _ = db.execute(Update(impression)).await.map_err(|e| {
                    log::warn!(
                        listing = %impression.id,
                        "failed to record impression: {e}",
                    );
                });
            }
            Ok::<_, std::convert::Infallible>(())
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Enqueues the provided [`promotion::Impression`] for background
    /// recording.
    fn enqueue_impression(&self, impression: promotion::Impression) {
        _ = self.impressions.send(impression).map_err(|_| {
            log::warn!(
                listing = %impression.id,
                "impression recorder is gone, dropping impression",
            );
        });
    }
}
