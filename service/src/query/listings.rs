//! [`Query`] collection related to [`Listing`]s.
//!
//! A page load runs two independent reads against the store: the promoted
//! slice and the regular slice. They combine with the promoted slice in
//! front, counting a single impression for the top slot.

use common::{
    operations::By,
    pagination::{PageNumber, PageSize},
};
use tracerr::Traced;

use crate::{
    domain::{listing::promotion, Category},
    infra::database,
    read::listing::{list, page, promoted},
    Service,
};
#[cfg(doc)]
use crate::{domain::Listing, Query as _};

use super::{DatabaseQuery, Query};

/// Queries the promoted [`Listing`]s slice of a [`Category`].
pub type Promoted = DatabaseQuery<By<promoted::Slice, promoted::Selector>>;

/// Queries a page of regular [`Listing`]s.
pub type List = DatabaseQuery<By<list::Page, list::Selector>>;

/// Queries total count of regular [`Listing`]s.
pub type TotalCount = DatabaseQuery<By<list::TotalCount, list::Filter>>;

/// [`Query`] planning the two slices of one page request.
///
/// The promoted and regular reads are logically independent, so they run
/// concurrently; both must resolve before combining.
#[derive(Clone, Debug)]
pub struct Plan {
    /// [`Category`] to load [`Listing`]s of.
    pub category: Category,

    /// [`PageNumber`] of the regular slice.
    pub number: PageNumber,

    /// [`PageSize`] of the regular slice.
    pub size: PageSize,

    /// Store-level sort order of the regular slice.
    pub sort: list::Sort,

    /// Free-text query narrowing the regular slice.
    pub search: Option<String>,
}

pub mod plan {
    //! [`Plan`] output definitions.

    use crate::read::listing::{list, promoted};

    #[cfg(doc)]
    use super::Plan;

    /// Both slices of one planned page request.
    #[derive(Clone, Debug)]
    pub struct Output {
        /// Promoted slice, in rotation order.
        pub promoted: promoted::Slice,

        /// Regular slice page.
        pub regular: list::Page,

        /// Total count of regular [`Listing`]s matching the request.
        ///
        /// [`Listing`]: crate::domain::Listing
        pub total_count: list::TotalCount,
    }
}

impl<Db> Query<Plan> for Service<Db>
where
    Self: Query<Promoted, Ok = promoted::Slice, Err = Traced<database::Error>>
        + Query<List, Ok = list::Page, Err = Traced<database::Error>>
        + Query<
            TotalCount,
            Ok = list::TotalCount,
            Err = Traced<database::Error>,
        >,
{
    type Ok = plan::Output;
    type Err = Traced<database::Error>;

    async fn execute(&self, plan: Plan) -> Result<Self::Ok, Self::Err> {
        let Plan {
            category,
            number,
            size,
            sort,
            search,
        } = plan;

        let filter = list::Filter { category, search };
        let selector = common::pagination::Selector {
            number,
            size,
            filter: filter.clone(),
            sort,
        };

        let (promoted, regular, total_count) = futures::try_join!(
            self.execute(Promoted::by(promoted::Selector { category })),
            self.execute(List::by(selector)),
            self.execute(TotalCount::by(filter)),
        )
        .map_err(tracerr::wrap!())?;

        Ok(plan::Output {
            promoted,
            regular,
            total_count,
        })
    }
}

/// [`Query`] loading one fully combined listings page.
///
/// Runs the [`Plan`], prepends the promoted slice to the regular one and
/// enqueues a single top-slot impression. The impression is recorded in the
/// background: its failure is logged and swallowed, never surfaced to the
/// page.
///
/// One [`LoadPage`] execution is the unit of "one page load": callers
/// execute it once per navigation or filter change, not once per render.
#[derive(Clone, Debug)]
pub struct LoadPage {
    /// [`Category`] to load [`Listing`]s of.
    pub category: Category,

    /// [`PageNumber`] of the regular slice.
    pub number: PageNumber,

    /// [`PageSize`] of the regular slice.
    pub size: PageSize,

    /// Store-level sort order of the regular slice.
    pub sort: list::Sort,

    /// Free-text query narrowing the regular slice.
    pub search: Option<String>,
}

impl<Db> Query<LoadPage> for Service<Db>
where
    Self: Query<Plan, Ok = plan::Output, Err = Traced<database::Error>>,
{
    type Ok = page::View;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        LoadPage {
            category,
            number,
            size,
            sort,
            search,
        }: LoadPage,
    ) -> Result<Self::Ok, Self::Err> {
        let output = self
            .execute(Plan {
                category,
                number,
                size,
                sort,
                search,
            })
            .await
            .map_err(tracerr::wrap!())?;

        if let Some(impression) = top_slot(category, &output.promoted) {
            self.enqueue_impression(impression);
        }

        Ok(combine(output))
    }
}

/// Returns the impression of the [`Listing`] occupying the top slot of the
/// provided promoted slice, if any.
///
/// Only position 0 is counted: promoted [`Listing`]s in positions 1 and 2
/// and regular ones never produce an impression.
fn top_slot(
    category: Category,
    promoted: &promoted::Slice,
) -> Option<promotion::Impression> {
    promoted.top().map(|top| promotion::Impression {
        category,
        id: top.id,
    })
}

/// Combines both slices of a [`Plan`] into one display-ordered page.
///
/// Promoted [`Listing`]s always precede regular ones positionally,
/// regardless of the regular slice's own sort order.
fn combine(output: plan::Output) -> page::View {
    let plan::Output {
        promoted,
        regular,
        total_count,
    } = output;

    let promoted_count = promoted.len();
    let mut items = promoted.into_vec();
    items.extend(regular.items);

    page::View {
        items,
        promoted_count,
        total_count,
        number: regular.number,
        size: regular.size,
    }
}

#[cfg(test)]
mod spec {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use common::{
        operations::{By, Select, Update},
        pagination::{PageNumber, PageSize, Selector, TotalCount},
        DateTime, Handler,
    };
    use tracerr::Traced;

    use crate::{
        domain::{
            listing::{promotion, Attributes, Id, ImpressionCount, UserId},
            Category, Listing, Status,
        },
        infra::database,
        read::listing::{list, promoted},
        task, Config, Service,
    };

    use super::LoadPage;

    /// In-memory single-category listing store.
    #[derive(Clone, Debug, Default)]
    struct Memory {
        rows: Arc<Mutex<Vec<Listing>>>,
        recorded: Arc<Mutex<Vec<Id>>>,
    }

    impl Memory {
        fn with_rows(rows: Vec<Listing>) -> Self {
            Self {
                rows: Arc::new(Mutex::new(rows)),
                recorded: Arc::default(),
            }
        }

        fn recorded(&self) -> Vec<Id> {
            self.recorded.lock().unwrap().clone()
        }
    }

    impl Handler<Select<By<promoted::Slice, promoted::Selector>>> for Memory {
        type Ok = promoted::Slice;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<promoted::Slice, promoted::Selector>>,
        ) -> Result<Self::Ok, Self::Err> {
            let promoted::Selector { category } = by.into_inner();
            let now = DateTime::now();

            let mut qualifying = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|l| {
                    l.status == category.visible_status()
                        && l.promotion_active(now)
                })
                .cloned()
                .collect::<Vec<_>>();
            qualifying.sort_by(promoted::ordering);

            Ok(promoted::Slice::new(qualifying))
        }
    }

    impl Handler<Select<By<list::Page, list::Selector>>> for Memory {
        type Ok = list::Page;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<list::Page, list::Selector>>,
        ) -> Result<Self::Ok, Self::Err> {
            let selector = by.into_inner();
            let Selector {
                number,
                size,
                ref filter,
                sort: _,
            } = selector;
            let now = DateTime::now();

            let mut regular = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|l| {
                    l.status == filter.category.visible_status()
                        && !l.promotion_active(now)
                })
                .cloned()
                .collect::<Vec<_>>();
            regular.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let items = regular
                .into_iter()
                .skip(usize::try_from(selector.offset()).unwrap())
                .take(usize::try_from(selector.limit()).unwrap())
                .collect();

            Ok(list::Page {
                items,
                number,
                size,
            })
        }
    }

    impl Handler<Select<By<list::TotalCount, list::Filter>>> for Memory {
        type Ok = list::TotalCount;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<list::TotalCount, list::Filter>>,
        ) -> Result<Self::Ok, Self::Err> {
            let filter = by.into_inner();
            let now = DateTime::now();

            let count = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|l| {
                    l.status == filter.category.visible_status()
                        && !l.promotion_active(now)
                })
                .count();

            Ok(TotalCount::from(i32::try_from(count).unwrap()))
        }
    }

    impl Handler<Update<promotion::Impression>> for Memory {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Update(impression): Update<promotion::Impression>,
        ) -> Result<Self::Ok, Self::Err> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) =
                rows.iter_mut().find(|l| l.id == impression.id)
            {
                row.promotion_impressions = ImpressionCount::from(
                    i32::from(row.promotion_impressions) + 1,
                );
                row.last_top_position_at = Some(DateTime::now().coerce());
            }
            self.recorded.lock().unwrap().push(impression.id);
            Ok(())
        }
    }

    impl Handler<Update<promotion::Expiry>> for Memory {
        type Ok = u64;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Update(_): Update<promotion::Expiry>,
        ) -> Result<Self::Ok, Self::Err> {
            let now = DateTime::now();
            let mut cleared = 0;
            for row in self.rows.lock().unwrap().iter_mut() {
                if row.is_promoted == Some(true)
                    && row
                        .promotion_end_date
                        .is_some_and(|end| end < now.coerce())
                {
                    row.is_promoted = Some(false);
                    cleared += 1;
                }
            }
            Ok(cleared)
        }
    }

    fn config() -> Config {
        Config {
            expire_promotions: task::expire_promotions::Config {
                interval: Duration::from_secs(60 * 60),
            },
        }
    }

    fn listing(created_offset_secs: u64) -> Listing {
        Listing {
            id: Id::new(),
            user_id: UserId::from(uuid::Uuid::new_v4()),
            status: Status::Active,
            is_promoted: None,
            promotion_end_date: None,
            promotion_impressions: 0.into(),
            last_top_position_at: None,
            created_at: (DateTime::UNIX_EPOCH
                + Duration::from_secs(created_offset_secs))
            .coerce(),
            title: "listing".into(),
            description: String::new().into(),
            price: None,
            location: None,
            attributes: Attributes::default(),
            features: vec![],
        }
    }

    fn promoted_listing(
        impressions: i32,
        last_top_secs: Option<u64>,
    ) -> Listing {
        let mut l = listing(0);
        l.is_promoted = Some(true);
        l.promotion_end_date =
            Some((DateTime::now() + Duration::from_secs(3600)).coerce());
        l.promotion_impressions = impressions.into();
        l.last_top_position_at = last_top_secs.map(|secs| {
            (DateTime::UNIX_EPOCH + Duration::from_secs(secs)).coerce()
        });
        l
    }

    fn load_page() -> LoadPage {
        LoadPage {
            category: Category::Car,
            number: PageNumber::FIRST,
            size: PageSize::DEFAULT,
            sort: list::Sort::Newest,
            search: None,
        }
    }

    /// Runs the background environment long enough for enqueued impressions
    /// to be drained.
    async fn drain(bg: task::Background) {
        _ = tokio::time::timeout(
            Duration::from_millis(50),
            std::future::IntoFuture::into_future(bg),
        )
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn promoted_slice_never_exceeds_cap() {
        let memory = Memory::with_rows(
            (0..7).map(|_| promoted_listing(0, None)).collect(),
        );
        let (service, bg) = Service::new(config(), memory);

        let view = service.execute(load_page()).await.unwrap();

        assert_eq!(view.promoted_count, 3);
        assert_eq!(view.items.len(), 3);
        drain(bg).await;
    }

    #[tokio::test(start_paused = true)]
    async fn exactly_one_impression_for_the_top_slot() {
        for qualifying in 1..=3 {
            let memory = Memory::with_rows(
                (0..qualifying)
                    .map(|i| promoted_listing(i, None))
                    .collect(),
            );
            let (service, bg) = Service::new(config(), memory.clone());

            let view = service.execute(load_page()).await.unwrap();
            drain(bg).await;

            assert_eq!(memory.recorded(), vec![view.items[0].id]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_impression_without_promoted_listings() {
        let memory =
            Memory::with_rows(vec![listing(1), listing(2), listing(3)]);
        let (service, bg) = Service::new(config(), memory.clone());

        let view = service.execute(load_page()).await.unwrap();
        drain(bg).await;

        assert_eq!(view.promoted_count, 0);
        assert!(memory.recorded().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slices_are_disjoint() {
        let mut active = promoted_listing(0, None);
        active.title = "active promotion".into();

        let mut expired = promoted_listing(0, None);
        expired.promotion_end_date =
            Some((DateTime::UNIX_EPOCH + Duration::from_secs(1)).coerce());
        expired.title = "expired promotion".into();

        let memory =
            Memory::with_rows(vec![active.clone(), expired.clone()]);
        let (service, bg) = Service::new(config(), memory);

        let view = service.execute(load_page()).await.unwrap();

        assert_eq!(view.promoted_count, 1);
        assert_eq!(view.items[0].id, active.id);
        // An expired promotion is a regular listing again.
        assert_eq!(view.items[1].id, expired.id);
        assert_eq!(i32::from(view.total_count), 1);
        drain(bg).await;
    }

    #[tokio::test(start_paused = true)]
    async fn rotation_end_to_end() {
        let rows = vec![
            promoted_listing(9, Some(100)),
            promoted_listing(1, Some(200)),
            promoted_listing(1, Some(300)),
            promoted_listing(1, Some(400)),
            promoted_listing(4, Some(500)),
        ];
        let expected = [rows[1].id, rows[2].id, rows[3].id];

        let memory = Memory::with_rows(rows);
        let (service, bg) = Service::new(config(), memory.clone());

        let view = service.execute(load_page()).await.unwrap();
        drain(bg).await;

        assert_eq!(view.promoted_count, 3);
        let slice_ids =
            view.items[..3].iter().map(|l| l.id).collect::<Vec<_>>();
        assert_eq!(slice_ids, expected);
        assert_eq!(memory.recorded(), vec![expected[0]]);
    }
}
