//! Page-level browsing state over listings of one [`Category`].
//!
//! This is the seam a presentation layer binds to: it owns the current page,
//! sort, search and filter state, refetches on changes and narrows the
//! fetched page in memory. Fetch failures keep the previously shown items
//! visible instead of blanking them.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use common::pagination::{PageNumber, PageSize};
use smart_default::SmartDefault;
use tokio::{sync::Mutex, time};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{Category, Listing},
    filter::Criteria,
    infra::database,
    query::listings,
    read::listing::{list, page},
    Query,
};

/// [`Browse`] configuration.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Time the search input has to stay unchanged before a query fires.
    #[default(Duration::from_millis(300))]
    pub debounce: Duration,
}

/// Browsing session over listings of one [`Category`].
///
/// Cheap to clone; clones share the same state, the way multiple UI
/// callbacks of one page do.
#[derive(Clone, Debug)]
pub struct Browse<Q> {
    /// Executor of [`listings::LoadPage`] queries.
    query: Q,

    /// [`Category`] being browsed.
    category: Category,

    /// [`Config`] of this [`Browse`].
    config: Config,

    /// Number of the most recently dispatched page request.
    ///
    /// A response is applied only if its request is still the newest one,
    /// otherwise it's stale and discarded.
    generation: Arc<AtomicU64>,

    /// Number of the most recent search keystroke, for debouncing.
    typing: Arc<AtomicU64>,

    /// Shared mutable state of this [`Browse`].
    state: Arc<Mutex<State>>,
}

/// Mutable state of a [`Browse`].
#[derive(Debug, Default)]
struct State {
    /// Items of the most recently applied page, promoted ones first.
    items: Vec<Listing>,

    /// Number of promoted items at the head of [`State::items`].
    promoted_count: usize,

    /// Total count of regular listings matching the current request.
    total_count: list::TotalCount,

    /// Current [`PageNumber`].
    number: PageNumber,

    /// Current [`PageSize`].
    size: PageSize,

    /// Store-level sort of the regular slice.
    sort: list::Sort,

    /// Debounced search query, if any.
    search: Option<String>,

    /// In-memory narrowing [`Criteria`].
    criteria: Criteria,

    /// In-memory sort overriding the displayed order, if selected.
    client_sort: Option<list::Sort>,

    /// Indicator whether a page request is in flight.
    loading: bool,

    /// Indicator whether the most recent page request failed.
    failed: bool,
}

/// Immutable view of a [`Browse`] state, as bound by a presentation layer.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Items to display, already narrowed and ordered.
    pub items: Vec<Listing>,

    /// Indicator whether a page request is in flight.
    pub loading: bool,

    /// Indicator whether the most recent page request failed.
    pub failed: bool,

    /// Total count of regular listings matching the current request.
    pub total_count: list::TotalCount,

    /// Current [`PageNumber`].
    pub number: PageNumber,

    /// Current [`PageSize`].
    pub size: PageSize,

    /// Indicator whether a following page exists.
    pub has_next_page: bool,
}

impl<Q> Browse<Q>
where
    Q: Query<
        listings::LoadPage,
        Ok = page::View,
        Err = Traced<database::Error>,
    >,
{
    /// Creates a new [`Browse`] over the provided [`Category`].
    ///
    /// No query is fired until the first [`Browse::refresh()`].
    #[must_use]
    pub fn new(category: Category, config: Config, query: Q) -> Self {
        Self {
            query,
            category,
            config,
            generation: Arc::default(),
            typing: Arc::default(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Fetches the current page and applies the response, unless a newer
    /// request was dispatched meanwhile.
    ///
    /// On failure the previously applied items stay visible and only the
    /// failure indicator is raised.
    pub async fn refresh(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let request = {
            let mut state = self.state.lock().await;
            state.loading = true;
            listings::LoadPage {
                category: self.category,
                number: state.number,
                size: state.size,
                sort: state.sort,
                search: state.search.clone(),
            }
        };

        let result = self.query.execute(request).await;

        let mut state = self.state.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            // A newer request owns the state now.
            return;
        }
        state.loading = false;
        match result {
            Ok(view) => {
                state.items = view.items;
                state.promoted_count = view.promoted_count;
                state.total_count = view.total_count;
                state.number = view.number;
                state.size = view.size;
                state.failed = false;
            }
            Err(e) => {
                log::warn!("failed to load listings page: {e}");
                state.failed = true;
            }
        }
    }

    /// Moves to the provided [`PageNumber`] and refetches.
    pub async fn set_page(&self, number: PageNumber) {
        self.state.lock().await.number = number;
        self.refresh().await;
    }

    /// Changes the store-level sort, rewinds to the first page and
    /// refetches.
    pub async fn set_sort(&self, sort: list::Sort) {
        {
            let mut state = self.state.lock().await;
            state.sort = sort;
            state.number = PageNumber::FIRST;
        }
        self.refresh().await;
    }

    /// Replaces the in-memory narrowing [`Criteria`].
    ///
    /// Purely local: the already-fetched page is renarrowed without a query.
    pub async fn set_criteria(&self, criteria: Criteria) {
        self.state.lock().await.criteria = criteria;
    }

    /// Overrides (or, with [`None`], restores) the displayed order.
    ///
    /// Purely local. While unset, promoted items keep their position at the
    /// head of the page.
    pub async fn set_client_sort(&self, sort: Option<list::Sort>) {
        self.state.lock().await.client_sort = sort;
    }

    /// Registers a search input keystroke.
    ///
    /// The query fires only once the input stays unchanged for the
    /// configured debounce window, so typing a word fires one query, not one
    /// per keystroke.
    pub async fn input_search(&self, query: &str) {
        let epoch = self.typing.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().await;
            state.search =
                Some(query.trim().to_owned()).filter(|q| !q.is_empty());
            state.number = PageNumber::FIRST;
        }

        time::sleep(self.config.debounce).await;
        if self.typing.load(Ordering::SeqCst) != epoch {
            // Superseded by further typing.
            return;
        }
        self.refresh().await;
    }

    /// Returns the current [`Snapshot`] of this [`Browse`].
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;

        let items = match state.client_sort {
            Some(sort) => state.criteria.apply(&state.items, sort),
            None => state
                .items
                .iter()
                .filter(|l| state.criteria.matches(l))
                .cloned()
                .collect(),
        };

        Snapshot {
            items,
            loading: state.loading,
            failed: state.failed,
            total_count: state.total_count,
            number: state.number,
            size: state.size,
            has_next_page: state
                .total_count
                .has_page_after(state.number, state.size),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    use common::{
        pagination::{PageNumber, PageSize},
        DateTime, Handler,
    };
    use tracerr::Traced;

    use crate::{
        domain::{
            listing::{Attributes, Id, UserId},
            Category, Listing, Status,
        },
        infra::{database, postgres},
        query::listings::LoadPage,
        read::listing::page,
    };

    use super::{Browse, Config};

    fn listing(title: &str) -> Listing {
        Listing {
            id: Id::new(),
            user_id: UserId::from(uuid::Uuid::new_v4()),
            status: Status::Active,
            is_promoted: None,
            promotion_end_date: None,
            promotion_impressions: 0.into(),
            last_top_position_at: None,
            created_at: DateTime::now().coerce(),
            title: title.into(),
            description: String::new().into(),
            price: None,
            location: None,
            attributes: Attributes::default(),
            features: vec![],
        }
    }

    fn view(items: Vec<Listing>, number: PageNumber) -> page::View {
        page::View {
            items,
            promoted_count: 0,
            total_count: 0.into(),
            number,
            size: PageSize::DEFAULT,
        }
    }

    fn db_error() -> Traced<database::Error> {
        tracerr::new!(database::Error::Postgres(
            postgres::Error::PoolError(deadpool::managed::PoolError::Timeout(
                deadpool::managed::TimeoutType::Wait,
            ))
        ))
    }

    /// Scripted page fetcher: pops one step per request, sleeping its delay
    /// before responding. An empty script responds instantly with an empty
    /// page.
    #[derive(Clone, Debug, Default)]
    struct Fetcher {
        calls: Arc<Mutex<Vec<Option<String>>>>,
        count: Arc<AtomicUsize>,
        script: Arc<
            Mutex<VecDeque<(Duration, Result<Vec<Listing>, Traced<database::Error>>)>>,
        >,
    }

    impl Fetcher {
        fn scripted(
            steps: impl IntoIterator<
                Item = (Duration, Result<Vec<Listing>, Traced<database::Error>>),
            >,
        ) -> Self {
            Self {
                script: Arc::new(Mutex::new(steps.into_iter().collect())),
                ..Self::default()
            }
        }
    }

    impl Handler<LoadPage> for Fetcher {
        type Ok = page::View;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            req: LoadPage,
        ) -> Result<Self::Ok, Self::Err> {
            _ = self.count.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push(req.search.clone());

            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some((delay, result)) => {
                    tokio::time::sleep(delay).await;
                    result.map(|items| view(items, req.number))
                }
                None => Ok(view(vec![], req.number)),
            }
        }
    }

    fn browse(fetcher: Fetcher) -> Browse<Fetcher> {
        Browse::new(Category::Car, Config::default(), fetcher)
    }

    #[tokio::test(start_paused = true)]
    async fn typing_burst_fires_one_query() {
        let fetcher = Fetcher::default();
        let browse = browse(fetcher.clone());

        // Keystrokes 50ms apart, well inside the 300ms window.
        macro_rules! keystroke {
            ($at:expr, $q:expr) => {
                async {
                    tokio::time::sleep(Duration::from_millis($at)).await;
                    browse.input_search($q).await;
                }
            };
        }
        futures::join!(
            keystroke!(0, "ט"),
            keystroke!(50, "טו"),
            keystroke!(100, "טוי"),
            keystroke!(150, "טויו"),
            keystroke!(200, "טויוט"),
            keystroke!(250, "טויוטה"),
        );

        assert_eq!(fetcher.count.load(Ordering::SeqCst), 1);
        assert_eq!(
            *fetcher.calls.lock().unwrap(),
            vec![Some("טויוטה".to_owned())],
        );
    }

    #[tokio::test(start_paused = true)]
    async fn paused_typing_fires_again() {
        let fetcher = Fetcher::default();
        let browse = browse(fetcher.clone());

        browse.input_search("toyota").await;
        browse.input_search("toyota corolla").await;

        assert_eq!(fetcher.count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_discarded() {
        let slow = listing("slow");
        let fast = listing("fast");
        let fetcher = Fetcher::scripted([
            (Duration::from_millis(500), Ok(vec![slow])),
            (Duration::from_millis(50), Ok(vec![fast.clone()])),
        ]);
        let browse = browse(fetcher.clone());

        futures::join!(
            browse.set_page(PageNumber::new(2).unwrap()),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                browse.set_page(PageNumber::new(3).unwrap()).await;
            },
        );

        let snapshot = browse.snapshot().await;
        assert_eq!(snapshot.number, PageNumber::new(3).unwrap());
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].id, fast.id);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_previous_items() {
        let shown = listing("already shown");
        let fetcher = Fetcher::scripted([
            (Duration::ZERO, Ok(vec![shown.clone()])),
            (Duration::ZERO, Err(db_error())),
        ]);
        let browse = browse(fetcher);

        browse.refresh().await;
        let snapshot = browse.snapshot().await;
        assert!(!snapshot.failed);
        assert_eq!(snapshot.items[0].id, shown.id);

        browse.refresh().await;
        let snapshot = browse.snapshot().await;
        assert!(snapshot.failed);
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].id, shown.id);
    }
}
