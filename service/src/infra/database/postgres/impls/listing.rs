//! [`Listing`]-related [`Database`] implementations.

use common::operations::{By, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        listing::{promotion, Feature},
        Listing,
    },
    infra::{
        database::{
            self,
            postgres::{Connection, SearchPattern},
            Postgres,
        },
        Database,
    },
    read::listing::{list, promoted},
};

/// Columns every listing table carries, in decode order.
const COLUMNS: &str = "\
    id, user_id, status, \
    is_promoted, promotion_end_date, \
    promotion_impressions, last_top_position_at, \
    created_at, \
    title, description, price, location, \
    attributes, features";

/// Decodes a [`Listing`] out of the provided [`Row`].
fn decode(row: &Row) -> Listing {
    Listing {
        id: row.get("id"),
        user_id: row.get("user_id"),
        status: row.get("status"),
        is_promoted: row.get("is_promoted"),
        promotion_end_date: row.get("promotion_end_date"),
        promotion_impressions: row.get("promotion_impressions"),
        last_top_position_at: row.get("last_top_position_at"),
        created_at: row.get("created_at"),
        title: row.get::<_, String>("title").into(),
        description: row.get::<_, String>("description").into(),
        price: row.get("price"),
        location: row.get::<_, Option<String>>("location").map(Into::into),
        attributes: row.get::<_, serde_json::Value>("attributes").into(),
        features: row
            .get::<_, Vec<String>>("features")
            .into_iter()
            .map(Feature::from)
            .collect(),
    }
}

/// SQL condition of a [`Listing`] not carrying an active promotion.
///
/// Keep in sync with [`Listing::promotion_active()`]: the two conditions
/// partition visible [`Listing`]s into the regular and promoted slices.
const NOT_PROMOTED: &str = "(is_promoted IS NOT TRUE \
                             OR promotion_end_date IS NULL \
                             OR promotion_end_date < NOW())";

impl<C> Database<Select<By<promoted::Slice, promoted::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = promoted::Slice;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<promoted::Slice, promoted::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let promoted::Selector { category } = by.into_inner();

        let limit = i64::try_from(promoted::SLICE_LIMIT).unwrap();
        let status = category.visible_status();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM {table} \
             WHERE status = $1::TEXT \
               AND is_promoted IS TRUE \
               AND promotion_end_date >= NOW() \
             ORDER BY promotion_impressions ASC, \
                      last_top_position_at ASC NULLS FIRST, \
                      id ASC \
             LIMIT $2::INT8",
            table = category.table(),
        );
        Ok(promoted::Slice::new(
            self.query(&sql, &[&status, &limit])
                .await
                .map_err(tracerr::wrap!())?
                .iter()
                .map(decode),
        ))
    }
}

impl<C> Database<Select<By<list::Page, list::Selector>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::Page, list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let selector = by.into_inner();
        let list::Filter { category, search } = selector.filter.clone();

        let status = category.visible_status();
        let limit = selector.limit();
        let offset = selector.offset();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&status, &limit, &offset];

        let pattern = search.as_deref().map(SearchPattern::new);
        let pattern_idx = pattern.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM {table} \
             WHERE status = $1::TEXT \
               AND {NOT_PROMOTED} \
                   {search_filtering} \
             ORDER BY {order_by} \
             LIMIT $2::INT8 \
             OFFSET $3::INT8",
            table = category.table(),
            order_by = selector.sort.order_by(category),
            search_filtering =
                pattern_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND (title ILIKE ${idx}::TEXT \
                         OR description ILIKE ${idx}::TEXT)"
                    ))
                }),
        );
        let items = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(decode)
            .collect();

        Ok(list::Page {
            items,
            number: selector.number,
            size: selector.size,
        })
    }
}

impl<C> Database<Select<By<list::TotalCount, list::Filter>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::TotalCount, list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list::Filter { category, search } = by.into_inner();

        let status = category.visible_status();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&status];

        let pattern = search.as_deref().map(SearchPattern::new);
        let pattern_idx = pattern.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM {table} \
             WHERE status = $1::TEXT \
               AND {NOT_PROMOTED} \
                   {search_filtering}",
            table = category.table(),
            search_filtering =
                pattern_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND (title ILIKE ${idx}::TEXT \
                         OR description ILIKE ${idx}::TEXT)"
                    ))
                }),
        );
        self.query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}

impl<C> Database<Update<promotion::Impression>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(impression): Update<promotion::Impression>,
    ) -> Result<Self::Ok, Self::Err> {
        let promotion::Impression { category, id } = impression;

        // Counter and stamp move together, in one atomic statement, so
        // concurrent page loads never lose an increment.
        let sql = format!(
            "UPDATE {table} \
             SET promotion_impressions = promotion_impressions + 1, \
                 last_top_position_at = NOW() \
             WHERE id = $1::UUID",
            table = category.table(),
        );
        self.exec(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<promotion::Activation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(activation): Update<promotion::Activation>,
    ) -> Result<Self::Ok, Self::Err> {
        let promotion::Activation {
            category,
            id,
            end_date,
        } = activation;

        let sql = format!(
            "UPDATE {table} \
             SET is_promoted = TRUE, \
                 promotion_end_date = $2::TIMESTAMPTZ \
             WHERE id = $1::UUID",
            table = category.table(),
        );
        self.exec(&sql, &[&id, &end_date])
            .await
            .map_err(tracerr::wrap!())
            .map(|affected| affected > 0)
    }
}

impl<C> Database<Update<promotion::Expiry>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(expiry): Update<promotion::Expiry>,
    ) -> Result<Self::Ok, Self::Err> {
        let promotion::Expiry { category } = expiry;

        let sql = format!(
            "UPDATE {table} \
             SET is_promoted = FALSE \
             WHERE is_promoted IS TRUE \
               AND promotion_end_date < NOW()",
            table = category.table(),
        );
        self.exec(&sql, &[]).await.map_err(tracerr::wrap!())
    }
}
