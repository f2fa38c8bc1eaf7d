//! [`Favorite`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{favorite, Favorite, FavoriteItem},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::favorite as read,
};

impl<C> Database<Insert<Favorite>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(favorite): Insert<Favorite>,
    ) -> Result<Self::Ok, Self::Err> {
        let Favorite {
            user_id,
            item:
                FavoriteItem {
                    kind,
                    id,
                    label,
                    price,
                },
            created_at,
        } = favorite;

        const SQL: &str = "\
            INSERT INTO favorites (\
                user_id, kind, listing_id, \
                label, price, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::INT2, $3::UUID, \
                $4::TEXT, $5::NUMERIC, \
                $6::TIMESTAMPTZ \
            ) \
            ON CONFLICT (user_id, kind, listing_id) DO NOTHING";
        self.exec(
            SQL,
            &[&user_id, &kind, &id, &label, &price, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|affected| affected > 0)
    }
}

impl<C> Database<Delete<By<Favorite, favorite::Key>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Favorite, favorite::Key>>,
    ) -> Result<Self::Ok, Self::Err> {
        let favorite::Key { user_id, kind, id } = by.into_inner();

        const SQL: &str = "\
            DELETE FROM favorites \
            WHERE user_id = $1::UUID \
              AND kind = $2::INT2 \
              AND listing_id = $3::UUID";
        self.exec(SQL, &[&user_id, &kind, &id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<read::list::List, read::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::list::List;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::list::List, read::list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::list::Selector { user_id } = by.into_inner();

        const SQL: &str = "\
            SELECT user_id, kind, listing_id, \
                   label, price, \
                   created_at \
            FROM favorites \
            WHERE user_id = $1::UUID \
            ORDER BY created_at DESC";
        Ok(read::list::List(
            self.query(SQL, &[&user_id])
                .await
                .map_err(tracerr::wrap!())?
                .into_iter()
                .map(|row| Favorite {
                    user_id: row.get("user_id"),
                    item: FavoriteItem {
                        kind: row.get("kind"),
                        id: row.get("listing_id"),
                        label: row.get("label"),
                        price: row.get("price"),
                    },
                    created_at: row.get("created_at"),
                })
                .collect(),
        ))
    }
}
