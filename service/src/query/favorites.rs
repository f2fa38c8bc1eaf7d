//! [`Query`] collection related to [`Favorite`]s.

use common::operations::By;

use crate::read::favorite;
#[cfg(doc)]
use crate::{domain::Favorite, Query};

use super::DatabaseQuery;

/// Queries all [`Favorite`]s saved by one user.
pub type List =
    DatabaseQuery<By<favorite::list::List, favorite::list::Selector>>;
