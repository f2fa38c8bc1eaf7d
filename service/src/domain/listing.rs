//! [`Listing`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{DateTimeOf, Price};
use derive_more::{AsRef, Deref, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{prelude::FromPrimitive as _, Decimal};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Category;

/// Single sellable or advertisable unit of some [`Category`].
///
/// All categories share the same lifecycle and promotion columns; the
/// category-specific payload lives in [`Attributes`] and [`Feature`]s and is
/// opaque to the promotion rotation.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: Id,

    /// ID of the account owning this [`Listing`].
    ///
    /// Immutable after creation.
    pub user_id: UserId,

    /// Lifecycle [`Status`] of this [`Listing`].
    pub status: Status,

    /// Indicator whether this [`Listing`] is promoted.
    ///
    /// Both [`None`] and `Some(false)` mean "not promoted".
    pub is_promoted: Option<bool>,

    /// [`DateTime`] the promotion of this [`Listing`] ends at.
    ///
    /// The promotion is active only until this moment passes.
    pub promotion_end_date: Option<PromotionEndDateTime>,

    /// Number of times this [`Listing`] occupied the top promoted slot.
    ///
    /// Monotonically non-decreasing.
    pub promotion_impressions: ImpressionCount,

    /// [`DateTime`] this [`Listing`] last occupied the top promoted slot.
    pub last_top_position_at: Option<TopPositionDateTime>,

    /// [`DateTime`] this [`Listing`] was created.
    pub created_at: CreationDateTime,

    /// [`Title`] of this [`Listing`].
    pub title: Title,

    /// [`Description`] of this [`Listing`].
    pub description: Description,

    /// [`Price`] of this [`Listing`], if stated.
    pub price: Option<Price>,

    /// [`Location`] of this [`Listing`], if stated.
    pub location: Option<Location>,

    /// Category-specific [`Attributes`] of this [`Listing`].
    pub attributes: Attributes,

    /// [`Feature`]s of this [`Listing`].
    pub features: Vec<Feature>,
}

impl Listing {
    /// Indicates whether this [`Listing`] carries an active promotion at the
    /// provided moment.
    #[must_use]
    pub fn promotion_active(&self, now: common::DateTime) -> bool {
        self.is_promoted == Some(true)
            && self
                .promotion_end_date
                .is_some_and(|end| end >= now.coerce())
    }

    /// Returns the textual value of the provided `field` of this [`Listing`].
    ///
    /// `location` resolves to the dedicated column, everything else to
    /// [`Attributes`].
    #[must_use]
    pub fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "location" => self.location.as_ref().map(AsRef::as_ref),
            "title" => Some(self.title.as_ref()),
            _ => self.attributes.text(field),
        }
    }

    /// Returns the numeric value of the provided `field` of this [`Listing`].
    ///
    /// `price` resolves to the dedicated column, everything else to
    /// [`Attributes`].
    #[must_use]
    pub fn numeric_field(&self, field: &str) -> Option<Decimal> {
        match field {
            "price" => self.price.map(Price::amount),
            _ => self.attributes.number(field),
        }
    }
}

/// ID of a [`Listing`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// ID of an account owning a [`Listing`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct UserId(Uuid);

/// Lifecycle status of a [`Listing`].
///
/// Only the visible status of a [`Category`] passes the public query gate.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    /// Publicly visible in every [`Category`] except freelancers.
    Active,

    /// Publicly visible status of freelancer [`Listing`]s.
    Available,

    /// Awaiting moderation.
    Pending,

    /// Soft-removed by the owner or moderation.
    Removed,

    /// Sold and kept for the owner's history only.
    Sold,
}

impl Status {
    /// Returns the stored string form of this [`Status`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Removed => "removed",
            Self::Sold => "sold",
        }
    }
}

#[cfg(feature = "postgres")]
impl<'a> FromSql<'a> for Status {
    postgres_types::accepts!(TEXT, VARCHAR);

    fn from_sql(
        ty: &postgres_types::Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        let raw = <&str as FromSql<'_>>::from_sql(ty, raw)?;
        <Self as std::str::FromStr>::from_str(raw)
            .map_err(|_| format!("invalid `Status` value: {raw}").into())
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Status {
    postgres_types::accepts!(TEXT, VARCHAR);
    postgres_types::to_sql_checked!();

    fn to_sql(
        &self,
        ty: &postgres_types::Type,
        w: &mut postgres_types::private::BytesMut,
    ) -> Result<
        postgres_types::IsNull,
        Box<dyn std::error::Error + Sync + Send>,
    > {
        self.as_str().to_sql(ty, w)
    }
}

/// Number of top-slot impressions of a [`Listing`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct ImpressionCount(i32);

/// Marker of a [`DateTime`] a promotion ends at.
#[derive(Clone, Copy, Debug)]
pub enum PromotionEnd {}

/// [`DateTime`] a promotion of a [`Listing`] ends at.
pub type PromotionEndDateTime = DateTimeOf<PromotionEnd>;

/// Marker of a [`DateTime`] a [`Listing`] occupied the top slot at.
#[derive(Clone, Copy, Debug)]
pub enum TopPosition {}

/// [`DateTime`] a [`Listing`] last occupied the top promoted slot.
pub type TopPositionDateTime = DateTimeOf<TopPosition>;

/// Marker of a [`DateTime`] a [`Listing`] was created at.
#[derive(Clone, Copy, Debug)]
pub enum Creation {}

/// [`DateTime`] a [`Listing`] was created at.
pub type CreationDateTime = DateTimeOf<Creation>;

/// Title of a [`Listing`].
#[derive(
    AsRef,
    Clone,
    Debug,
    Deref,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[as_ref(str)]
#[from(String, &str)]
pub struct Title(String);

/// Description of a [`Listing`].
#[derive(
    AsRef,
    Clone,
    Debug,
    Deref,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[as_ref(str)]
#[from(String, &str)]
pub struct Description(String);

/// Location a [`Listing`] is offered at.
#[derive(
    AsRef,
    Clone,
    Debug,
    Deref,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[as_ref(str)]
#[from(String, &str)]
pub struct Location(String);

/// Single feature of a [`Listing`] (e.g. "sunroof", "balcony").
#[derive(
    AsRef,
    Clone,
    Debug,
    Deref,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[as_ref(str)]
#[from(String, &str)]
pub struct Feature(String);

/// Category-specific attributes of a [`Listing`].
///
/// Stored as a JSON object; the rotation logic never inspects it, only the
/// filter engine does.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Attributes(serde_json::Map<String, serde_json::Value>);

impl Attributes {
    /// Returns the textual value of the provided attribute, if present.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(serde_json::Value::as_str)
    }

    /// Returns the numeric value of the provided attribute, if present.
    ///
    /// Numbers encoded as strings are parsed too, since submission forms
    /// store them inconsistently.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<Decimal> {
        match self.0.get(name)? {
            serde_json::Value::Number(n) => Decimal::from_f64(n.as_f64()?),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            serde_json::Value::Array(_)
            | serde_json::Value::Bool(_)
            | serde_json::Value::Null
            | serde_json::Value::Object(_) => None,
        }
    }
}

impl From<serde_json::Value> for Attributes {
    /// Converts a raw JSON value into [`Attributes`], treating any
    /// non-object value as empty.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Self(map),
            serde_json::Value::Array(_)
            | serde_json::Value::Bool(_)
            | serde_json::Value::Null
            | serde_json::Value::Number(_)
            | serde_json::Value::String(_) => Self::default(),
        }
    }
}

impl FromIterator<(String, serde_json::Value)> for Attributes {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (String, serde_json::Value)>,
    {
        Self(iter.into_iter().collect())
    }
}

/// Promotion-related write payloads.
pub mod promotion {
    use super::{Category, Id, PromotionEndDateTime};

    /// Activation of a promotion until the provided end date.
    #[derive(Clone, Copy, Debug)]
    pub struct Activation {
        /// [`Category`] the promoted [`Listing`] belongs to.
        ///
        /// [`Listing`]: super::Listing
        pub category: Category,

        /// ID of the promoted [`Listing`].
        ///
        /// [`Listing`]: super::Listing
        pub id: Id,

        /// [`PromotionEndDateTime`] the promotion lasts until.
        pub end_date: PromotionEndDateTime,
    }

    /// Single top-slot impression of a promoted [`Listing`].
    ///
    /// Applying it atomically increments the impression counter and stamps
    /// the top-position time.
    ///
    /// [`Listing`]: super::Listing
    #[derive(Clone, Copy, Debug)]
    pub struct Impression {
        /// [`Category`] the promoted [`Listing`] belongs to.
        ///
        /// [`Listing`]: super::Listing
        pub category: Category,

        /// ID of the [`Listing`] occupying the top slot.
        ///
        /// [`Listing`]: super::Listing
        pub id: Id,
    }

    /// Sweep clearing the promoted flag of [`Listing`]s whose promotion end
    /// date has passed.
    ///
    /// [`Listing`]: super::Listing
    #[derive(Clone, Copy, Debug)]
    pub struct Expiry {
        /// [`Category`] to sweep.
        pub category: Category,
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{Attributes, Listing, Status};

    fn attributes(json: serde_json::Value) -> Attributes {
        Attributes::from(json)
    }

    #[test]
    fn attribute_numbers_parse_from_strings_too() {
        let attrs = attributes(serde_json::json!({
            "year": 2019,
            "km": "123000",
            "condition": "used",
        }));

        assert_eq!(attrs.number("year"), Some(2019.into()));
        assert_eq!(attrs.number("km"), Some(123_000.into()));
        assert_eq!(attrs.number("condition"), None);
        assert_eq!(attrs.text("condition"), Some("used"));
    }

    #[test]
    fn status_parses_from_stored_form() {
        assert_eq!(
            <Status as std::str::FromStr>::from_str("active"),
            Ok(Status::Active),
        );
        assert!(<Status as std::str::FromStr>::from_str("Active").is_err());
    }

    #[test]
    fn promotion_activity_requires_flag_and_unexpired_end_date() {
        let now = DateTime::now();
        let later = now + std::time::Duration::from_secs(3600);
        let earlier = now - std::time::Duration::from_secs(3600);

        let mut listing = Listing {
            id: super::Id::new(),
            user_id: super::UserId::from(uuid::Uuid::new_v4()),
            status: Status::Active,
            is_promoted: Some(true),
            promotion_end_date: Some(later.coerce()),
            promotion_impressions: 0.into(),
            last_top_position_at: None,
            created_at: now.coerce(),
            title: "Toyota Corolla".into(),
            description: "2019, one owner".into(),
            price: None,
            location: None,
            attributes: Attributes::default(),
            features: vec![],
        };
        assert!(listing.promotion_active(now));

        listing.promotion_end_date = Some(now.coerce());
        assert!(listing.promotion_active(now));

        listing.promotion_end_date = Some(earlier.coerce());
        assert!(!listing.promotion_active(now));

        listing.promotion_end_date = Some(later.coerce());
        listing.is_promoted = None;
        assert!(!listing.promotion_active(now));
    }
}
