//! [`Category`] definitions.

use std::str::FromStr;

use common::define_kind;

#[cfg(doc)]
use super::Listing;
use super::Status;

define_kind! {
    #[doc = "Category of [`Listing`]s, each backed by its own store table."]
    enum Category {
        #[doc = "Vehicles."]
        Car = 1,

        #[doc = "Real estate."]
        Property = 2,

        #[doc = "Laptops and computers."]
        Laptop = 3,

        #[doc = "Job openings."]
        Job = 4,

        #[doc = "Freelancer profiles."]
        Freelancer = 5,

        #[doc = "Businesses for sale."]
        Business = 6,

        #[doc = "Secondhand goods."]
        SecondhandItem = 7,

        #[doc = "Freelance projects."]
        Project = 8,
    }
}

impl Category {
    /// All the [`Category`]s, in their discriminant order.
    pub const ALL: [Self; 8] = [
        Self::Car,
        Self::Property,
        Self::Laptop,
        Self::Job,
        Self::Freelancer,
        Self::Business,
        Self::SecondhandItem,
        Self::Project,
    ];

    /// Returns the name of the store table backing this [`Category`].
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Car => "cars",
            Self::Property => "properties",
            Self::Laptop => "laptops",
            Self::Job => "jobs",
            Self::Freelancer => "freelancers",
            Self::Business => "businesses",
            Self::SecondhandItem => "secondhand_items",
            Self::Project => "projects",
        }
    }

    /// Resolves a [`Category`] from its store table name.
    #[must_use]
    pub fn from_table(table: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.table() == table)
    }

    /// Returns the [`Status`] gating public visibility of [`Listing`]s in
    /// this [`Category`].
    #[must_use]
    pub const fn visible_status(self) -> Status {
        match self {
            Self::Freelancer => Status::Available,
            Self::Car
            | Self::Property
            | Self::Laptop
            | Self::Job
            | Self::Business
            | Self::SecondhandItem
            | Self::Project => Status::Active,
        }
    }
}

impl serde::Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw =
            <String as serde::Deserialize<'de>>::deserialize(deserializer)?;
        Self::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod spec {
    use super::{Category, Status};

    #[test]
    fn tables_round_trip() {
        for category in Category::ALL {
            assert_eq!(
                Category::from_table(category.table()),
                Some(category),
            );
        }
        assert_eq!(Category::from_table("users"), None);
    }

    #[test]
    fn freelancers_are_gated_by_available() {
        assert_eq!(Category::Freelancer.visible_status(), Status::Available);
        assert_eq!(Category::Car.visible_status(), Status::Active);
        assert_eq!(Category::Job.visible_status(), Status::Active);
    }
}
