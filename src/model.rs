//! Denormalized tree record and reference-schema constants

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Fully-qualified name of the denormalized tree table
pub const TREES_TABLE: &str = "denormalized.trees_denormalized";

/// Region classification that marks a country reference as valid
///
/// Every visible record must join to a `public.region` row with this
/// `type_id`; records failing the join are invisible system-wide.
pub const COUNTRY_REGION_TYPE: i32 = 6;

/// Name of the `webmap.config` record holding the featured tree id list
pub const FEATURED_TREES_CONFIG: &str = "featured-tree";

/// A denormalized tree record enriched with resolved reference data
///
/// The base columns come straight off `denormalized.trees_denormalized`;
/// the `*_name` / `*_desc` fields are resolved through outer joins at read
/// time and degrade to `None` when the reference row is missing. The country
/// join is the one exception: it is a visibility constraint, not a decoration,
/// so a record without a valid country reference is never returned at all.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Tree {
    /// Internal numeric id (unique, stable)
    pub id: i64,
    /// External UUID (unique, stable, alternate key)
    pub uuid: Uuid,
    /// Latitude of the planting site
    pub lat: Option<f64>,
    /// Longitude of the planting site
    pub lon: Option<f64>,
    /// Species reference id
    pub species_id: Option<i64>,
    /// Planting organization id (aliased from `planting_organization_id`)
    pub organization_id: Option<i64>,
    /// Country reference id
    pub country_id: Option<i64>,
    /// Wallet the record is associated with, if any
    pub wallet_id: Option<Uuid>,
    /// Creation timestamp
    pub time_created: DateTime<Utc>,
    /// Soft-delete flag; `false` hides the record from filtered listings
    pub active: bool,
    /// Planter reference id
    pub planter_id: Option<i64>,
    /// Denormalized species label carried on the record itself
    pub species_name: Option<String>,
    /// Resolved organization display name
    pub organization_name: Option<String>,
    /// Resolved country display name
    pub country_name: Option<String>,
    /// Resolved species description
    pub species_desc: Option<String>,
    /// Resolved wallet display name
    pub wallet_name: Option<String>,
}
