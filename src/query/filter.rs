//! Filter specification types for tree queries
//!
//! A [`TreeFilter`] carries exactly one discriminating criterion: an identity
//! key, a single listing dimension, or the featured list. Dispatch on the
//! variant is exhaustive, so "which filter is populated" is settled by the
//! type system rather than by inspecting optional fields at runtime.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity key for a single-record lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKey {
    /// Internal numeric id
    Id(i64),
    /// External UUID alternate key
    Uuid(Uuid),
}

impl fmt::Display for TreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{}", id),
            Self::Uuid(uuid) => write!(f, "uuid:{}", uuid),
        }
    }
}

/// One listing dimension
///
/// Listing predicates constrain the record set and additionally require
/// `active = true`; identity lookups do not.
#[derive(Debug, Clone, PartialEq)]
pub enum ListFilter {
    /// No constraint beyond visibility and the active flag
    All,
    /// Exact match on the planting organization id
    Organization(i64),
    /// Calendar-day range on `time_created`, expanded to UTC day boundaries
    DateRange {
        /// First day, inclusive
        start: NaiveDate,
        /// Last day, inclusive as a calendar day
        end: NaiveDate,
    },
    /// Exact match against an associated tag name
    Tag(String),
    /// Exact match on the wallet id; records without a wallet never match
    Wallet(Uuid),
    /// Exact match on the planter id
    Planter(i64),
}

impl ListFilter {
    /// Whether the predicate needs the tag association tables joined in
    pub fn needs_tag_join(&self) -> bool {
        matches!(self, Self::Tag(_))
    }
}

/// A complete filter specification: one criterion, nothing else
#[derive(Debug, Clone, PartialEq)]
pub enum TreeFilter {
    /// Identity lookup by id or uuid
    Key(TreeKey),
    /// Filtered listing
    List(ListFilter),
    /// The externally configured featured list
    Featured,
}

/// Limit/offset pagination bounds, applied verbatim to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of rows to return (positive)
    pub limit: i64,
    /// Number of rows to skip (non-negative)
    pub offset: i64,
}

impl Page {
    /// Create pagination bounds
    #[must_use]
    pub const fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

/// Whitelisted sort columns for listing queries
///
/// Sort fields reach the query text as identifiers, not bound values, so the
/// set is closed: anything a caller supplies must map onto one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Internal numeric id (insertion order)
    #[default]
    Id,
    /// Creation timestamp
    TimeCreated,
    /// Planter reference id
    PlanterId,
    /// Planting organization id
    OrganizationId,
}

impl SortField {
    /// Qualified column name for the ORDER BY clause
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Id => "td.id",
            Self::TimeCreated => "td.time_created",
            Self::PlanterId => "td.planter_id",
            Self::OrganizationId => "td.planting_organization_id",
        }
    }
}

/// Sort direction for listing queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending (oldest/lowest first)
    #[default]
    Asc,
    /// Descending (newest/highest first)
    Desc,
}

impl SortOrder {
    /// SQL ORDER BY direction fragment
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Complete ordering directive; defaults to insertion/identity order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    /// Column to order by
    pub field: SortField,
    /// Direction
    pub order: SortOrder,
}

impl SortSpec {
    /// Create an ordering directive
    #[must_use]
    pub const fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

/// Midnight UTC at the start of the given calendar day
#[must_use]
pub fn day_start_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// The calendar day after the given one, saturating at the calendar maximum
#[must_use]
pub fn day_after(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_key_display() {
        assert_eq!(format!("{}", TreeKey::Id(192)), "id:192");
        let uuid = Uuid::parse_str("c48ebfc0-bbe4-4a3a-8cff-7e5f4ff12977").unwrap();
        assert_eq!(
            format!("{}", TreeKey::Uuid(uuid)),
            "uuid:c48ebfc0-bbe4-4a3a-8cff-7e5f4ff12977"
        );
    }

    #[test]
    fn test_needs_tag_join() {
        assert!(ListFilter::Tag("photoless".to_string()).needs_tag_join());
        assert!(!ListFilter::All.needs_tag_join());
        assert!(!ListFilter::Organization(11).needs_tag_join());
    }

    #[test]
    fn test_page_default() {
        let page = Page::default();
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_sort_field_columns() {
        assert_eq!(SortField::Id.column(), "td.id");
        assert_eq!(SortField::TimeCreated.column(), "td.time_created");
        assert_eq!(SortField::PlanterId.column(), "td.planter_id");
        assert_eq!(
            SortField::OrganizationId.column(),
            "td.planting_organization_id"
        );
    }

    #[test]
    fn test_sort_field_deserializes_snake_case() {
        let field: SortField = serde_json::from_str("\"time_created\"").unwrap();
        assert_eq!(field, SortField::TimeCreated);
    }

    #[test]
    fn test_sort_order_as_sql() {
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
        assert_eq!(SortOrder::Desc.as_sql(), "DESC");
    }

    #[test]
    fn test_sort_spec_default_is_identity_ascending() {
        let spec = SortSpec::default();
        assert_eq!(spec.field, SortField::Id);
        assert_eq!(spec.order, SortOrder::Asc);
    }

    #[test]
    fn test_day_start_utc() {
        let date = NaiveDate::from_ymd_opt(2022, 2, 23).unwrap();
        assert_eq!(day_start_utc(date).to_rfc3339(), "2022-02-23T00:00:00+00:00");
    }

    #[test]
    fn test_day_after_crosses_month_boundary() {
        let date = NaiveDate::from_ymd_opt(2022, 2, 28).unwrap();
        assert_eq!(day_after(date), NaiveDate::from_ymd_opt(2022, 3, 1).unwrap());
    }

    #[test]
    fn test_date_range_expansion_is_half_open() {
        // endDate is inclusive as a calendar day: the exclusive bound is the
        // start of the following day.
        let end = NaiveDate::from_ymd_opt(2022, 2, 24).unwrap();
        let exclusive = day_start_utc(day_after(end));
        assert_eq!(exclusive.to_rfc3339(), "2022-02-25T00:00:00+00:00");
    }
}
