//! Query engine: single entry point for all tree queries
//!
//! The engine dispatches a [`TreeQuery`] to exactly one operation based on
//! its filter variant: identity lookup, filtered listing, or the featured
//! list. A listing that also wants its total issues the page and count as two
//! independent round trips, raced concurrently; they are read-only and the
//! engine makes no attempt to keep them transactionally consistent.

use crate::error::{Error, Result};
use crate::model::{Tree, TREES_TABLE};
use crate::query::filter::{ListFilter, Page, SortSpec, TreeFilter, TreeKey};
use crate::query::reader::{FeaturedReader, FilteredReader};

/// A complete query: one filter plus listing parameters
///
/// `page`, `sort`, and `include_total` only apply to listing filters;
/// identity and featured queries ignore them.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeQuery {
    /// The single discriminating criterion
    pub filter: TreeFilter,
    /// Pagination bounds for listing filters
    pub page: Page,
    /// Ordering directive for listing filters
    pub sort: SortSpec,
    /// Whether to also compute the total match count
    pub include_total: bool,
}

impl TreeQuery {
    /// Identity lookup by id or uuid
    #[must_use]
    pub fn by_key(key: TreeKey) -> Self {
        Self {
            filter: TreeFilter::Key(key),
            page: Page::default(),
            sort: SortSpec::default(),
            include_total: false,
        }
    }

    /// Filtered listing with a total count
    #[must_use]
    pub fn listing(filter: ListFilter, sort: SortSpec, page: Page) -> Self {
        Self {
            filter: TreeFilter::List(filter),
            page,
            sort,
            include_total: true,
        }
    }

    /// The featured list
    #[must_use]
    pub fn featured() -> Self {
        Self {
            filter: TreeFilter::Featured,
            page: Page::default(),
            sort: SortSpec::default(),
            include_total: false,
        }
    }

    /// Skip the count round trip
    #[must_use]
    pub fn without_total(mut self) -> Self {
        self.include_total = false;
        self
    }
}

/// Result of executing a [`TreeQuery`]
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Identity lookup result
    Single(Tree),
    /// Listing result; `total` is present only when it was requested
    Listing {
        /// One page of matching records
        trees: Vec<Tree>,
        /// Exact total match count, independent of pagination
        total: Option<u64>,
    },
}

/// The filtered-query engine
///
/// Generic over the reader so the dispatch and count/page semantics can be
/// exercised against an in-memory reader in tests.
#[derive(Debug, Clone)]
pub struct QueryEngine<R> {
    reader: R,
}

impl<R> QueryEngine<R>
where
    R: FilteredReader<TreeKey, Tree, ListFilter> + FeaturedReader<Tree>,
{
    /// Create an engine over the given reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Execute a query, dispatching on its filter variant
    pub async fn execute(&self, query: TreeQuery) -> Result<QueryOutcome> {
        match query.filter {
            TreeFilter::Key(key) => {
                let tree = self
                    .reader
                    .find(&key)
                    .await?
                    .ok_or_else(|| Error::not_found(TREES_TABLE, key.to_string()))?;
                Ok(QueryOutcome::Single(tree))
            }
            TreeFilter::List(ref filter) => {
                if query.include_total {
                    let (trees, total) = tokio::try_join!(
                        self.reader.list(filter, query.sort, query.page),
                        self.reader.count(filter),
                    )?;
                    Ok(QueryOutcome::Listing {
                        trees,
                        total: Some(total),
                    })
                } else {
                    let trees = self.reader.list(filter, query.sort, query.page).await?;
                    Ok(QueryOutcome::Listing { trees, total: None })
                }
            }
            TreeFilter::Featured => {
                let trees = self.reader.featured().await?;
                Ok(QueryOutcome::Listing { trees, total: None })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::{SortField, SortOrder};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::HashMap;
    use uuid::Uuid;

    /// In-memory reader mirroring the store semantics: listing predicates
    /// require the active flag, identity lookups do not.
    struct MemReader {
        trees: Vec<Tree>,
        tags: HashMap<String, Vec<i64>>,
        featured_ids: Vec<i64>,
    }

    impl MemReader {
        fn matches(&self, tree: &Tree, filter: &ListFilter) -> bool {
            if !tree.active {
                return false;
            }
            match filter {
                ListFilter::All => true,
                ListFilter::Organization(id) => tree.organization_id == Some(*id),
                ListFilter::DateRange { start, end } => {
                    let lo = crate::query::filter::day_start_utc(*start);
                    let hi = crate::query::filter::day_start_utc(
                        crate::query::filter::day_after(*end),
                    );
                    tree.time_created >= lo && tree.time_created < hi
                }
                ListFilter::Tag(name) => self
                    .tags
                    .get(name)
                    .is_some_and(|ids| ids.contains(&tree.id)),
                ListFilter::Wallet(id) => tree.wallet_id == Some(*id),
                ListFilter::Planter(id) => tree.planter_id == Some(*id),
            }
        }
    }

    impl FilteredReader<TreeKey, Tree, ListFilter> for MemReader {
        async fn find(&self, key: &TreeKey) -> Result<Option<Tree>> {
            Ok(self
                .trees
                .iter()
                .find(|t| match key {
                    TreeKey::Id(id) => t.id == *id,
                    TreeKey::Uuid(uuid) => t.uuid == *uuid,
                })
                .cloned())
        }

        async fn list(
            &self,
            filter: &ListFilter,
            sort: SortSpec,
            page: Page,
        ) -> Result<Vec<Tree>> {
            let mut matched: Vec<Tree> = self
                .trees
                .iter()
                .filter(|t| self.matches(t, filter))
                .cloned()
                .collect();
            matched.sort_by_key(|t| t.id);
            if sort.order == SortOrder::Desc {
                matched.reverse();
            }
            Ok(matched
                .into_iter()
                .skip(page.offset as usize)
                .take(page.limit as usize)
                .collect())
        }

        async fn count(&self, filter: &ListFilter) -> Result<u64> {
            Ok(self.trees.iter().filter(|t| self.matches(t, filter)).count() as u64)
        }
    }

    impl FeaturedReader<Tree> for MemReader {
        async fn featured(&self) -> Result<Vec<Tree>> {
            Ok(self
                .trees
                .iter()
                .filter(|t| self.featured_ids.contains(&t.id))
                .cloned()
                .collect())
        }
    }

    fn tree(id: i64, org: i64, day: u32, active: bool) -> Tree {
        Tree {
            id,
            uuid: Uuid::new_v4(),
            lat: Some(0.0),
            lon: Some(0.0),
            species_id: Some(4),
            organization_id: Some(org),
            country_id: Some(230),
            wallet_id: None,
            time_created: Utc.with_ymd_and_hms(2022, 2, day, 12, 0, 0).unwrap(),
            active,
            planter_id: Some(5840),
            species_name: Some("species_name_3".to_string()),
            organization_name: Some("ISAP".to_string()),
            country_name: Some("Sierra Leone".to_string()),
            species_desc: None,
            wallet_name: None,
        }
    }

    fn engine() -> QueryEngine<MemReader> {
        let trees = vec![
            tree(171, 11, 20, true),
            tree(192, 13, 23, true),
            tree(238, 11, 23, true),
            tree(270, 5, 24, true),
            tree(300, 11, 25, false), // soft-deleted
        ];
        let mut tags = HashMap::new();
        tags.insert("photoless".to_string(), vec![238]);
        QueryEngine::new(MemReader {
            trees,
            tags,
            featured_ids: vec![171, 192, 270],
        })
    }

    #[tokio::test]
    async fn test_lookup_by_id() {
        let outcome = engine()
            .execute(TreeQuery::by_key(TreeKey::Id(192)))
            .await
            .unwrap();
        match outcome {
            QueryOutcome::Single(tree) => {
                assert_eq!(tree.id, 192);
                assert_eq!(tree.organization_id, Some(13));
                assert_eq!(tree.species_id, Some(4));
            }
            other => panic!("expected single record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_missing_id_is_not_found() {
        let err = engine()
            .execute(TreeQuery::by_key(TreeKey::Id(999)))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can not find denormalized.trees_denormalized by id:999"
        );
    }

    #[tokio::test]
    async fn test_lookup_by_uuid_matches_lookup_by_id() {
        let eng = engine();
        let by_id = eng.execute(TreeQuery::by_key(TreeKey::Id(238))).await.unwrap();
        let QueryOutcome::Single(expected) = by_id else {
            panic!("expected single record");
        };
        let by_uuid = eng
            .execute(TreeQuery::by_key(TreeKey::Uuid(expected.uuid)))
            .await
            .unwrap();
        assert_eq!(by_uuid, QueryOutcome::Single(expected));
    }

    #[tokio::test]
    async fn test_identity_lookup_sees_inactive_records() {
        let outcome = engine()
            .execute(TreeQuery::by_key(TreeKey::Id(300)))
            .await
            .unwrap();
        let QueryOutcome::Single(tree) = outcome else {
            panic!("expected single record");
        };
        assert!(!tree.active);
    }

    #[tokio::test]
    async fn test_listing_excludes_inactive_records() {
        let outcome = engine()
            .execute(TreeQuery::listing(
                ListFilter::Organization(11),
                SortSpec::default(),
                Page::default(),
            ))
            .await
            .unwrap();
        let QueryOutcome::Listing { trees, total } = outcome else {
            panic!("expected listing");
        };
        assert_eq!(trees.iter().map(|t| t.id).collect::<Vec<_>>(), vec![171, 238]);
        assert_eq!(total, Some(2));
    }

    #[tokio::test]
    async fn test_total_is_independent_of_pagination() {
        let outcome = engine()
            .execute(TreeQuery::listing(
                ListFilter::Organization(11),
                SortSpec::default(),
                Page::new(1, 0),
            ))
            .await
            .unwrap();
        let QueryOutcome::Listing { trees, total } = outcome else {
            panic!("expected listing");
        };
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].organization_id, Some(11));
        assert_eq!(total, Some(2));
    }

    #[tokio::test]
    async fn test_total_omitted_when_not_requested() {
        let outcome = engine()
            .execute(
                TreeQuery::listing(ListFilter::All, SortSpec::default(), Page::default())
                    .without_total(),
            )
            .await
            .unwrap();
        let QueryOutcome::Listing { total, .. } = outcome else {
            panic!("expected listing");
        };
        assert_eq!(total, None);
    }

    #[tokio::test]
    async fn test_count_with_no_matches_is_zero_not_error() {
        let outcome = engine()
            .execute(TreeQuery::listing(
                ListFilter::Organization(9999),
                SortSpec::default(),
                Page::default(),
            ))
            .await
            .unwrap();
        let QueryOutcome::Listing { trees, total } = outcome else {
            panic!("expected listing");
        };
        assert!(trees.is_empty());
        assert_eq!(total, Some(0));
    }

    #[tokio::test]
    async fn test_date_range_bounds_are_half_open() {
        let outcome = engine()
            .execute(TreeQuery::listing(
                ListFilter::DateRange {
                    start: NaiveDate::from_ymd_opt(2022, 2, 23).unwrap(),
                    end: NaiveDate::from_ymd_opt(2022, 2, 23).unwrap(),
                },
                SortSpec::default(),
                Page::default(),
            ))
            .await
            .unwrap();
        let QueryOutcome::Listing { trees, total } = outcome else {
            panic!("expected listing");
        };
        // only the two records created on the 23rd; the 24th is excluded
        assert_eq!(trees.iter().map(|t| t.id).collect::<Vec<_>>(), vec![192, 238]);
        assert_eq!(total, Some(2));
    }

    #[tokio::test]
    async fn test_tag_filter_is_exact() {
        let eng = engine();
        let outcome = eng
            .execute(TreeQuery::listing(
                ListFilter::Tag("photoless".to_string()),
                SortSpec::default(),
                Page::default(),
            ))
            .await
            .unwrap();
        let QueryOutcome::Listing { trees, total } = outcome else {
            panic!("expected listing");
        };
        assert_eq!(trees.iter().map(|t| t.id).collect::<Vec<_>>(), vec![238]);
        assert_eq!(total, Some(1));

        // a similar but non-identical tag matches nothing
        let outcome = eng
            .execute(TreeQuery::listing(
                ListFilter::Tag("photo".to_string()),
                SortSpec::default(),
                Page::default(),
            ))
            .await
            .unwrap();
        let QueryOutcome::Listing { trees, total } = outcome else {
            panic!("expected listing");
        };
        assert!(trees.is_empty());
        assert_eq!(total, Some(0));
    }

    #[tokio::test]
    async fn test_pagination_is_stable_and_exhaustive() {
        let eng = engine();
        let full = eng
            .execute(
                TreeQuery::listing(ListFilter::All, SortSpec::default(), Page::new(100, 0))
                    .without_total(),
            )
            .await
            .unwrap();
        let QueryOutcome::Listing { trees: all, .. } = full else {
            panic!("expected listing");
        };

        let mut paged: Vec<Tree> = Vec::new();
        let mut offset = 0;
        loop {
            let outcome = eng
                .execute(
                    TreeQuery::listing(ListFilter::All, SortSpec::default(), Page::new(2, offset))
                        .without_total(),
                )
                .await
                .unwrap();
            let QueryOutcome::Listing { trees, .. } = outcome else {
                panic!("expected listing");
            };
            if trees.is_empty() {
                break;
            }
            paged.extend(trees);
            offset += 2;
        }
        assert_eq!(paged, all);
    }

    #[tokio::test]
    async fn test_descending_sort() {
        let outcome = engine()
            .execute(TreeQuery::listing(
                ListFilter::Planter(5840),
                SortSpec::new(SortField::Id, SortOrder::Desc),
                Page::new(1, 0),
            ))
            .await
            .unwrap();
        let QueryOutcome::Listing { trees, .. } = outcome else {
            panic!("expected listing");
        };
        assert_eq!(trees[0].id, 270);
    }

    #[tokio::test]
    async fn test_featured_returns_configured_records() {
        let outcome = engine().execute(TreeQuery::featured()).await.unwrap();
        let QueryOutcome::Listing { trees, total } = outcome else {
            panic!("expected listing");
        };
        assert_eq!(trees.len(), 3);
        assert!(trees.iter().all(|t| t.id > 0));
        assert_eq!(total, None);
    }
}
