//! Parameterized SQL composition for tree queries
//!
//! Every caller-supplied value is pushed as a bound parameter; the only text
//! spliced into a query is from closed, compile-time sets (join fragments and
//! the [`SortField`] column whitelist). Page queries carry the full enrichment
//! joins; count queries deliberately carry none beyond what the predicate
//! itself requires, since joins are dead weight for a `count(*)`.

use sqlx::{Postgres, QueryBuilder};

use crate::model::{COUNTRY_REGION_TYPE, FEATURED_TREES_CONFIG};
use crate::query::filter::{day_after, day_start_utc, ListFilter, Page, SortSpec, TreeKey};

/// Enriched select list: denormalized columns plus resolved reference fields
const ENRICHED_COLUMNS: &str = "td.id, td.uuid, td.lat, td.lon, td.species_id, \
     td.planting_organization_id AS organization_id, td.country_id, td.wallet_id, \
     td.time_created, td.active, td.planter_id, td.species AS species_name, \
     o.name AS organization_name, r.name AS country_name, \
     ts.\"desc\" AS species_desc, w.name AS wallet_name";

/// Base enriched query: the denormalized table with its four reference joins
///
/// The organization, species, and wallet joins are outer joins so a missing
/// reference degrades the display field to NULL. The region join is written as
/// an outer join too, but every caller constrains `r.type_id`, which makes it
/// an inner visibility constraint in practice.
fn enriched_base(tag_join: bool) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(ENRICHED_COLUMNS);
    qb.push(" FROM denormalized.trees_denormalized td");
    qb.push(" LEFT JOIN public.organizations o ON td.planting_organization_id = o.id");
    qb.push(" LEFT JOIN public.region r ON td.country_id = cast(r.metadata ->> 'id' AS integer)");
    qb.push(" LEFT JOIN public.tree_species ts ON ts.id = td.species_id");
    qb.push(" LEFT JOIN wallet.wallet w ON w.id = td.wallet_id");
    if tag_join {
        qb.push(" INNER JOIN public.tree_tag tt ON tt.tree_id = td.id");
        qb.push(" INNER JOIN public.tag t ON tt.tag_id = t.id");
    }
    qb
}

/// Identity lookup by id or uuid
///
/// Applies the valid-country constraint but not the active flag: soft-deleted
/// records remain reachable by direct identity lookup.
pub(crate) fn find_by_key(key: &TreeKey) -> QueryBuilder<'static, Postgres> {
    let mut qb = enriched_base(false);
    qb.push(" WHERE r.type_id = ");
    qb.push_bind(COUNTRY_REGION_TYPE);
    match key {
        TreeKey::Id(id) => {
            qb.push(" AND td.id = ");
            qb.push_bind(*id);
        }
        TreeKey::Uuid(uuid) => {
            qb.push(" AND td.uuid = ");
            qb.push_bind(*uuid);
        }
    }
    qb
}

/// One page of a filtered listing
pub(crate) fn list_page(
    filter: &ListFilter,
    sort: SortSpec,
    page: Page,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = enriched_base(filter.needs_tag_join());
    qb.push(" WHERE r.type_id = ");
    qb.push_bind(COUNTRY_REGION_TYPE);
    qb.push(" AND td.active = true");
    push_predicate(&mut qb, filter);
    qb.push(" ORDER BY ");
    qb.push(sort.field.column());
    qb.push(" ");
    qb.push(sort.order.as_sql());
    qb.push(" LIMIT ");
    qb.push_bind(page.limit);
    qb.push(" OFFSET ");
    qb.push_bind(page.offset);
    qb
}

/// Total match count for a filtered listing
///
/// No enrichment joins, no ordering, no pagination; only the tag association
/// is joined when the predicate needs it.
pub(crate) fn count_matches(filter: &ListFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT count(*) FROM denormalized.trees_denormalized td");
    if filter.needs_tag_join() {
        qb.push(" INNER JOIN public.tree_tag tt ON tt.tree_id = td.id");
        qb.push(" INNER JOIN public.tag t ON tt.tag_id = t.id");
    }
    qb.push(" WHERE td.active = true");
    push_predicate(&mut qb, filter);
    qb
}

/// The configured featured list
///
/// Joins against the id array stored under the well-known configuration name;
/// row order is whatever the join produces.
pub(crate) fn featured() -> QueryBuilder<'static, Postgres> {
    let mut qb = enriched_base(false);
    qb.push(
        " JOIN (SELECT json_array_elements(data -> 'trees') AS tree_id \
         FROM webmap.config WHERE name = ",
    );
    qb.push_bind(FEATURED_TREES_CONFIG);
    qb.push(") AS cfg ON cfg.tree_id::text::integer = td.id");
    qb.push(" WHERE r.type_id = ");
    qb.push_bind(COUNTRY_REGION_TYPE);
    qb
}

fn push_predicate(qb: &mut QueryBuilder<'static, Postgres>, filter: &ListFilter) {
    match filter {
        ListFilter::All => {}
        ListFilter::Organization(id) => {
            qb.push(" AND td.planting_organization_id = ");
            qb.push_bind(*id);
        }
        ListFilter::DateRange { start, end } => {
            qb.push(" AND td.time_created >= ");
            qb.push_bind(day_start_utc(*start));
            qb.push(" AND td.time_created < ");
            qb.push_bind(day_start_utc(day_after(*end)));
        }
        ListFilter::Tag(name) => {
            qb.push(" AND t.tag_name = ");
            qb.push_bind(name.clone());
        }
        ListFilter::Wallet(id) => {
            qb.push(" AND td.wallet_id = ");
            qb.push_bind(*id);
        }
        ListFilter::Planter(id) => {
            qb.push(" AND td.planter_id = ");
            qb.push_bind(*id);
        }
    }
}
