//! HTTP handlers for the tree query endpoints
//!
//! Query parameters map one-to-one onto the filter dimensions. Exactly one
//! dimension may be supplied per request; combining them is rejected with a
//! 400 rather than silently picking a winner.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::Tree;
use crate::query::{
    ListFilter, Page, QueryOutcome, SortField, SortOrder, SortSpec, TreeKey, TreeQuery,
};
use crate::state::AppState;

/// Routes served by this module
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trees", get(list_trees))
        .route("/trees/featured", get(featured_trees))
        .route("/trees/{reference}", get(get_tree))
}

/// Query parameters accepted by `GET /trees`
#[derive(Debug, Default, Deserialize)]
pub struct ListTreesParams {
    pub organization_id: Option<i64>,
    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "endDate")]
    pub end_date: Option<NaiveDate>,
    pub tag: Option<String>,
    pub wallet_id: Option<Uuid>,
    pub planter_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Option<SortField>,
    pub desc: Option<bool>,
}

/// Listing response body; `total` is omitted when it was not computed
#[derive(Debug, Serialize)]
pub struct TreesResponse {
    pub trees: Vec<Tree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

async fn list_trees(
    State(state): State<AppState>,
    Query(params): Query<ListTreesParams>,
) -> Result<Json<TreesResponse>> {
    let filter = resolve_filter(&params)?;
    let page = resolve_page(&params, state.config.query.default_limit)?;
    let sort = resolve_sort(&params);

    let outcome = state
        .engine()
        .execute(TreeQuery::listing(filter, sort, page))
        .await?;
    match outcome {
        QueryOutcome::Listing { trees, total } => Ok(Json(TreesResponse { trees, total })),
        QueryOutcome::Single(_) => Err(Error::Internal(
            "listing query produced a single record".to_string(),
        )),
    }
}

async fn featured_trees(State(state): State<AppState>) -> Result<Json<TreesResponse>> {
    let outcome = state.engine().execute(TreeQuery::featured()).await?;
    match outcome {
        QueryOutcome::Listing { trees, total } => Ok(Json(TreesResponse { trees, total })),
        QueryOutcome::Single(_) => Err(Error::Internal(
            "featured query produced a single record".to_string(),
        )),
    }
}

async fn get_tree(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Tree>> {
    let key = parse_reference(&reference)?;
    let outcome = state.engine().execute(TreeQuery::by_key(key)).await?;
    match outcome {
        QueryOutcome::Single(tree) => Ok(Json(tree)),
        QueryOutcome::Listing { .. } => Err(Error::Internal(
            "identity query produced a listing".to_string(),
        )),
    }
}

/// Interpret a path segment as a numeric id first, then as a uuid
fn parse_reference(reference: &str) -> Result<TreeKey> {
    if let Ok(id) = reference.parse::<i64>() {
        return Ok(TreeKey::Id(id));
    }
    match reference.parse::<Uuid>() {
        Ok(uuid) => Ok(TreeKey::Uuid(uuid)),
        Err(_) => Err(Error::InvalidFilter(format!(
            "tree reference must be a numeric id or a uuid, got '{reference}'"
        ))),
    }
}

/// Map listing parameters onto exactly one filter dimension
fn resolve_filter(params: &ListTreesParams) -> Result<ListFilter> {
    let date_range = match (params.start_date, params.end_date) {
        (Some(start), Some(end)) => {
            if start > end {
                return Err(Error::InvalidFilter(format!(
                    "startDate {start} is after endDate {end}"
                )));
            }
            Some(ListFilter::DateRange { start, end })
        }
        (None, None) => None,
        (Some(_), None) => {
            return Err(Error::InvalidFilter(
                "startDate requires endDate".to_string(),
            ))
        }
        (None, Some(_)) => {
            return Err(Error::InvalidFilter(
                "endDate requires startDate".to_string(),
            ))
        }
    };

    let mut filters: Vec<ListFilter> = Vec::new();
    if let Some(id) = params.organization_id {
        filters.push(ListFilter::Organization(id));
    }
    if let Some(range) = date_range {
        filters.push(range);
    }
    if let Some(ref tag) = params.tag {
        if tag.is_empty() {
            return Err(Error::InvalidFilter("tag must not be empty".to_string()));
        }
        filters.push(ListFilter::Tag(tag.clone()));
    }
    if let Some(wallet) = params.wallet_id {
        filters.push(ListFilter::Wallet(wallet));
    }
    if let Some(planter) = params.planter_id {
        filters.push(ListFilter::Planter(planter));
    }

    match filters.len() {
        0 => Ok(ListFilter::All),
        1 => Ok(filters.remove(0)),
        n => Err(Error::InvalidFilter(format!(
            "expected at most one filter dimension, got {n}"
        ))),
    }
}

fn resolve_page(params: &ListTreesParams, default_limit: i64) -> Result<Page> {
    let limit = params.limit.unwrap_or(default_limit);
    if limit < 1 {
        return Err(Error::InvalidFilter(format!(
            "limit must be at least 1, got {limit}"
        )));
    }
    let offset = params.offset.unwrap_or(0);
    if offset < 0 {
        return Err(Error::InvalidFilter(format!(
            "offset must not be negative, got {offset}"
        )));
    }
    Ok(Page::new(limit, offset))
}

fn resolve_sort(params: &ListTreesParams) -> SortSpec {
    let field = params.order_by.unwrap_or(SortField::Id);
    let order = if params.desc.unwrap_or(false) {
        SortOrder::Desc
    } else {
        SortOrder::Asc
    };
    SortSpec::new(field, order)
}
