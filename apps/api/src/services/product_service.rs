//! Catalog endpoints. Every product read carries its expiry label and low
//! stock flag for today.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shopbill_core::catalog::{ExpiryFilter, NewProduct, ProductUpdate};
use shopbill_core::ProductView;
use shopbill_db::ProductFilter;

use super::today;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

/// Query string of `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub is_active: Option<bool>,
    pub expiry: Option<ExpiryFilter>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(q: ProductQuery) -> Self {
        ProductFilter {
            search: q.search,
            category: q.category,
            unit: q.unit,
            is_active: q.is_active,
            expiry: q.expiry,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<ProductView>>> {
    let filter = ProductFilter::from(query);
    let products = state.db.products().list(user.id(), &filter, today()).await?;
    Ok(Json(products))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<ProductView>)> {
    let product = state.db.products().create(user.id(), input).await?;
    Ok((StatusCode::CREATED, Json(product.into_view(today()))))
}

pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductView>> {
    let product = state.db.products().get(user.id(), &id).await?;
    Ok(Json(product.into_view(today())))
}

/// `PUT /products/{id}`: absent fields are kept; the code never changes.
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> ApiResult<Json<ProductView>> {
    let product = state.db.products().update(user.id(), &id, update).await?;
    Ok(Json(product.into_view(today())))
}

/// Refused with 409 while a sale references the product.
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
