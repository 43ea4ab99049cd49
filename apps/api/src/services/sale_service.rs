//! Invoicing endpoints.
//!
//! Sale creation sends only products, quantities and the discount; every
//! amount in the response is computed server-side.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use shopbill_core::invoice::NewSale;
use shopbill_core::{InvoiceDocument, Money, SaleWithItems};
use shopbill_db::SaleFilter;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

/// Query string of `GET /sales`.
///
/// `from`/`to` are inclusive dates; `min_total`/`max_total` are decimal
/// amounts such as `250.00`.
#[derive(Debug, Default, Deserialize)]
pub struct SaleQuery {
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub min_total: Option<String>,
    pub max_total: Option<String>,
    pub limit: Option<i64>,
}

impl SaleQuery {
    fn into_filter(self) -> ApiResult<SaleFilter> {
        let amount = |value: Option<String>, field: &str| -> ApiResult<Option<i64>> {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| Money::parse_decimal_field(&v, field).map(|m| m.cents()))
                .transpose()
                .map_err(Into::into)
        };

        Ok(SaleFilter {
            min_total_cents: amount(self.min_total, "min_total")?,
            max_total_cents: amount(self.max_total, "max_total")?,
            search: self.search,
            from: self.from,
            to: self.to,
            limit: self.limit.filter(|l| *l > 0),
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SaleQuery>,
) -> ApiResult<Json<Vec<SaleWithItems>>> {
    let filter = query.into_filter()?;
    let sales = state.db.sales().list(user.id(), &filter).await?;
    Ok(Json(sales))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<NewSale>,
) -> ApiResult<(StatusCode, Json<SaleWithItems>)> {
    let sale = state.db.sales().create(user.id(), input).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleWithItems>> {
    let sale = state.db.sales().get(user.id(), &id).await?;
    Ok(Json(sale))
}

/// Items go with the sale. Stock is not restored.
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.sales().delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /sales/{id}/document`: the bundle an external renderer prints.
pub async fn document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceDocument>> {
    let document = state.db.sales().document(user.id(), &id).await?;
    Ok(Json(document))
}
