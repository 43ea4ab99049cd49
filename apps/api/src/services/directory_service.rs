//! Customer and vendor directory endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shopbill_core::directory::{
    Customer, CustomerInput, CustomerType, RecordStatus, StatusChange, Vendor, VendorInput,
    VendorType,
};
use shopbill_db::{CustomerFilter, VendorFilter};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub search: Option<String>,
    #[serde(alias = "customerType")]
    pub customer_type: Option<CustomerType>,
    pub status: Option<RecordStatus>,
    pub country: Option<String>,
}

pub async fn list_customers(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(q): Query<CustomerQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    let filter = CustomerFilter {
        search: q.search,
        customer_type: q.customer_type,
        status: q.status,
        country: q.country,
    };
    let customers = state.db.customers().list(user.id(), &filter).await?;
    Ok(Json(customers))
}

pub async fn create_customer(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CustomerInput>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().create(user.id(), input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().get(user.id(), &id).await?))
}

pub async fn update_customer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<Json<Customer>> {
    let customer = state.db.customers().update(user.id(), &id, input).await?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.customers().delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_customer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    let customer = state
        .db
        .customers()
        .set_status(user.id(), &id, RecordStatus::Active, None)
        .await?;
    Ok(Json(customer))
}

pub async fn deactivate_customer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    let customer = state
        .db
        .customers()
        .set_status(user.id(), &id, RecordStatus::Inactive, None)
        .await?;
    Ok(Json(customer))
}

/// `POST /customers/{id}/set_status` with an optional reason.
pub async fn set_customer_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Json<Customer>> {
    let customer = state
        .db
        .customers()
        .set_status(user.id(), &id, change.status, change.reason.as_deref())
        .await?;
    Ok(Json(customer))
}

// =============================================================================
// Vendors
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct VendorQuery {
    pub search: Option<String>,
    pub vendor_type: Option<VendorType>,
    pub status: Option<RecordStatus>,
    pub country: Option<String>,
}

pub async fn list_vendors(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(q): Query<VendorQuery>,
) -> ApiResult<Json<Vec<Vendor>>> {
    let filter = VendorFilter {
        search: q.search,
        vendor_type: q.vendor_type,
        status: q.status,
        country: q.country,
    };
    let vendors = state.db.vendors().list(user.id(), &filter).await?;
    Ok(Json(vendors))
}

pub async fn create_vendor(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<VendorInput>,
) -> ApiResult<(StatusCode, Json<Vendor>)> {
    let vendor = state.db.vendors().create(user.id(), input).await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

pub async fn get_vendor(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vendor>> {
    Ok(Json(state.db.vendors().get(user.id(), &id).await?))
}

pub async fn update_vendor(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<VendorInput>,
) -> ApiResult<Json<Vendor>> {
    let vendor = state.db.vendors().update(user.id(), &id, input).await?;
    Ok(Json(vendor))
}

pub async fn delete_vendor(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.vendors().delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_vendor(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vendor>> {
    Ok(Json(state.db.vendors().activate(user.id(), &id).await?))
}
