use std::sync::Arc;

use axum::{Json, Router, extract::Extension, routing::get};

use cardhub_core::EmployeeId;

use crate::app::dto::{
    EmployeeListResponse, EmployeeProfileResponse, EmployeeQuery, EmployeeResponse,
};
use crate::app::errors::{ApiError, PathParam, QueryParams};
use crate::app::services::AppServices;
use crate::context::Caller;

pub fn router() -> Router {
    Router::new()
        .route("/v1/employees", get(list_employees))
        .route("/v1/employees/me/profile", get(my_profile))
        .route("/v1/employees/:id", get(get_employee))
}

pub async fn list_employees(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    QueryParams(query): QueryParams<EmployeeQuery>,
) -> Result<Json<EmployeeListResponse>, ApiError> {
    let page = services
        .employees
        .list_employees(
            &claims,
            &query.filter(),
            query.page_size,
            query.page_token.as_deref(),
        )
        .await?;
    Ok(Json(page.into()))
}

pub async fn get_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
    PathParam(id): PathParam<i64>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    let employee = services
        .employees
        .get_employee(&claims, EmployeeId::new(id))
        .await?;
    Ok(Json(EmployeeResponse { employee }))
}

pub async fn my_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(claims): Caller,
) -> Result<Json<EmployeeProfileResponse>, ApiError> {
    let employee_profile = services.employees.my_profile(&claims).await?;
    Ok(Json(EmployeeProfileResponse { employee_profile }))
}
