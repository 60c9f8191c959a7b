//! Employee endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use orgtree_core::{CreateEmployeeRequest, EmployeeResponse, EmployeeService};

use super::{department_repo, employee_repo, json_body, parse_id};
use crate::{ApiError, ApiResult, AppState};

/// `POST /departments/{id}/employees`
pub async fn create_employee(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EmployeeResponse>)> {
    const OP: &str = "create_employee";
    let department_id = parse_id(OP, &raw_id)?;
    let request = json_body(OP, body)?;

    let created = state
        .with_conn(OP, move |conn| {
            EmployeeService::new(department_repo(OP, conn)?, employee_repo(OP, conn)?)
                .create_employee(department_id, &request)
                .map_err(ApiError::employee(OP))
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}
