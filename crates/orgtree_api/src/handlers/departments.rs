//! Department endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use orgtree_core::{
    CreateDepartmentRequest, DeleteDepartmentRequest, DeleteMode, DepartmentChanges,
    DepartmentResponse, DepartmentService, GetDepartmentQuery, DEFAULT_DEPTH,
};
use serde::Deserialize;

use super::{department_repo, json_body, parse_id};
use crate::{ApiError, ApiResult, AppState};

/// Raw query of `GET /departments/{id}`. Kept as strings so malformed values
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct GetDepartmentParams {
    pub depth: Option<String>,
    pub include_employees: Option<String>,
}

impl GetDepartmentParams {
    /// Missing, unparsable or non-positive depth reads as 1. Only the
    /// literal `false` disables employees.
    pub fn into_query(self) -> GetDepartmentQuery {
        let depth = self
            .depth
            .as_deref()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|depth| *depth > 0)
            .unwrap_or(DEFAULT_DEPTH);
        GetDepartmentQuery {
            depth,
            include_employees: self.include_employees.as_deref() != Some("false"),
        }
    }
}

/// Raw query of `DELETE /departments/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteDepartmentParams {
    pub mode: Option<String>,
    pub reassign_to_department_id: Option<String>,
}

impl DeleteDepartmentParams {
    pub fn into_request(self, op: &'static str) -> ApiResult<DeleteDepartmentRequest> {
        let mode = match self.mode.as_deref() {
            None | Some("") => DeleteMode::Cascade,
            Some(raw) => DeleteMode::parse(raw).ok_or_else(|| {
                ApiError::invalid_request(
                    op,
                    format!("unknown delete mode `{raw}`, expected cascade or reassign"),
                )
            })?,
        };

        // An unparsable target reads as missing; the service rejects it.
        let reassign_to_id = match mode {
            DeleteMode::Reassign => self
                .reassign_to_department_id
                .as_deref()
                .and_then(|value| value.trim().parse().ok()),
            DeleteMode::Cascade => None,
        };

        Ok(DeleteDepartmentRequest {
            mode,
            reassign_to_id,
        })
    }
}

/// `POST /departments`
pub async fn create_department(
    State(state): State<AppState>,
    body: Result<Json<CreateDepartmentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DepartmentResponse>)> {
    const OP: &str = "create_department";
    let request = json_body(OP, body)?;

    let created = state
        .with_conn(OP, move |conn| {
            DepartmentService::new(department_repo(OP, conn)?)
                .create_department(&request)
                .map_err(ApiError::department(OP))
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /departments/{id}?depth=&include_employees=`
pub async fn get_department(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<GetDepartmentParams>,
) -> ApiResult<Json<DepartmentResponse>> {
    const OP: &str = "get_department";
    let id = parse_id(OP, &raw_id)?;
    let query = params.into_query();

    let department = state
        .with_conn(OP, move |conn| {
            DepartmentService::new(department_repo(OP, conn)?)
                .get_department(id, query)
                .map_err(ApiError::department(OP))
        })
        .await?;

    Ok(Json(department))
}

/// `PATCH /departments/{id}`
pub async fn update_department(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<DepartmentChanges>, JsonRejection>,
) -> ApiResult<Json<DepartmentResponse>> {
    const OP: &str = "update_department";
    let id = parse_id(OP, &raw_id)?;
    let changes = json_body(OP, body)?;

    let updated = state
        .with_conn(OP, move |conn| {
            DepartmentService::new(department_repo(OP, conn)?)
                .update_department(id, &changes)
                .map_err(ApiError::department(OP))
        })
        .await?;

    Ok(Json(updated))
}

/// `DELETE /departments/{id}?mode=&reassign_to_department_id=`
pub async fn delete_department(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<DeleteDepartmentParams>,
) -> ApiResult<StatusCode> {
    const OP: &str = "delete_department";
    let id = parse_id(OP, &raw_id)?;
    let request = params.into_request(OP)?;

    state
        .with_conn(OP, move |conn| {
            DepartmentService::new(department_repo(OP, conn)?)
                .delete_department(id, request)
                .map_err(ApiError::department(OP))
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
