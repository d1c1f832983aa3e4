//! HTTP handlers for stock audit management

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::audit::{
    AuditDetail, AuditDetailQuery, AuditService, CreateAuditInput,
};
use crate::AppState;
use shared::{BatchUpdateRequest, Pagination, PaginatedResponse, StockAudit};

/// Response for audit creation
#[derive(Debug, Serialize)]
pub struct CreateAuditResponse {
    pub audit: StockAudit,
    pub items_count: u64,
}

/// Create an audit and snapshot its item set
pub async fn create_audit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateAuditInput>,
) -> AppResult<Json<CreateAuditResponse>> {
    if !current_user.0.has_permission("audit", "manage") {
        return Err(AppError::InsufficientPermissions);
    }

    let service = AuditService::new(state.db);
    let (audit, items_count) = service.create_audit(current_user.0.user_id, input).await?;
    Ok(Json(CreateAuditResponse { audit, items_count }))
}

/// Query parameters for the audit listing
#[derive(Debug, Deserialize)]
pub struct ListAuditsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// List audits
pub async fn list_audits(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListAuditsQuery>,
) -> AppResult<Json<PaginatedResponse<StockAudit>>> {
    let service = AuditService::new(state.db);
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.page_size.unwrap_or(20),
    };
    let audits = service.list_audits(pagination).await?;
    Ok(Json(audits))
}

/// One page of audit items plus whole-audit stats
pub async fn get_audit_detail(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(audit_id): Path<Uuid>,
    Query(query): Query<AuditDetailQuery>,
) -> AppResult<Json<AuditDetail>> {
    let service = AuditService::new(state.db);
    let detail = service.get_audit_detail(audit_id, query).await?;
    Ok(Json(detail))
}

/// Response for batch item updates
#[derive(Debug, Serialize)]
pub struct BatchUpdateResponse {
    pub updated_count: u64,
}

/// Apply a committed edit buffer to audit items in one call
pub async fn update_audit_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(audit_id): Path<Uuid>,
    Json(request): Json<BatchUpdateRequest>,
) -> AppResult<Json<BatchUpdateResponse>> {
    if !current_user.0.has_permission("audit", "manage") {
        return Err(AppError::InsufficientPermissions);
    }

    let service = AuditService::new(state.db);
    let updated_count = service.commit_batch(audit_id, request).await?;
    Ok(Json(BatchUpdateResponse { updated_count }))
}

/// Input for completing an audit
#[derive(Debug, Deserialize)]
pub struct CompleteAuditInput {
    pub apply_differences: bool,
}

/// Response for audit completion
#[derive(Debug, Serialize)]
pub struct CompleteAuditResponse {
    pub applied_count: u64,
}

/// Complete an audit, optionally applying counted differences
pub async fn complete_audit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(audit_id): Path<Uuid>,
    Json(input): Json<CompleteAuditInput>,
) -> AppResult<Json<CompleteAuditResponse>> {
    if !current_user.0.has_permission("audit", "manage") {
        return Err(AppError::InsufficientPermissions);
    }

    let service = AuditService::new(state.db);
    let applied_count = service
        .complete(current_user.0.user_id, audit_id, input.apply_differences)
        .await?;
    Ok(Json(CompleteAuditResponse { applied_count }))
}

/// Delete an in-progress audit
pub async fn delete_audit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(audit_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    if !current_user.0.has_permission("audit", "manage") {
        return Err(AppError::InsufficientPermissions);
    }

    let service = AuditService::new(state.db);
    service.delete_audit(audit_id).await?;
    Ok(Json(()))
}
