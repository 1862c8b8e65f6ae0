use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::AccountIdentity,
    models::{
        common::{HistoryQuery, SuccessResponse},
        placement::{
            BumpLogView, BumpNowData, PlacementAction, PlacementActionRequest, PlacementSummary,
            PurchaseData, PurchaseRequest, ScheduleData, ScheduleEntryView,
        },
    },
};

/// POST /api/v1/purchases
#[instrument(skip(state, identity, request), fields(account_id = %identity.account_id))]
pub async fn create_purchase(
    State(state): State<AppState>,
    identity: AccountIdentity,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<PurchaseData>>)> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let receipt = state
        .purchase_service
        .purchase(
            identity.account_id,
            request.listing_id,
            &request.product_code,
            request.days,
            OffsetDateTime::now_utc(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(PurchaseData {
            purchase_id: receipt.purchase.id,
            listing_id: receipt.purchase.listing_id,
            expires_at: receipt.purchase.expires_at,
            credits_spent: receipt.purchase.credits_spent,
            balance: receipt.balance,
            scheduled_bumps: receipt.scheduled_bumps,
        })),
    ))
}

/// POST /api/v1/listings/{listing_id}/bump
#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn bump_now(
    State(state): State<AppState>,
    identity: AccountIdentity,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<BumpNowData>>> {
    let receipt = state
        .bump_service
        .bump_now(listing_id, identity.account_id, OffsetDateTime::now_utc())
        .await?;

    Ok(Json(SuccessResponse::new(BumpNowData {
        bumped_at: receipt.bumped_at,
        window: receipt.window,
    })))
}

/// GET /api/v1/listings/{listing_id}/schedule
#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn get_schedule(
    State(state): State<AppState>,
    identity: AccountIdentity,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<ScheduleData>>> {
    let overview = state
        .schedule_service
        .upcoming(listing_id, identity.account_id, OffsetDateTime::now_utc())
        .await?;

    Ok(Json(SuccessResponse::new(ScheduleData {
        placement: PlacementSummary::from(overview.purchase),
        bumps_today: overview.bumps_today,
        pending_today: overview.pending_today,
        entries: overview
            .entries
            .into_iter()
            .map(ScheduleEntryView::from)
            .collect(),
    })))
}

/// PATCH /api/v1/listings/{listing_id}/placement
#[instrument(skip(state, identity, request), fields(account_id = %identity.account_id))]
pub async fn update_placement(
    State(state): State<AppState>,
    identity: AccountIdentity,
    Path(listing_id): Path<Uuid>,
    Json(request): Json<PlacementActionRequest>,
) -> Result<Json<SuccessResponse<PlacementSummary>>> {
    let now = OffsetDateTime::now_utc();
    let purchase = match request.action {
        PlacementAction::Pause => {
            state
                .purchase_service
                .pause(listing_id, identity.account_id, now)
                .await?
        }
        PlacementAction::Resume => {
            state
                .purchase_service
                .resume(listing_id, identity.account_id, now)
                .await?
        }
    };

    Ok(Json(SuccessResponse::new(PlacementSummary::from(purchase))))
}

/// GET /api/v1/listings/{listing_id}/bump-history
#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn bump_history(
    State(state): State<AppState>,
    identity: AccountIdentity,
    Path(listing_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<SuccessResponse<Vec<BumpLogView>>>> {
    let logs = state
        .schedule_service
        .history(listing_id, identity.account_id, query.limit())
        .await?;

    Ok(Json(SuccessResponse::new(
        logs.into_iter().map(BumpLogView::from).collect(),
    )))
}
