use axum::{
    extract::{Query, State},
    Json,
};
use entity::sea_orm_active_enums::LedgerKind;
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::AccountIdentity,
    models::{
        common::{HistoryQuery, SuccessResponse},
        wallet::{
            AdjustmentRequest, CreditRequest, LedgerEntryView, LedgerPostingData, WalletData,
        },
    },
};

/// GET /api/v1/wallet
#[instrument(skip(state, identity))]
pub async fn get_wallet(
    State(state): State<AppState>,
    identity: AccountIdentity,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<SuccessResponse<WalletData>>> {
    let balance = state.ledger_service.balance(identity.account_id).await?;
    let entries = state
        .ledger_service
        .history(identity.account_id, query.limit())
        .await?;

    Ok(Json(SuccessResponse::new(WalletData {
        account_id: identity.account_id,
        balance,
        entries: entries.into_iter().map(LedgerEntryView::from).collect(),
    })))
}

/// POST /internal/v1/wallet/credits
///
/// Called once per captured payment. Retries with the same reference are the
/// caller's to suppress.
#[instrument(skip(state, request), fields(account_id = %request.account_id))]
pub async fn credit_wallet(
    State(state): State<AppState>,
    Json(request): Json<CreditRequest>,
) -> Result<Json<SuccessResponse<LedgerPostingData>>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let posting = state
        .ledger_service
        .credit(
            request.account_id,
            request.amount,
            LedgerKind::Purchase,
            &request.reference,
        )
        .await?;

    Ok(Json(SuccessResponse::new(posting.into())))
}

/// POST /internal/v1/wallet/adjustments
#[instrument(skip(state, request), fields(account_id = %request.account_id))]
pub async fn adjust_wallet(
    State(state): State<AppState>,
    Json(request): Json<AdjustmentRequest>,
) -> Result<Json<SuccessResponse<LedgerPostingData>>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let posting = state
        .ledger_service
        .adjust(request.account_id, request.amount, &request.reference)
        .await?;

    Ok(Json(SuccessResponse::new(posting.into())))
}
