use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use ledgerline_core::{
    AccountId, BankAccount, LedgerStore, LedgerTransaction, PendingTransaction, StatementRow,
    StoreError, ValidationError,
};
use ledgerline_import::{
    categorize_rows, detect_duplicates, screen_rows, validate_rows, DedupeOptions, ImportError,
    ImportResult, ImportSummary, Importer, ValidationReport,
};
use ledgerline_storage::SqliteLedger;

#[derive(Clone)]
pub struct AppState {
    pub importer: Arc<Importer<SqliteLedger>>,
    pub dedupe_defaults: DedupeOptions,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/{id}/transactions", get(list_transactions))
        .route("/import/validate", post(validate))
        .route("/accounts/{id}/import/preview", post(preview))
        .route("/accounts/{id}/import", post(import))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────

pub enum ApiError {
    Import(ImportError),
    Internal(String),
}

impl ApiError {
    fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ImportError> for ApiError {
    fn from(e: ImportError) -> Self {
        ApiError::Import(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Import(ImportError::Store(e))
    }
}

fn status_for(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Import(ImportError::EmptyBatch) => StatusCode::BAD_REQUEST,
        ApiError::Import(ImportError::AccountNotFound(_)) => StatusCode::NOT_FOUND,
        ApiError::Import(ImportError::Store(_)) | ApiError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let message = match &self {
            ApiError::Import(e) => e.to_string(),
            ApiError::Internal(e) => e.clone(),
        };
        if status.is_server_error() {
            tracing::error!(%message, "request failed");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// ── Requests / responses ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub number_suffix: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RowsRequest {
    pub rows: Vec<StatementRow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportRequestOptions {
    pub fuzzy_match: Option<bool>,
    pub similarity_threshold: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub rows: Vec<StatementRow>,
    #[serde(default)]
    pub options: ImportRequestOptions,
}

impl ImportRequestOptions {
    /// Server config supplies the defaults; the request overrides per field.
    fn resolve(&self, defaults: DedupeOptions) -> DedupeOptions {
        DedupeOptions {
            fuzzy_match: self.fuzzy_match.unwrap_or(defaults.fuzzy_match),
            similarity_threshold: self
                .similarity_threshold
                .unwrap_or(defaults.similarity_threshold),
        }
    }
}

/// Dry-run view of a batch: the full validation report, the categorized
/// valid rows, and which of those rows would be skipped as duplicates
/// (indices into `transactions`).
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub transactions: Vec<PendingTransaction>,
    pub duplicates: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub result: ImportResult,
    pub summary: ImportSummary,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<BankAccount>), ApiError> {
    let account = BankAccount {
        id: None,
        name: req.name,
        number_suffix: req.number_suffix,
        created_at: None,
    };
    let created = ledgerline_storage::create_account(state.importer.store().pool(), &account)
        .await
        .map_err(ApiError::internal)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_transactions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<LedgerTransaction>>, ApiError> {
    let account = AccountId(id);
    let store = state.importer.store();
    if !store.account_exists(account).await? {
        return Err(ImportError::AccountNotFound(account).into());
    }
    Ok(Json(store.list_transactions(account).await?))
}

async fn validate(Json(req): Json<RowsRequest>) -> Json<ValidationReport> {
    Json(validate_rows(&req.rows))
}

async fn preview(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let account = AccountId(id);
    let store = state.importer.store();
    if !store.account_exists(account).await? {
        return Err(ImportError::AccountNotFound(account).into());
    }

    let screened = screen_rows(&req.rows);
    let pending: Vec<_> = screened.valid.into_iter().map(|(_, tx)| tx).collect();
    let transactions = categorize_rows(&pending, state.importer.rules());

    let existing = store.list_transactions(account).await?;
    let options = req.options.resolve(state.dedupe_defaults);
    let duplicates = detect_duplicates(&transactions, &existing, &options);

    Ok(Json(PreviewResponse {
        is_valid: screened.errors.is_empty(),
        errors: screened.errors,
        transactions,
        duplicates,
    }))
}

async fn import(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let options = req.options.resolve(state.dedupe_defaults);
    let result = state
        .importer
        .run(AccountId(id), &req.rows, &options)
        .await?;
    let summary = ImportSummary::from_result(&result);
    Ok(Json(ImportResponse { result, summary }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_options_override_defaults_per_field() {
        let defaults = DedupeOptions {
            fuzzy_match: false,
            similarity_threshold: 0.8,
        };
        let req = ImportRequestOptions {
            fuzzy_match: Some(true),
            similarity_threshold: None,
        };
        let resolved = req.resolve(defaults);
        assert!(resolved.fuzzy_match);
        assert_eq!(resolved.similarity_threshold, 0.8);
    }

    #[test]
    fn import_request_options_default_to_absent() {
        let req: ImportRequest = serde_json::from_str(
            r#"{"rows":[{"date":"2024-01-15","description":"X","amount":"1.00","type":"debit"}]}"#,
        )
        .unwrap();
        assert!(req.options.fuzzy_match.is_none());
        assert!(req.options.similarity_threshold.is_none());
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            status_for(&ApiError::Import(ImportError::EmptyBatch)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ApiError::Import(ImportError::AccountNotFound(AccountId(7)))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ApiError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
