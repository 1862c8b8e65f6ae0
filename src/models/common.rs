use serde::Serialize;

/// Success envelope shared by every JSON endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Paging limit accepted by history endpoints
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<u64>,
}

impl HistoryQuery {
    pub const DEFAULT_LIMIT: u64 = 50;
    pub const MAX_LIMIT: u64 = 200;

    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}
