use axum::extract::{Path, Query};
use serde::Deserialize;

use crate::api::DataResponse;
use crate::domain::{catalog, Symbol, SymbolCategory};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct SymbolQuery {
    pub category: Option<SymbolCategory>,
}

/// List the built-in symbol catalog, optionally by category
pub async fn list_symbols(Query(query): Query<SymbolQuery>) -> DataResponse<Vec<Symbol>> {
    let symbols: Vec<Symbol> = match query.category {
        Some(category) => catalog::by_category(category).cloned().collect(),
        None => catalog::all().to_vec(),
    };

    tracing::debug!(category = ?query.category, count = symbols.len(), "Listing symbols");

    DataResponse::new(symbols)
}

/// Get a built-in symbol by id
pub async fn get_symbol(Path(symbol_id): Path<String>) -> ApiResult<DataResponse<Symbol>> {
    catalog::by_id(&symbol_id)
        .cloned()
        .map(DataResponse::new)
        .ok_or_else(|| ApiError::not_found(format!("Símbolo '{}' não encontrado", symbol_id)))
}
