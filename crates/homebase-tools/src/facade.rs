//! Flat, never-failing tool surface over the [`Adapter`].
//!
//! Every method returns a JSON value: the serialized record on success, or
//! `{"error": reason}` (with `raw_excerpt` when the service sent something
//! unusable) on any failure. Raw result envelopes never reach callers.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::adapter::Adapter;
use crate::error::{Result, ToolsError};

/// Tool functions returning plain mappings.
#[derive(Debug, Clone)]
pub struct ToolFacade {
    adapter: Arc<Adapter>,
}

impl ToolFacade {
    /// Wrap a shared adapter.
    pub fn new(adapter: Arc<Adapter>) -> Self {
        Self { adapter }
    }

    /// The adapter calls are routed through.
    pub fn adapter(&self) -> &Arc<Adapter> {
        &self.adapter
    }

    /// Housing budget for a yearly income, as a `BudgetSummary` mapping.
    pub async fn calculate_budget(&self, income: f64) -> Value {
        let result = match self.adapter.finance() {
            Ok(client) => client.calculate_budget(income).await,
            Err(e) => Err(e),
        };
        to_value("calculate_budget", result)
    }

    /// Maximum loan for an income and credit score.
    pub async fn loan_qualification(&self, income: f64, credit_score: u16) -> Value {
        let result = match self.adapter.finance() {
            Ok(client) => client.loan_qualification(income, credit_score).await,
            Err(e) => Err(e),
        };
        to_value("loan_qualification", result)
    }

    /// One property sale by id.
    pub async fn query_home_by_id(&self, home_id: i64) -> Value {
        let result = match self.adapter.catalog() {
            Ok(client) => client.query_home_by_id(home_id).await,
            Err(e) => Err(e),
        };
        to_value("query_home_by_id", result)
    }

    /// Sale price statistics for a ZIP code and unit count.
    pub async fn query_price_data_by_zip_and_units(&self, zip_code: &str, units: i64) -> Value {
        let result = match self.adapter.catalog() {
            Ok(client) => client.query_price_data_by_zip_and_units(zip_code, units).await,
            Err(e) => Err(e),
        };
        to_value("query_price_data_by_zip_and_units", result)
    }

    /// Assistance programs nearest to a query embedding, with ranks and similarity.
    pub async fn search_programs(&self, embedding: &[f64], limit: u32) -> Value {
        let result = match self.adapter.catalog() {
            Ok(client) => client.search_programs(embedding, limit).await,
            Err(e) => Err(e),
        };
        to_value("search_programs", result)
    }

    /// The first `limit` property sales as a list.
    pub async fn query_properties(&self, limit: u32) -> Value {
        let result = match self.adapter.catalog() {
            Ok(client) => client.query_properties(limit).await,
            Err(e) => Err(e),
        };
        to_value("query_properties", result)
    }

    /// Transit score and location for a ZIP code.
    pub async fn get_transit_score(&self, zip_code: &str) -> Value {
        let result = match self.adapter.location() {
            Ok(client) => client.get_transit_score(zip_code).await,
            Err(e) => Err(e),
        };
        to_value("get_transit_score", result)
    }
}

/// The error mapping returned for a failed call.
pub fn error_value(error: &ToolsError) -> Value {
    let mut map = Map::new();
    map.insert("error".to_string(), Value::String(error.to_string()));
    if let Some(excerpt) = error.raw_excerpt() {
        map.insert("raw_excerpt".to_string(), Value::String(excerpt.to_string()));
    }
    Value::Object(map)
}

fn to_value<T: Serialize>(tool: &str, result: Result<T>) -> Value {
    match result {
        Ok(record) => serde_json::to_value(record)
            .unwrap_or_else(|e| json!({ "error": format!("failed to serialize result: {}", e) })),
        Err(e) => {
            tracing::debug!(tool, error = %e, "tool call failed");
            error_value(&e)
        }
    }
}
