//! Client for the property and program database service.
//!
//! The service exposes a single `execute_sql` tool and answers with rows
//! wrapped in untrusted-data markers (see [`crate::payload`]).

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Result, ToolsError};
use crate::payload::{self, PayloadError, field_i64, field_str, price, similarity};
use crate::service::{SharedSession, call_text, log_payload};
use crate::sql::{SqlParam, bind, validate_zip};

/// The service's only tool.
pub const EXECUTE_SQL: &str = "execute_sql";

/// Largest row count a caller may request.
pub const MAX_LIMIT: u32 = 1000;

const HOME_BY_ID: &str = r#"SELECT * FROM public.nyc_property_sales WHERE "HOME_ID" = $1;"#;

const PRICE_BY_ZIP_AND_UNITS: &str = r#"SELECT
    AVG(CAST("SALE PRICE" AS NUMERIC)) AS average_sale_price,
    MIN(CAST("SALE PRICE" AS NUMERIC)) AS min_sale_price,
    MAX(CAST("SALE PRICE" AS NUMERIC)) AS max_sale_price,
    COUNT(*) AS total_properties,
    "ZIP CODE" AS zip_code,
    "RESIDENTIAL UNITS" AS residential_units
FROM public.nyc_property_sales
WHERE "ZIP CODE" = $1
AND CAST("RESIDENTIAL UNITS" AS INTEGER) = $2
AND "SALE PRICE" ~ '^[0-9]+$'
GROUP BY "ZIP CODE", "RESIDENTIAL UNITS";"#;

const PROGRAM_SEARCH: &str = r#"SELECT
    program_name,
    formatted_text,
    jurisdiction,
    assistance_type,
    max_benefit,
    eligibility,
    source,
    embedding_vector <-> $1 AS distance
FROM public.nyc_programs_rag
ORDER BY embedding_vector <-> $1
LIMIT $2;"#;

const PROPERTIES: &str = r#"SELECT * FROM public.nyc_property_sales LIMIT $1;"#;

/// One property sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Row identifier.
    pub home_id: i64,
    /// Street address.
    pub address: String,
    /// Neighborhood name.
    pub neighborhood: String,
    /// Sale price, rounded to cents; 0 when not numeric.
    pub sale_price: f64,
    /// ZIP code.
    pub zip_code: String,
    /// Year built; 0 when unknown.
    pub year_built: i64,
}

impl PropertyRecord {
    fn from_row(row: &Value) -> Self {
        Self {
            home_id: field_i64(row, "HOME_ID"),
            address: field_str(row, "ADDRESS"),
            neighborhood: field_str(row, "NEIGHBORHOOD"),
            sale_price: price(row, "SALE PRICE"),
            zip_code: field_str(row, "ZIP CODE"),
            year_built: field_i64(row, "YEAR BUILT"),
        }
    }
}

/// Sale price statistics for a ZIP code and unit count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    /// ZIP code.
    pub zip_code: String,
    /// Residential unit count.
    pub residential_units: i64,
    /// Mean sale price.
    pub average_sale_price: f64,
    /// Lowest sale price.
    pub min_sale_price: f64,
    /// Highest sale price.
    pub max_sale_price: f64,
    /// Number of sales aggregated.
    pub total_properties: i64,
}

impl PriceSummary {
    fn from_row(row: &Value) -> Self {
        Self {
            zip_code: field_str(row, "zip_code"),
            residential_units: field_i64(row, "residential_units"),
            average_sale_price: price(row, "average_sale_price"),
            min_sale_price: price(row, "min_sale_price"),
            max_sale_price: price(row, "max_sale_price"),
            total_properties: field_i64(row, "total_properties"),
        }
    }
}

/// An assistance program returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProgram {
    /// 1-based position in the service's answer.
    pub rank: usize,
    /// Program name.
    pub program_name: String,
    /// Formatted description.
    pub formatted_text: String,
    /// Issuing jurisdiction.
    pub jurisdiction: String,
    /// Kind of assistance (grant, loan, ...).
    pub assistance_type: String,
    /// Maximum benefit, as free text.
    pub max_benefit: String,
    /// Eligibility summary.
    pub eligibility: String,
    /// Data source.
    pub source: String,
    /// `1 - distance`.
    pub similarity_score: f64,
}

/// Result of a program search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMatches {
    /// Programs in the order the service returned them.
    pub programs: Vec<RankedProgram>,
    /// Number of programs returned.
    pub total_found: usize,
}

/// Turn search rows into ranked programs without reordering.
///
/// Rows that are not objects are dropped but still consume a rank.
pub fn rank_programs(rows: &[Value]) -> ProgramMatches {
    let programs: Vec<RankedProgram> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.is_object())
        .map(|(i, row)| RankedProgram {
            rank: i + 1,
            program_name: field_str(row, "program_name"),
            formatted_text: field_str(row, "formatted_text"),
            jurisdiction: field_str(row, "jurisdiction"),
            assistance_type: field_str(row, "assistance_type"),
            max_benefit: field_str(row, "max_benefit"),
            eligibility: field_str(row, "eligibility"),
            source: field_str(row, "source"),
            similarity_score: similarity(row),
        })
        .collect();

    ProgramMatches {
        total_found: programs.len(),
        programs,
    }
}

/// Typed client for the `catalog` service.
#[derive(Clone)]
pub struct CatalogClient {
    session: SharedSession,
}

impl CatalogClient {
    /// Wrap a session.
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    /// The underlying session.
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Run a bound query and extract its rows, keeping the response text.
    async fn query(&self, template: &str, params: &[SqlParam]) -> Result<(String, Vec<Value>)> {
        let query = bind(template, params)?;
        tracing::debug!(service = %self.session.name(), query = %query, "executing query");

        let text = call_text(self.session.as_ref(), EXECUTE_SQL, json!({ "query": query })).await?;
        let rows = log_payload(self.session.name(), EXECUTE_SQL, payload::extract_rows(&text))?;
        Ok((text, rows))
    }

    async fn rows(&self, template: &str, params: &[SqlParam]) -> Result<Vec<Value>> {
        Ok(self.query(template, params).await?.1)
    }

    /// The first row, which must be an object. No rows is `NO_MATCHES`.
    async fn first_row(&self, template: &str, params: &[SqlParam]) -> Result<Value> {
        let (text, mut rows) = self.query(template, params).await?;
        if rows.is_empty() {
            return Err(PayloadError::new(payload::NO_MATCHES, "").into());
        }
        let row = rows.swap_remove(0);
        if row.is_object() {
            Ok(row)
        } else {
            log_payload(
                self.session.name(),
                EXECUTE_SQL,
                Err(PayloadError::new(payload::INVALID_FORMAT, &text)),
            )
        }
    }

    /// Look up one property sale by id.
    pub async fn query_home_by_id(&self, home_id: i64) -> Result<PropertyRecord> {
        let row = self.first_row(HOME_BY_ID, &[SqlParam::Int(home_id)]).await?;
        Ok(PropertyRecord::from_row(&row))
    }

    /// Sale price statistics for a ZIP code and residential unit count.
    pub async fn query_price_data_by_zip_and_units(
        &self,
        zip_code: &str,
        residential_units: i64,
    ) -> Result<PriceSummary> {
        let zip = validate_zip(zip_code)?;
        let row = self
            .first_row(
                PRICE_BY_ZIP_AND_UNITS,
                &[SqlParam::from(zip), SqlParam::Int(residential_units)],
            )
            .await?;
        Ok(PriceSummary::from_row(&row))
    }

    /// Programs nearest to `embedding`, best first as ranked by the database.
    pub async fn search_programs(&self, embedding: &[f64], limit: u32) -> Result<ProgramMatches> {
        validate_limit(limit)?;
        let rows = self
            .rows(
                PROGRAM_SEARCH,
                &[
                    SqlParam::Vector(embedding.to_vec()),
                    SqlParam::Int(i64::from(limit)),
                ],
            )
            .await?;
        Ok(rank_programs(&rows))
    }

    /// The first `limit` property sales.
    pub async fn query_properties(&self, limit: u32) -> Result<Vec<PropertyRecord>> {
        validate_limit(limit)?;
        let rows = self
            .rows(PROPERTIES, &[SqlParam::Int(i64::from(limit))])
            .await?;
        Ok(rows
            .iter()
            .filter(|row| row.is_object())
            .map(PropertyRecord::from_row)
            .collect())
    }
}

fn validate_limit(limit: u32) -> Result<()> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(())
    } else {
        Err(ToolsError::invalid_input(format!(
            "limit must be between 1 and {}, got {}",
            MAX_LIMIT, limit
        )))
    }
}
