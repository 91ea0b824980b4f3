//! Typed clients for the Homebase tool services and the adapter that owns them.
//!
//! Three services sit behind MCP sessions:
//!
//! - `finance`: budget and loan calculators ([`FinanceClient`])
//! - `catalog`: a read-only SQL endpoint over property sales and assistance
//!   programs ([`CatalogClient`])
//! - `location`: transit scores by ZIP code ([`LocationClient`])
//!
//! The [`Adapter`] connects them concurrently, keeps a status per service and
//! hands out the typed clients. [`ToolFacade`] flattens every result into a
//! JSON mapping for callers that only want `{"error": ...}` on failure.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use homebase_tools::{Adapter, ToolFacade};
//!
//! let config = homebase_config::load_config(None)?.config;
//! let adapter = Arc::new(Adapter::from_config(&config)?);
//! adapter.connect_all().await;
//!
//! let tools = ToolFacade::new(adapter.clone());
//! println!("{}", tools.calculate_budget(75000.0).await);
//!
//! adapter.disconnect_all().await;
//! ```

pub mod adapter;
pub mod catalog;
pub mod error;
pub mod facade;
pub mod finance;
pub mod location;
pub mod mock;
pub mod payload;
pub mod service;
pub mod sql;

pub use adapter::{Adapter, ServiceKind, ServiceStatus, StatusMap, descriptor_for};
pub use catalog::{CatalogClient, PriceSummary, ProgramMatches, PropertyRecord, RankedProgram};
pub use error::{Result, ToolsError};
pub use facade::ToolFacade;
pub use finance::{BudgetSummary, FinanceClient, LoanQualification};
pub use location::{LocationClient, TransitScore};
pub use mock::{MockResponse, MockSession};
pub use payload::PayloadError;
pub use service::SharedSession;
pub use sql::SqlParam;
