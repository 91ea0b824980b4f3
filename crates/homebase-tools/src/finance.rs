//! Client for the finance calculator service.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Result, ToolsError};
use crate::payload::{parse_number, round2};
use crate::service::{SharedSession, call_text, log_payload};

/// Budget calculation tool.
pub const CALCULATE_BUDGET: &str = "calculate_budget";

/// Loan qualification tool.
pub const LOAN_QUALIFICATION: &str = "loan_qualification";

/// Accepted credit score range.
pub const CREDIT_SCORE_RANGE: std::ops::RangeInclusive<u16> = 300..=850;

/// Housing budget derived from annual income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    /// Annual income the budget was computed from.
    pub income: f64,
    /// Yearly housing budget as returned by the service.
    pub yearly_budget: f64,
    /// `yearly_budget / 12`, rounded to cents.
    pub monthly_budget: f64,
    /// Share of income, `yearly_budget / income` (0 when income is 0).
    pub percentage: f64,
}

/// Maximum loan for an income and credit score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanQualification {
    /// Annual income.
    pub income: f64,
    /// Credit score.
    pub credit_score: u16,
    /// Maximum loan amount as returned by the service.
    pub max_loan: f64,
    /// `max_loan / income` (0 when income is 0).
    pub income_multiple: f64,
}

/// Typed client for the `finance` service.
#[derive(Clone)]
pub struct FinanceClient {
    session: SharedSession,
}

impl FinanceClient {
    /// Wrap a session.
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    /// The underlying session.
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Compute the housing budget for an annual income.
    pub async fn calculate_budget(&self, income: f64) -> Result<BudgetSummary> {
        validate_income(income)?;

        let text = call_text(
            self.session.as_ref(),
            CALCULATE_BUDGET,
            json!({ "income": income }),
        )
        .await?;
        let yearly = log_payload(self.session.name(), CALCULATE_BUDGET, parse_number(&text))?;

        Ok(BudgetSummary {
            income,
            yearly_budget: yearly,
            monthly_budget: round2(yearly / 12.0),
            percentage: ratio(yearly, income),
        })
    }

    /// Compute the maximum loan for an income and credit score.
    pub async fn loan_qualification(
        &self,
        income: f64,
        credit_score: u16,
    ) -> Result<LoanQualification> {
        validate_income(income)?;
        if !CREDIT_SCORE_RANGE.contains(&credit_score) {
            return Err(ToolsError::invalid_input(format!(
                "credit score must be between {} and {}, got {}",
                CREDIT_SCORE_RANGE.start(),
                CREDIT_SCORE_RANGE.end(),
                credit_score
            )));
        }

        let text = call_text(
            self.session.as_ref(),
            LOAN_QUALIFICATION,
            json!({ "income": income, "credit_score": credit_score }),
        )
        .await?;
        let max_loan = log_payload(self.session.name(), LOAN_QUALIFICATION, parse_number(&text))?;

        Ok(LoanQualification {
            income,
            credit_score,
            max_loan,
            income_multiple: ratio(max_loan, income),
        })
    }
}

fn validate_income(income: f64) -> Result<()> {
    if income.is_finite() && income >= 0.0 {
        Ok(())
    } else {
        Err(ToolsError::invalid_input(format!(
            "income must be a finite, non-negative number, got {}",
            income
        )))
    }
}

fn ratio(value: f64, income: f64) -> f64 {
    if income > 0.0 { value / income } else { 0.0 }
}
