//! Finance commands - budget and loan calculations.

use anyhow::Result;
use clap::Args;
use homebase_tools::ServiceKind;

use super::{Context, print_record};

/// Arguments for the budget command.
#[derive(Args, Debug)]
pub struct BudgetArgs {
    /// Annual income
    pub income: f64,
}

/// Arguments for the loan command.
#[derive(Args, Debug)]
pub struct LoanArgs {
    /// Annual income
    pub income: f64,

    /// Credit score (300-850)
    pub credit_score: u16,
}

pub async fn run_budget(args: BudgetArgs, ctx: &Context) -> Result<()> {
    let value = ctx
        .with_service(ServiceKind::Finance, |tools| async move {
            tools.calculate_budget(args.income).await
        })
        .await?;
    print_record("Housing Budget", &value, ctx)
}

pub async fn run_loan(args: LoanArgs, ctx: &Context) -> Result<()> {
    let value = ctx
        .with_service(ServiceKind::Finance, |tools| async move {
            tools.loan_qualification(args.income, args.credit_score).await
        })
        .await?;
    print_record("Loan Qualification", &value, ctx)
}
