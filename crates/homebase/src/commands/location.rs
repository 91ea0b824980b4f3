//! Transit command.

use anyhow::Result;
use clap::Args;
use homebase_tools::ServiceKind;

use super::{Context, print_record};

/// Arguments for the transit command.
#[derive(Args, Debug)]
pub struct TransitArgs {
    /// Five-digit ZIP code
    pub zip: String,
}

pub async fn run(args: TransitArgs, ctx: &Context) -> Result<()> {
    let value = ctx
        .with_service(ServiceKind::Location, |tools| async move {
            tools.get_transit_score(&args.zip).await
        })
        .await?;
    print_record("Transit Score", &value, ctx)
}
