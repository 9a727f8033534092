//! `academaide clear-history`: delete a user's turn log and rolling context.

use academaide_config::AppConfig;
use academaide_pipeline::ClearStep;

use crate::runtime::{CliResult, StoreMode, build_pipeline};

pub async fn run(config: AppConfig, mode: StoreMode, user_id: String) -> CliResult<()> {
    let pipeline = build_pipeline(&config, &mode).await?;
    let report = pipeline.clear_history(&user_id).await;

    match &report.turns {
        ClearStep::Done(n) => println!("  Deleted {n} turn(s)"),
        ClearStep::Failed(e) => println!("  Failed to delete turns: {e}"),
    }
    match &report.context {
        ClearStep::Done(true) => println!("  Deleted rolling context"),
        ClearStep::Done(false) => println!("  No rolling context stored"),
        ClearStep::Failed(e) => println!("  Failed to delete rolling context: {e}"),
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(format!("History for {user_id} was only partially cleared").into())
    }
}
