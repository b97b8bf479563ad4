use crate::config::Config;
use crate::domain::Actor;
use crate::state::SharedState;

pub async fn cmd_sync_directory(config: Config) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    let report = state
        .directory_service
        .sync(&Actor::system("cli"))
        .await?;

    println!("Directory sync finished in {} ms", report.duration_ms);
    println!("{:-<40}", "");
    println!("  Created:     {}", report.created);
    println!("  Updated:     {}", report.updated);
    println!("  Deactivated: {}", report.deactivated);
    println!("  Unchanged:   {}", report.unchanged);
    if report.skipped > 0 {
        println!("  Skipped:     {} (see log for details)", report.skipped);
    }

    Ok(())
}
