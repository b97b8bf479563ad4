use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_stats(config: Config) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let stats = state.system_service.dashboard().await?;
    let totals = &stats.totals;

    println!("Inventory");
    println!("{:-<50}", "");
    println!("  Assets:           {}", totals.assets);
    println!("  Categories:       {}", totals.categories);
    println!(
        "  Directory users:  {} ({} active)",
        totals.directory_users, totals.active_directory_users
    );
    println!("  Audit entries:    {}", totals.audit_entries);
    println!("  Purchase value:   {:.2}", totals.total_purchase_cost);

    if !stats.by_status.is_empty() {
        println!();
        println!("By status:");
        for row in &stats.by_status {
            println!("  {:<14} {}", row.label, row.count);
        }
    }

    if !stats.by_category.is_empty() {
        println!();
        println!("By category:");
        for row in &stats.by_category {
            println!("  {:<24} {}", row.name, row.count);
        }
    }

    println!();
    if stats.expiring_warranties.is_empty() {
        println!(
            "No warranties expire in the next {} days.",
            stats.warranty_window_days
        );
    } else {
        println!(
            "Warranties expiring in the next {} days:",
            stats.warranty_window_days
        );
        for asset in &stats.expiring_warranties {
            println!(
                "  • {} {} ({})",
                asset.asset_tag,
                asset.name,
                asset.warranty_expires.as_deref().unwrap_or("?")
            );
        }
    }

    Ok(())
}
