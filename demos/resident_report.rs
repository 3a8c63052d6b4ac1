use building_fund_ledger::{
    page_count, BuildingConfig, BuildingFund, GvizClient, MemoryCache, PaymentStatus,
};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => BuildingConfig::from_json_file(path)?,
        None => BuildingConfig::default(),
    };

    println!("📥 Fetching spreadsheet {}...\n", config.spreadsheet_id);

    let client = GvizClient::new(config.spreadsheet_id.clone());
    let per_page = config.expenses_per_page;
    let fund = BuildingFund::new(client, MemoryCache::new(), config)?;
    let snapshot = fund.fetch_all_data(false).await?;

    println!("💰 Fund total: {:.2}", snapshot.total);
    println!(
        "🧾 {} expenses over {} page(s)\n",
        snapshot.expenses.len(),
        page_count(snapshot.expenses.len(), per_page)
    );

    let today = chrono::Local::now().date_naive();
    for floor in snapshot.building_view(today) {
        println!("Floor {}", floor.number);
        for apt in &floor.apartments {
            let boxes: String = apt
                .statuses
                .iter()
                .map(|status| match status {
                    PaymentStatus::Paid(_) => '■',
                    PaymentStatus::Zero => '◧',
                    PaymentStatus::Future => '·',
                    PaymentStatus::Unpaid => '□',
                })
                .collect();
            println!("  #{:<3} {:<20} {}", apt.number, apt.label(), boxes);
        }
    }
    println!();

    for name in &snapshot.payments.residents {
        // Served from the cache filled above.
        let report = fund.get_resident_data(name).await?;
        println!(
            "{:<20} owes {:>8.2} this year, {:>8.2} from last year",
            report.name, report.owed, report.last_year_owed
        );
    }

    Ok(())
}
