use anyhow::Result;
use catalog_sync_store::ExecutionRecord;

use crate::commands;
use crate::config::AppConfig;

const MAX_NAME_WIDTH: usize = 30;

pub fn run(app: &AppConfig, limit: usize) -> Result<()> {
    let store = commands::open_store(app)?;
    let records = store.history(limit)?;

    if records.is_empty() {
        println!("No synchronizations recorded.");
        return Ok(());
    }

    print_history_table(&records);
    Ok(())
}

pub fn print_history_table(records: &[ExecutionRecord]) {
    let name_width = records
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_NAME_WIDTH);

    for record in records {
        let name = truncate(&record.name, name_width);
        println!(
            "  {:<width$}  {:<18}  {:<10}  {}",
            name,
            record.outcome.to_string(),
            record.state,
            record.id,
            width = name_width
        );
    }

    println!("\n{} executions", records.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_owned();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
