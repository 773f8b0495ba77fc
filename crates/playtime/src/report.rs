use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use playtime_snapshots::{DaySnapshot, PlayerTotal, SnapshotKind, SnapshotStore, SnapshotSummary};

#[derive(Subcommand, Debug)]
pub enum ReportAction {
    /// List snapshot files, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the players recorded in one snapshot
    Show {
        /// Snapshot file name, e.g. playtime_log-2021-03-24.json
        file: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Total playtime per player across all snapshots
    Totals {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn handle_report_command(action: ReportAction, output_dir: &Path) -> Result<()> {
    let store = SnapshotStore::with_dir(output_dir);

    match action {
        ReportAction::List { json } => {
            let summaries = store.list()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!(
                    "{}",
                    format!("No snapshots found in {}", output_dir.display()).dimmed()
                );
            } else {
                print_snapshot_table(&summaries);
            }
        }
        ReportAction::Show { file, json } => {
            let snapshot = store.get(&file)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_snapshot_detail(&file, &snapshot);
            }
        }
        ReportAction::Totals { json } => {
            let totals = store.player_totals()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else if totals.is_empty() {
                println!("{}", "No playtime recorded yet.".dimmed());
            } else {
                print_totals(&totals);
            }
        }
    }

    Ok(())
}

fn print_snapshot_table(summaries: &[SnapshotSummary]) {
    println!(
        "{:<12} {:<10} {:>7} {:>16}  {}",
        "DAY".bold(),
        "KIND".bold(),
        "PLAYERS".bold(),
        "TOTAL".bold(),
        "FILE".bold()
    );

    for s in summaries {
        let kind = match s.kind {
            SnapshotKind::Scheduled => "day".green(),
            SnapshotKind::Interrupt => "interrupt".yellow(),
        };
        println!(
            "{:<12} {:<10} {:>7} {:>16}  {}",
            s.day.format("%Y-%m-%d"),
            kind,
            s.players,
            s.readable_total,
            s.file_name.dimmed()
        );
    }
}

fn print_snapshot_detail(file: &str, snapshot: &DaySnapshot) {
    println!("{} {}", "Snapshot:".bold(), file);
    println!("{} {}", "Day:".bold(), snapshot.day.to_rfc3339());
    println!();

    if snapshot.play_times.is_empty() {
        println!("{}", "No players.".dimmed());
        return;
    }

    println!(
        "{:<20} {:>20} {:<12} {:<12}",
        "PLAYER".bold(),
        "PLAYTIME".bold(),
        "LAST JOIN".bold(),
        "LAST LEAVE".bold()
    );
    for record in &snapshot.play_times {
        println!(
            "{:<20} {:>20} {:<12} {:<12}",
            record.player_name,
            record.readable_duration,
            record.latest_start.format("%H:%M:%S"),
            record.latest_end.format("%H:%M:%S")
        );
    }
}

fn print_totals(totals: &[PlayerTotal]) {
    println!(
        "{:<20} {:>6} {:>20}",
        "PLAYER".bold(),
        "DAYS".bold(),
        "PLAYTIME".bold()
    );
    for total in totals {
        println!(
            "{:<20} {:>6} {:>20}",
            total.player_name, total.days, total.readable_duration
        );
    }
}
