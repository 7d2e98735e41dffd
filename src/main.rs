use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use placement_core::config::PlacementConfig;
use placement_core::criteria::CandidateRecord;
use placement_core::drives::Drive;
use placement_core::notify::{NotificationFanout, NotificationTemplate};
use placement_core::store;

/// Input file: a drive, the notification template, and the student population.
#[derive(Debug, Deserialize)]
struct Fixture {
    drive: Drive,
    template: NotificationTemplate,
    #[serde(default)]
    candidates: Vec<CandidateRecord>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let fixture_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Usage: placement <fixture.json>");
            eprintln!("  fixture: {{ \"drive\": {{..}}, \"template\": {{..}}, \"candidates\": [..] }}");
            std::process::exit(2);
        }
    };

    let config = PlacementConfig::from_env()?;

    let raw = std::fs::read_to_string(&fixture_path)
        .with_context(|| format!("reading {}", fixture_path.display()))?;
    let fixture: Fixture = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", fixture_path.display()))?;

    eprintln!("Placement v{}", env!("CARGO_PKG_VERSION"));

    if config.in_memory {
        eprintln!("   Store: in-memory");
    } else {
        eprintln!("   Store: {}", config.db_path.display());
    }
    let db = store::open(&config)
        .await
        .context("opening placement store")?;

    for candidate in &fixture.candidates {
        db.upsert_candidate(candidate).await?;
    }
    eprintln!("   Candidates: {}", fixture.candidates.len());

    let fanout = NotificationFanout::new(Arc::clone(&db), config.fanout_concurrency);
    let report = fanout
        .create_drive_and_notify(&fixture.drive, &fixture.template)
        .await?;

    eprintln!(
        "   Drive {} ({} / {}): scanned {}, eligible {}, delivered {}, failed {}",
        report.drive_id,
        fixture.drive.company,
        fixture.drive.role,
        report.scanned,
        report.eligible,
        report.delivered.len(),
        report.failed.len(),
    );
    for failure in &report.failed {
        eprintln!("     ✗ {}: {}", failure.candidate_id, failure.error);
    }

    if !report.is_complete() {
        std::process::exit(1);
    }
    Ok(())
}
