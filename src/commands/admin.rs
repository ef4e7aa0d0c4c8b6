//! Administrative commands, gated by the shared static password.
//!
//! Unlike the voter path, reporting refuses to run against a store it could
//! not read: a half-read store must never masquerade as a low turnout.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::db::BallotStore;
use crate::errors::{Error, Result};
use crate::{export, tally};
use log::info;
use std::path::Path;

pub fn authorize(config: &Config, given: Option<&str>) -> Result<()> {
    let expected = config.admin_password.as_deref().ok_or_else(|| {
        Error::config("VOTE_ADMIN_PASSWORD is not set; admin commands are disabled")
    })?;
    match given {
        Some(given) if given == expected => Ok(()),
        _ => Err(Error::Unauthorized),
    }
}

/// Print participation counters and the ranked tally.
pub async fn show_tally(
    catalog: &Catalog,
    store: &BallotStore,
    top: Option<usize>,
) -> Result<()> {
    let ballots = store.load_all().await?;
    let summary = tally::summarize(&ballots);
    let entries = tally::compute(catalog, &ballots, top);

    println!(
        "{} finalized voter(s), {} draft(s), {} selections total ({:.1} per voter)",
        summary.finalized_voters,
        summary.draft_voters,
        summary.total_selections,
        summary.mean_selections()
    );
    for entry in &entries {
        println!(
            "{:>4}. #{:<5} {:<40} {:>5} vote(s)  {:>5.1}%",
            entry.rank,
            entry.candidate_id,
            entry.text,
            entry.votes,
            entry.share * 100.0
        );
    }
    Ok(())
}

/// Export the ranked results to a CSV file.
pub async fn export_rankings(
    catalog: &Catalog,
    store: &BallotStore,
    out: &Path,
    top: Option<usize>,
) -> Result<()> {
    let ballots = store.load_all().await?;
    let entries = tally::compute(catalog, &ballots, top);
    export::write_rankings(out, &entries)?;
    println!("Wrote {} ranked row(s) to {}", entries.len(), out.display());
    Ok(())
}

/// Export every recorded selection, drafts included.
pub async fn export_raw(catalog: &Catalog, store: &BallotStore, out: &Path) -> Result<()> {
    let ballots = store.load_all().await?;
    export::write_raw_ballots(out, catalog, &ballots)?;
    println!("Wrote raw votes for {} voter(s) to {}", ballots.len(), out.display());
    Ok(())
}

/// Delete one voter's ballot so they can vote again. Requires `--yes`.
pub async fn delete_voter(store: &BallotStore, name: &str, yes: bool) -> Result<()> {
    if !yes {
        println!(
            "This permanently removes the ballot for {name:?}. Re-run with --yes to confirm."
        );
        return Ok(());
    }
    if store.delete(name.trim()).await? {
        info!("admin deleted ballot for {name:?}");
        println!("Removed ballot for {name:?}.");
    } else {
        println!("No ballot recorded for {name:?}.");
    }
    Ok(())
}

/// Drop every ballot in the store. Requires `--yes`.
pub async fn clear(store: &BallotStore, yes: bool) -> Result<()> {
    if !yes {
        println!("This permanently removes ALL ballots. Re-run with --yes to confirm.");
        return Ok(());
    }
    let removed = store.clear().await?;
    info!("admin cleared {removed} ballot(s)");
    println!("Removed {removed} ballot(s).");
    Ok(())
}

/// Re-read the catalog source and report what it holds now.
pub fn refresh(config: &Config) -> Result<()> {
    let catalog = Catalog::load(&config.catalog)?;
    println!(
        "Catalog at {} holds {} candidate(s).",
        config.catalog.path.display(),
        catalog.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CatalogConfig, SelectionRules};

    fn config(password: Option<&str>) -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            catalog: CatalogConfig {
                path: "slogans.csv".into(),
                id_column: "id".to_string(),
                text_column: "slogan".to_string(),
            },
            rules: SelectionRules {
                max_selections: 10,
                page_size: 50,
            },
            admin_password: password.map(str::to_string),
        }
    }

    #[test]
    fn authorize_needs_a_configured_password_and_a_match() {
        assert!(matches!(
            authorize(&config(None), Some("x")),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            authorize(&config(Some("secret")), None),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            authorize(&config(Some("secret")), Some("wrong")),
            Err(Error::Unauthorized)
        ));
        assert!(authorize(&config(Some("secret")), Some("secret")).is_ok());
    }
}
