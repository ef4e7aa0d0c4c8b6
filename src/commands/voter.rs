//! Voter-facing commands.
//!
//! Each command is one logical transaction: hydrate the session from the
//! store, apply one mutation, write back. Nothing is kept between
//! invocations, so the finalized flag in the store is always re-checked.

use crate::catalog::Catalog;
use crate::config::SelectionRules;
use crate::db::BallotStore;
use crate::errors::{Result, ValidationError};
use crate::models::Ballot;
use crate::session::{Toggle, VoterSession};
use log::warn;

/// Start or resume a session, reporting what the voter walks into.
pub async fn login(store: &BallotStore, rules: &SelectionRules, name: &str) -> Result<()> {
    let snapshot = store.load_all_lenient().await;
    if snapshot.read_error.is_some() {
        println!("warning: existing ballots could not be read; starting fresh");
    }

    let existing = snapshot.ballots.get(name.trim());
    let session = VoterSession::login(name, existing, rules)?;

    match existing {
        Some(draft) => println!(
            "Welcome back, {}. Resuming your draft with {} selection(s).",
            session.voter(),
            draft.selected.len()
        ),
        None => println!(
            "Welcome, {}. Pick up to {} slogans, then submit.",
            session.voter(),
            rules.max_selections
        ),
    }
    Ok(())
}

/// Browse the catalog: one page at a time, or filtered by a search term.
pub fn list(catalog: &Catalog, rules: &SelectionRules, page: usize, search: Option<&str>) {
    match search {
        Some(term) => {
            let hits = catalog.search(term);
            println!("{} slogan(s) matching {term:?}:", hits.len());
            for candidate in hits {
                println!("  #{} {}", candidate.id, candidate.text);
            }
        }
        None => {
            let total = catalog.total_pages(rules.page_size);
            println!("Page {page} of {total}:");
            for candidate in catalog.page(page, rules.page_size) {
                println!("  #{} {}", candidate.id, candidate.text);
            }
        }
    }
}

/// Toggle one candidate in the voter's working set and persist the draft.
pub async fn toggle(
    catalog: &Catalog,
    store: &BallotStore,
    rules: &SelectionRules,
    name: &str,
    candidate_id: u32,
) -> Result<()> {
    if !catalog.contains(candidate_id) {
        return Err(ValidationError::UnknownCandidate { id: candidate_id }.into());
    }

    let mut session = open_session(store, rules, name).await?;
    let outcome = session.toggle(candidate_id)?;
    session.save_draft(store).await?;

    let verb = match outcome {
        Toggle::Added => "Selected",
        Toggle::Removed => "Deselected",
    };
    println!(
        "{verb} #{candidate_id}. {}/{} selections used.",
        session.selected().len(),
        rules.max_selections
    );
    Ok(())
}

/// Show the voter's own ballot, draft or finalized. This is the only voter
/// path that works after finalization.
pub async fn show(catalog: &Catalog, store: &BallotStore, name: &str) -> Result<()> {
    match store.get(name.trim()).await? {
        None => println!("No ballot recorded for {:?}.", name.trim()),
        Some(ballot) => {
            let status = if ballot.finalized {
                "final (submitted)"
            } else {
                "draft"
            };
            println!("Ballot for {} [{status}]:", ballot.voter);
            for &id in &ballot.selected {
                let text = catalog.get(id).map(|c| c.text.as_str()).unwrap_or("?");
                println!("  #{id} {text}");
            }
        }
    }
    Ok(())
}

/// Re-persist the current draft. A no-op in effect when nothing changed.
pub async fn save(store: &BallotStore, rules: &SelectionRules, name: &str) -> Result<()> {
    let session = open_session(store, rules, name).await?;
    session.save_draft(store).await?;
    println!(
        "Draft saved with {} selection(s).",
        session.selected().len()
    );
    Ok(())
}

/// Finalize the ballot. Irreversible without an administrative reset.
pub async fn submit(store: &BallotStore, rules: &SelectionRules, name: &str) -> Result<()> {
    let mut session = open_session(store, rules, name).await?;
    session.submit_final(store).await?;
    println!(
        "Final ballot submitted with {} selection(s). Thank you for voting!",
        session.selected().len()
    );
    Ok(())
}

/// Hydrate a session for one request. A store read failure is recoverable:
/// the voter starts from an empty working set instead of being locked out.
async fn open_session(
    store: &BallotStore,
    rules: &SelectionRules,
    name: &str,
) -> Result<VoterSession> {
    let existing: Option<Ballot> = match store.get(name.trim()).await {
        Ok(ballot) => ballot,
        Err(e) => {
            warn!("could not hydrate ballot for {name:?}: {e}");
            None
        }
    };
    VoterSession::login(name, existing.as_ref(), rules)
}
