//! CSV report export for the admin surface.

use crate::catalog::Catalog;
use crate::errors::{Error, Result};
use crate::models::{Ballot, TallyEntry};
use log::info;
use std::collections::BTreeMap;
use std::path::Path;

/// Write the ranked results as CSV: rank, candidate_id, candidate_text,
/// vote_count.
pub fn write_rankings(path: &Path, entries: &[TallyEntry]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::export(format!("cannot create {}: {e}", path.display())))?;

    writer
        .write_record(["rank", "candidate_id", "candidate_text", "vote_count"])
        .map_err(|e| Error::export(e.to_string()))?;
    for entry in entries {
        writer
            .write_record([
                entry.rank.to_string(),
                entry.candidate_id.to_string(),
                entry.text.clone(),
                entry.votes.to_string(),
            ])
            .map_err(|e| Error::export(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| Error::export(e.to_string()))?;

    info!("wrote {} ranking rows to {}", entries.len(), path.display());
    Ok(())
}

/// Write every recorded selection as one CSV row: voter, candidate_id,
/// candidate_text, finalized, updated_at.
pub fn write_raw_ballots(
    path: &Path,
    catalog: &Catalog,
    ballots: &BTreeMap<String, Ballot>,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::export(format!("cannot create {}: {e}", path.display())))?;

    writer
        .write_record(["voter", "candidate_id", "candidate_text", "finalized", "updated_at"])
        .map_err(|e| Error::export(e.to_string()))?;
    let mut rows = 0usize;
    for ballot in ballots.values() {
        for &id in &ballot.selected {
            let text = catalog.get(id).map(|c| c.text.as_str()).unwrap_or("");
            writer
                .write_record([
                    ballot.voter.clone(),
                    id.to_string(),
                    text.to_string(),
                    ballot.finalized.to_string(),
                    ballot.updated_at.to_rfc3339(),
                ])
                .map_err(|e| Error::export(e.to_string()))?;
            rows += 1;
        }
    }
    writer
        .flush()
        .map_err(|e| Error::export(e.to_string()))?;

    info!("wrote {rows} raw vote rows to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ballot;

    fn catalog() -> Catalog {
        Catalog::from_rows(vec![(1, "A".into()), (2, "B".into())]).unwrap()
    }

    #[test]
    fn rankings_csv_has_the_report_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rankings.csv");
        let entries = vec![
            TallyEntry {
                rank: 1,
                candidate_id: 2,
                text: "B".to_string(),
                votes: 2,
                share: 1.0,
            },
            TallyEntry {
                rank: 2,
                candidate_id: 1,
                text: "A".to_string(),
                votes: 1,
                share: 0.5,
            },
        ];
        write_rankings(&path, &entries).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            rdr.headers().unwrap(),
            &csv::StringRecord::from(vec!["rank", "candidate_id", "candidate_text", "vote_count"])
        );
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0], &csv::StringRecord::from(vec!["1", "2", "B", "2"]));
        assert_eq!(&rows[1], &csv::StringRecord::from(vec!["2", "1", "A", "1"]));
    }

    #[test]
    fn raw_export_writes_one_row_per_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let ballots = BTreeMap::from([
            (
                "alice".to_string(),
                Ballot::new("alice".to_string(), [1, 2].into_iter().collect(), true),
            ),
            (
                "carol".to_string(),
                Ballot::new("carol".to_string(), [2].into_iter().collect(), false),
            ),
        ]);
        write_raw_ballots(&path, &catalog(), &ballots).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][0], "alice");
        assert_eq!(&rows[2][0], "carol");
        assert_eq!(&rows[2][3], "false");
    }

    #[test]
    fn unwritable_path_surfaces_as_export_error() {
        let err =
            write_rankings(Path::new("/nonexistent-dir/r.csv"), &[]).unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
    }
}
