//! Candidate catalog loaded once per process from a tabular source file.
//!
//! The source must carry two columns, one with the numeric candidate id and
//! one with the slogan text; their header names come from [`CatalogConfig`].
//! Any malformed row fails the whole load so a broken file never installs a
//! partial catalog.

use crate::config::CatalogConfig;
use crate::errors::{Error, Result};
use crate::models::Candidate;
use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::info;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug)]
pub struct Catalog {
    entries: Vec<Candidate>,
    by_id: HashMap<u32, usize>,
}

impl Catalog {
    /// Load the catalog, dispatching on the file extension (.xlsx or .csv).
    pub fn load(config: &CatalogConfig) -> Result<Self> {
        let path = config.path.as_path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let rows = match ext.as_deref() {
            Some("xlsx") | Some("xls") => read_xlsx(path, config)?,
            Some("csv") => read_csv(path, config)?,
            _ => {
                return Err(Error::catalog(format!(
                    "unsupported catalog format: {} (expected .xlsx or .csv)",
                    path.display()
                )));
            }
        };

        let catalog = Self::from_rows(rows)?;
        info!(
            "loaded {} candidates from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Build a catalog from already-parsed (id, text) rows, enforcing the
    /// data-model invariants: positive unique ids, non-empty text.
    pub fn from_rows(rows: Vec<(u32, String)>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::catalog("the catalog source contains no rows"));
        }
        let mut entries = Vec::with_capacity(rows.len());
        let mut by_id = HashMap::with_capacity(rows.len());
        for (id, text) in rows {
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(Error::catalog(format!(
                    "candidate {id} has an empty text cell"
                )));
            }
            if by_id.insert(id, entries.len()).is_some() {
                return Err(Error::catalog(format!("duplicate candidate id {id}")));
            }
            entries.push(Candidate { id, text });
        }
        Ok(Self { entries, by_id })
    }

    pub fn get(&self, id: u32) -> Option<&Candidate> {
        self.by_id.get(&id).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter()
    }

    pub fn total_pages(&self, page_size: usize) -> usize {
        self.entries.len().div_ceil(page_size)
    }

    /// Slice for the given 1-based page. Out-of-range pages yield an empty
    /// slice rather than an error.
    pub fn page(&self, page: usize, page_size: usize) -> &[Candidate] {
        if page == 0 {
            return &[];
        }
        let start = (page - 1) * page_size;
        if start >= self.entries.len() {
            return &[];
        }
        let end = (start + page_size).min(self.entries.len());
        &self.entries[start..end]
    }

    /// Case-insensitive substring search over slogan text.
    pub fn search(&self, term: &str) -> Vec<&Candidate> {
        let needle = term.to_lowercase();
        self.entries
            .iter()
            .filter(|c| c.text.to_lowercase().contains(&needle))
            .collect()
    }
}

fn read_xlsx(path: &Path, config: &CatalogConfig) -> Result<Vec<(u32, String)>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| Error::catalog(format!("cannot open {}: {e}", path.display())))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::catalog(format!("{} has no worksheets", path.display())))?
        .map_err(|e| Error::catalog(format!("cannot read {}: {e}", path.display())))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| Error::catalog(format!("{} has no header row", path.display())))?;

    let header_names: Vec<String> = header.iter().map(cell_text).collect();
    let id_col = find_column(&header_names, &config.id_column)?;
    let text_col = find_column(&header_names, &config.text_column)?;

    let mut parsed = Vec::new();
    for (idx, row) in rows.enumerate() {
        let lineno = idx + 2;
        let id_cell = row.get(id_col).unwrap_or(&DataType::Empty);
        let text_cell = row.get(text_col).unwrap_or(&DataType::Empty);
        // Trailing blank rows are common in hand-edited workbooks.
        if matches!(id_cell, DataType::Empty) && cell_text(text_cell).trim().is_empty() {
            continue;
        }
        let id = cell_id(id_cell)
            .ok_or_else(|| Error::catalog(format!("row {lineno}: invalid candidate id")))?;
        parsed.push((id, cell_text(text_cell)));
    }
    Ok(parsed)
}

fn read_csv(path: &Path, config: &CatalogConfig) -> Result<Vec<(u32, String)>> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|e| Error::catalog(format!("cannot open {}: {e}", path.display())))?;
    let header_names: Vec<String> = rdr
        .headers()
        .map_err(|e| Error::catalog(format!("cannot read header of {}: {e}", path.display())))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let id_col = find_column(&header_names, &config.id_column)?;
    let text_col = find_column(&header_names, &config.text_column)?;

    let mut parsed = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let record =
            record.map_err(|e| Error::catalog(format!("row {lineno}: unreadable row: {e}")))?;
        let raw_id = record.get(id_col).unwrap_or("").trim();
        let text = record.get(text_col).unwrap_or("");
        if raw_id.is_empty() && text.trim().is_empty() {
            continue;
        }
        let id = raw_id
            .parse::<u32>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                Error::catalog(format!("row {lineno}: invalid candidate id {raw_id:?}"))
            })?;
        parsed.push((id, text.to_string()));
    }
    Ok(parsed)
}

fn find_column(headers: &[String], wanted: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == wanted)
        .ok_or_else(|| {
            Error::catalog(format!(
                "the catalog source must contain a {wanted:?} column (found: {})",
                headers.join(", ")
            ))
        })
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        _ => String::new(),
    }
}

fn cell_id(cell: &DataType) -> Option<u32> {
    let id = match cell {
        DataType::Int(i) => u32::try_from(*i).ok()?,
        DataType::Float(f) if f.fract() == 0.0 && *f >= 0.0 => *f as u32,
        DataType::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_for(path: &Path) -> CatalogConfig {
        CatalogConfig {
            path: path.to_path_buf(),
            id_column: "id".to_string(),
            text_column: "slogan".to_string(),
        }
    }

    fn write_csv(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_a_csv_catalog_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "slogans.csv",
            "id,slogan\n1,Visit the lake\n2,City of bridges\n3,Home of the sunrise\n",
        );
        let catalog = Catalog::load(&config_for(&path)).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(2).unwrap().text, "City of bridges");
        let ids: Vec<u32> = catalog.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn missing_required_column_is_a_descriptive_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bad.csv", "number,slogan\n1,Hello\n");
        let err = Catalog::load(&config_for(&path)).unwrap_err();
        assert!(err.to_string().contains("\"id\""), "got: {err}");
    }

    #[test]
    fn duplicate_and_invalid_ids_are_rejected() {
        let dup = Catalog::from_rows(vec![(1, "a".into()), (1, "b".into())]).unwrap_err();
        assert!(dup.to_string().contains("duplicate"), "got: {dup}");

        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "zero.csv", "id,slogan\n0,Zero\n");
        assert!(Catalog::load(&config_for(&path)).is_err());
    }

    #[test]
    fn empty_text_fails_the_load() {
        let err = Catalog::from_rows(vec![(1, "  ".into())]).unwrap_err();
        assert!(err.to_string().contains("empty text"), "got: {err}");
    }

    #[test]
    fn blank_trailing_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "trail.csv", "id,slogan\n1,Hello\n,\n");
        let catalog = Catalog::load(&config_for(&path)).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn paging_is_one_based_and_clamped() {
        let rows = (1..=7).map(|i| (i, format!("s{i}"))).collect();
        let catalog = Catalog::from_rows(rows).unwrap();
        assert_eq!(catalog.total_pages(3), 3);
        assert_eq!(catalog.page(1, 3).len(), 3);
        assert_eq!(catalog.page(3, 3).len(), 1);
        assert!(catalog.page(4, 3).is_empty());
        assert!(catalog.page(0, 3).is_empty());
    }

    #[test]
    fn search_is_case_insensitive() {
        let catalog = Catalog::from_rows(vec![
            (1, "Visit the Lake".into()),
            (2, "City of bridges".into()),
        ])
        .unwrap();
        let hits = catalog.search("lake");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
        assert!(catalog.search("volcano").is_empty());
    }
}
