//! Environment-based configuration.
//!
//! Everything has a sensible default except the admin password, which must be
//! set explicitly before any admin command works.

use crate::errors::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Selection rules applied to every voter session.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRules {
    /// Upper bound on the number of slogans one voter may pick.
    pub max_selections: usize,
    /// Page size for candidate browsing.
    pub page_size: usize,
}

/// Where the candidate catalog comes from and how its columns are named.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub id_column: String,
    pub text_column: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub catalog: CatalogConfig,
    pub rules: SelectionRules,
    /// Shared static secret gating the admin surface. None until configured.
    pub admin_password: Option<String>,
}

impl Config {
    /// Load configuration from the environment (after `dotenvy::dotenv()`).
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:slogan_vote.db".to_string());

        let catalog = CatalogConfig {
            path: env::var("VOTE_CATALOG_PATH")
                .unwrap_or_else(|_| "slogans.xlsx".to_string())
                .into(),
            id_column: env::var("VOTE_CATALOG_ID_COLUMN").unwrap_or_else(|_| "id".to_string()),
            text_column: env::var("VOTE_CATALOG_TEXT_COLUMN")
                .unwrap_or_else(|_| "slogan".to_string()),
        };

        let max_selections = parse_env("VOTE_MAX_SELECTIONS", 10)?;
        let page_size = parse_env("VOTE_PAGE_SIZE", 50)?;
        if max_selections == 0 {
            return Err(Error::config("VOTE_MAX_SELECTIONS must be at least 1"));
        }
        if page_size == 0 {
            return Err(Error::config("VOTE_PAGE_SIZE must be at least 1"));
        }

        let admin_password = env::var("VOTE_ADMIN_PASSWORD").ok().filter(|p| !p.is_empty());

        Ok(Self {
            database_url,
            catalog,
            rules: SelectionRules {
                max_selections,
                page_size,
            },
            admin_password,
        })
    }
}

fn parse_env(name: &str, default: usize) -> Result<usize> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::config(format!("{name} must be a positive integer, got {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_to_default() {
        assert_eq!(parse_env("VOTE_TEST_UNSET_VARIABLE", 7).unwrap(), 7);
    }

    #[test]
    fn rules_are_plain_data() {
        let rules = SelectionRules {
            max_selections: 3,
            page_size: 40,
        };
        assert_eq!(rules.max_selections, 3);
        assert_eq!(rules.page_size, 40);
    }
}
