use clap::{Parser, Subcommand};
use slogan_vote::catalog::Catalog;
use slogan_vote::commands::{admin, voter};
use slogan_vote::config::Config;
use slogan_vote::db::BallotStore;
use slogan_vote::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(name = "slogan-vote", about = "Slogan voting: pick favorites, tally rankings")]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start or resume a voting session under a display name.
    Login { name: String },
    /// Browse the candidate slogans.
    List {
        /// 1-based page number.
        #[clap(long, default_value_t = 1)]
        page: usize,
        /// Case-insensitive text filter; overrides paging.
        #[clap(long)]
        search: Option<String>,
    },
    /// Select or deselect one slogan; the draft is saved right away.
    Toggle { name: String, candidate_id: u32 },
    /// Show a voter's own ballot, draft or submitted.
    Show { name: String },
    /// Re-save the current draft.
    Save { name: String },
    /// Submit the final ballot. Cannot be undone without an admin reset.
    Submit { name: String },
    /// Administrative commands (password required).
    Admin {
        #[clap(long)]
        password: Option<String>,
        #[clap(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Show participation counters and the ranked tally.
    Tally {
        #[clap(long)]
        top: Option<usize>,
    },
    /// Export the ranked results as CSV.
    Export {
        out: PathBuf,
        #[clap(long)]
        top: Option<usize>,
    },
    /// Export every recorded selection as CSV, drafts included.
    ExportRaw { out: PathBuf },
    /// Delete one voter's ballot so they can vote again.
    DeleteVoter {
        name: String,
        #[clap(long)]
        yes: bool,
    },
    /// Delete all ballots.
    Clear {
        #[clap(long)]
        yes: bool,
    },
    /// Re-read the catalog source and report what it holds.
    Refresh,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let opts = Opts::parse();
    if let Err(e) = run(opts).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(opts: Opts) -> Result<()> {
    let config = Config::from_env()?;

    match opts.command {
        // A broken catalog blocks every voter path, so it is loaded first.
        Command::Login { name } => {
            Catalog::load(&config.catalog)?;
            let store = BallotStore::open(&config.database_url).await?;
            voter::login(&store, &config.rules, &name).await
        }
        Command::List { page, search } => {
            let catalog = Catalog::load(&config.catalog)?;
            voter::list(&catalog, &config.rules, page, search.as_deref());
            Ok(())
        }
        Command::Toggle { name, candidate_id } => {
            let catalog = Catalog::load(&config.catalog)?;
            let store = BallotStore::open(&config.database_url).await?;
            voter::toggle(&catalog, &store, &config.rules, &name, candidate_id).await
        }
        Command::Show { name } => {
            let catalog = Catalog::load(&config.catalog)?;
            let store = BallotStore::open(&config.database_url).await?;
            voter::show(&catalog, &store, &name).await
        }
        Command::Save { name } => {
            Catalog::load(&config.catalog)?;
            let store = BallotStore::open(&config.database_url).await?;
            voter::save(&store, &config.rules, &name).await
        }
        Command::Submit { name } => {
            Catalog::load(&config.catalog)?;
            let store = BallotStore::open(&config.database_url).await?;
            voter::submit(&store, &config.rules, &name).await
        }
        Command::Admin { password, command } => {
            admin::authorize(&config, password.as_deref())?;
            match command {
                AdminCommand::Tally { top } => {
                    let catalog = Catalog::load(&config.catalog)?;
                    let store = BallotStore::open(&config.database_url).await?;
                    admin::show_tally(&catalog, &store, top).await
                }
                AdminCommand::Export { out, top } => {
                    let catalog = Catalog::load(&config.catalog)?;
                    let store = BallotStore::open(&config.database_url).await?;
                    admin::export_rankings(&catalog, &store, &out, top).await
                }
                AdminCommand::ExportRaw { out } => {
                    let catalog = Catalog::load(&config.catalog)?;
                    let store = BallotStore::open(&config.database_url).await?;
                    admin::export_raw(&catalog, &store, &out).await
                }
                AdminCommand::DeleteVoter { name, yes } => {
                    let store = BallotStore::open(&config.database_url).await?;
                    admin::delete_voter(&store, &name, yes).await
                }
                AdminCommand::Clear { yes } => {
                    let store = BallotStore::open(&config.database_url).await?;
                    admin::clear(&store, yes).await
                }
                AdminCommand::Refresh => admin::refresh(&config),
            }
        }
    }
}
