// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod http;
mod poller;

use axum::Router;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tally::{Format, ImportOutcome};
use tally_api::{
    ApiError, ArchiveSummary, ImportOptions, ImportSource, export_archive,
    import_election_results, import_party_results, load_registry, parse_ballot_type,
    parse_election_type, parse_format, translate_domain_error,
};
use tally_domain::{BallotType, Domain, EntityRegistry};
use tally_persistence::{NewElection, NewVote, Persistence};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::http::{AppState, build_router};
use crate::poller::{PollSummary, PollTarget};

/// Tally - imports vote and election results and serves them over HTTP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "TALLY_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Path to the entity registry JSON file
    #[arg(short, long, env = "TALLY_REGISTRY", global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Registers a vote
    AddVote {
        #[arg(long)]
        title: String,
        #[arg(long)]
        year: i32,
        /// federation, canton, region, district, municipality or none
        #[arg(long, default_value = "federation")]
        domain: String,
        /// Region, district or municipality the vote is limited to
        #[arg(long)]
        segment: Option<String>,
        /// Whether expatriates vote separately
        #[arg(long)]
        expats: bool,
        /// Ballots of the vote; repeat for votes with a counter-proposal
        #[arg(long = "ballot-type", default_value = "proposal")]
        ballot_types: Vec<String>,
        #[arg(long)]
        external_id: Option<String>,
    },

    /// Registers an election
    AddElection {
        #[arg(long)]
        title: String,
        #[arg(long)]
        year: i32,
        /// federation, canton, region, district, municipality or none
        #[arg(long, default_value = "federation")]
        domain: String,
        /// Region, district or municipality the election is limited to
        #[arg(long)]
        segment: Option<String>,
        /// Whether expatriates vote separately
        #[arg(long)]
        expats: bool,
        /// majorz or proporz
        #[arg(long = "type", default_value = "proporz")]
        election_type: String,
    },

    /// Imports a vote result file once
    Import {
        #[command(flatten)]
        target: VoteTargetArgs,
    },

    /// Imports a party result file into an election
    ImportParties {
        #[arg(long)]
        election: i64,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        mime: Option<String>,
    },

    /// Imports a candidate result file in the internal election format
    ImportElection {
        #[arg(long)]
        election: i64,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        mime: Option<String>,
    },

    /// Re-imports a vote result file periodically until interrupted
    Poll {
        #[command(flatten)]
        target: VoteTargetArgs,
        /// Seconds between two imports
        #[arg(long, default_value_t = 300, env = "TALLY_POLL_INTERVAL")]
        interval: u64,
    },

    /// Writes the results archive and its zip file
    Archive {
        #[arg(long, env = "TALLY_ARCHIVE_DIR")]
        out: PathBuf,
    },

    /// Runs the HTTP server
    Serve {
        /// Port to bind the server to
        #[arg(short, long, default_value_t = 3000, env = "TALLY_PORT")]
        port: u16,
        /// Directory receiving archives exported over HTTP
        #[arg(long, default_value = ".", env = "TALLY_ARCHIVE_DIR")]
        archive_dir: PathBuf,
    },
}

/// The vote, file and format of an import.
#[derive(clap::Args, Debug)]
struct VoteTargetArgs {
    #[arg(long)]
    vote: i64,
    /// default, internal, wabsti_municipality, wabsti_cantonal or ech_0252
    #[arg(long)]
    format: String,
    #[arg(long)]
    file: PathBuf,
    /// MIME type of the file; guessed from the extension when absent
    #[arg(long)]
    mime: Option<String>,
    #[arg(long, default_value = "proposal")]
    ballot_type: String,
    /// Business number selecting rows in Wabsti exports
    #[arg(long, default_value_t = 0)]
    number: u32,
}

impl VoteTargetArgs {
    fn into_target(self) -> Result<PollTarget, ApiError> {
        let format: Format = parse_format(&self.format)?;
        let ballot_type: BallotType = parse_ballot_type(&self.ballot_type)?;
        Ok(PollTarget {
            vote_id: self.vote,
            format,
            file: self.file,
            mime: self.mime,
            options: ImportOptions {
                ballot_type,
                vote_number: self.number,
            },
        })
    }
}

fn open_persistence(database: Option<&Path>) -> Result<Persistence, ApiError> {
    if let Some(path) = database {
        info!(path = %path.display(), "Using file-based database");
        Ok(Persistence::new_with_file(path)?)
    } else {
        info!("Using in-memory database");
        Ok(Persistence::new_in_memory()?)
    }
}

fn require_registry(registry: Option<&Path>) -> Result<EntityRegistry, ApiError> {
    let path: &Path = registry.ok_or_else(|| ApiError::InvalidInput {
        field: String::from("registry"),
        message: String::from("An entity registry is required (--registry or TALLY_REGISTRY)"),
    })?;
    load_registry(path)
}

/// Prints an outcome as JSON and turns a rejection into a failure exit.
fn report_outcome(outcome: &ImportOutcome) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    if outcome.is_accepted() {
        Ok(())
    } else {
        for err in outcome.errors() {
            warn!(error = %err, "Import error");
        }
        Err(format!("Import rejected with {} error(s)", outcome.errors().len()).into())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut persistence: Persistence = open_persistence(args.database.as_deref())?;

    match args.command {
        Command::AddVote {
            title,
            year,
            domain,
            segment,
            expats,
            ballot_types,
            external_id,
        } => {
            let vote: NewVote = NewVote {
                title,
                year,
                domain: Domain::from_str(&domain).map_err(translate_domain_error)?,
                domain_segment: segment,
                has_expats: expats,
                ballot_types: ballot_types
                    .iter()
                    .map(|name| parse_ballot_type(name))
                    .collect::<Result<Vec<BallotType>, ApiError>>()?,
                external_id,
            };
            let vote_id: i64 = persistence.add_vote(&vote)?;
            info!(vote_id, title = %vote.title, "Added vote");
            println!("{vote_id}");
        }
        Command::AddElection {
            title,
            year,
            domain,
            segment,
            expats,
            election_type,
        } => {
            let election: NewElection = NewElection {
                title,
                year,
                domain: Domain::from_str(&domain).map_err(translate_domain_error)?,
                domain_segment: segment,
                has_expats: expats,
                election_type: parse_election_type(&election_type)?,
            };
            let election_id: i64 = persistence.add_election(&election)?;
            info!(
                election_id,
                title = %election.title,
                election_type = %election.election_type,
                "Added election"
            );
            println!("{election_id}");
        }
        Command::Import { target } => {
            let registry: EntityRegistry = require_registry(args.registry.as_deref())?;
            let target: PollTarget = target.into_target()?;
            let outcome: ImportOutcome = poller::poll_once(&mut persistence, &registry, &target)?;
            report_outcome(&outcome)?;
        }
        Command::ImportParties {
            election,
            file,
            mime,
        } => {
            let source: ImportSource = ImportSource::from_path(&file, mime.as_deref())?;
            let outcome: ImportOutcome = import_party_results(&mut persistence, election, &source)?;
            report_outcome(&outcome)?;
        }
        Command::ImportElection {
            election,
            file,
            mime,
        } => {
            let registry: EntityRegistry = require_registry(args.registry.as_deref())?;
            let source: ImportSource = ImportSource::from_path(&file, mime.as_deref())?;
            let outcome: ImportOutcome =
                import_election_results(&mut persistence, &registry, election, &source)?;
            report_outcome(&outcome)?;
        }
        Command::Poll { target, interval } => {
            let registry: EntityRegistry = require_registry(args.registry.as_deref())?;
            let target: PollTarget = target.into_target()?;
            let summary: PollSummary = poller::run(
                Arc::new(Mutex::new(persistence)),
                Arc::new(registry),
                &target,
                Duration::from_secs(interval.max(1)),
                shutdown_signal(),
            )
            .await?;
            println!(
                "ticks={} accepted={} rejected={} unreadable={}",
                summary.ticks, summary.accepted, summary.rejected, summary.unreadable
            );
        }
        Command::Archive { out } => {
            let summary: ArchiveSummary = export_archive(&mut persistence, &out)?;
            println!("{}", summary.zip_path.display());
        }
        Command::Serve { port, archive_dir } => {
            let registry: EntityRegistry = require_registry(args.registry.as_deref())?;
            let app_state: AppState = AppState {
                persistence: Arc::new(Mutex::new(persistence)),
                registry: Arc::new(registry),
                archive_root: archive_dir,
            };
            let app: Router = build_router(app_state);

            let addr: std::net::SocketAddr = format!("127.0.0.1:{port}").parse()?;
            info!("Server listening on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}
