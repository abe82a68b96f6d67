//! A simple CLI tool for replaying and verifying an election journal.
//! This uses the same engine as the ledger host that wrote the journal, so a
//! journal that replays here is exactly the election that was run.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};

use election_engine::{
    error::Error as EngineError,
    model::{Candidate, ElectionPhase, ElectionResult, Identity},
    Config, Ledger,
};

const PROGRAM_NAME: &str = "election-replay";

const ABOUT_TEXT: &str = "Replay an election journal, verifying its hash chain and every \
recorded outcome, and print the resulting state.

EXIT CODES:
     0: Verification succeeded.
   255: Ran successfully, but verification failed.
 Other: Error.";

const JOURNAL_PATH: &str = "JOURNAL_PATH";

const JOURNAL_PATH_HELP: &str = "The path to a journal written by the election host.\n\
Defaults to `journal_path` from Election.toml / ELECTION_JOURNAL_PATH";

const LOG_CONFIG: &str = "log-config";

const LOG_CONFIG_HELP: &str = "A log4rs YAML file; enables logging of every replayed transaction";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(JOURNAL_PATH)
                .help(JOURNAL_PATH_HELP)
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(LOG_CONFIG)
                .long(LOG_CONFIG)
                .help(LOG_CONFIG_HELP)
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

/// Errors that this program may produce.
#[derive(Debug)]
enum Error {
    /// Could not get as far as reading the journal.
    Setup(EngineError),
    /// The journal could not be read or parsed.
    Read(EngineError),
    /// The journal was readable but failed verification.
    Verification(EngineError),
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Journal(_) => Self::Verification(err),
            _ => Self::Read(err),
        }
    }
}

/// What the replayed election looks like.
#[derive(Debug, Eq, PartialEq)]
struct Summary {
    pub transactions: usize,
    pub phase: ElectionPhase,
    pub candidates: Vec<Candidate>,
    pub ballots_cast: u64,
    /// Only available once voting has ended.
    pub result: Option<ElectionResult>,
}

impl Summary {
    fn of(ledger: &Ledger) -> Self {
        let election = ledger.election();
        Self {
            transactions: ledger.receipts().len(),
            phase: election.phase(),
            candidates: election.list_candidates().to_vec(),
            ballots_cast: election.registry().ballots_cast(),
            result: election.get_election_results().ok(),
        }
    }

    fn name_of(&self, id: Identity) -> &str {
        self.candidates
            .iter()
            .find(|c| c.id == id)
            .map_or("<unknown>", |c| c.name.as_str())
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} transaction{}, election {}",
            self.transactions,
            if self.transactions != 1 { "s" } else { "" },
            self.phase
        )?;
        for candidate in &self.candidates {
            writeln!(
                f,
                "{} ({}): {} vote{}",
                candidate.name,
                candidate.party_name,
                candidate.vote_count,
                if candidate.vote_count != 1 { "s" } else { "" }
            )?;
        }
        write!(
            f,
            "{} ballot{} cast",
            self.ballots_cast,
            if self.ballots_cast != 1 { "s" } else { "" }
        )?;

        match self.result {
            Some(ElectionResult { winner: None, .. }) => write!(f, "\nNo candidates stood."),
            Some(ElectionResult {
                is_tie: true,
                max_votes,
                ..
            }) => {
                let tied = self
                    .candidates
                    .iter()
                    .filter(|c| c.vote_count == max_votes)
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>();
                write!(f, "\nTie at {} between {}", max_votes, tied.join(", "))
            }
            Some(ElectionResult {
                winner: Some(winner),
                max_votes,
                ..
            }) => write!(f, "\nWinner: {} with {}", self.name_of(winner), max_votes),
            None => Ok(()),
        }
    }
}

/// Work out which journal to read.
fn journal_path(args: &ArgMatches) -> Result<PathBuf, Error> {
    match args.get_one::<PathBuf>(JOURNAL_PATH) {
        Some(path) => Ok(path.clone()),
        None => Config::load()
            .map(|config| config.journal_path().to_path_buf())
            .map_err(Error::Setup),
    }
}

/// Replay and verify the journal.
fn replay(args: &ArgMatches) -> Result<Summary, Error> {
    if let Some(log_config) = args.get_one::<PathBuf>(LOG_CONFIG) {
        election_engine::logging::init(log_config).map_err(Error::Setup)?;
    }
    let path = journal_path(args)?;
    let ledger = Ledger::load(path)?;
    Ok(Summary::of(&ledger))
}

/// Run the replay, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    match replay(args) {
        Ok(summary) => {
            println!("Verification succeeded.");
            println!("{}", summary);
            0
        }
        Err(Error::Setup(err)) => {
            println!("Setup failed: {}", err);
            1
        }
        Err(Error::Read(err)) => {
            println!("Could not read journal: {}", err);
            1
        }
        Err(Error::Verification(err)) => {
            println!("Verification failed: {}", err);
            255
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}
