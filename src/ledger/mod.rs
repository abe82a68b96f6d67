//! A reference host for the engine: a single ordering authority that applies
//! transactions one at a time, records a hash-chained receipt for each, and
//! optionally persists them to an append-only journal file.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::{self, Election};
use crate::error::{ElectionError, JournalError, Result};
use crate::model::{Event, Identity};

pub use hash::{Digest, DigestParseError};
pub use journal::{JournalHeader, JOURNAL_VERSION};

use journal::Journal;

mod hash;
mod journal;

/// One state-changing election operation and its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    #[serde(rename_all = "camelCase")]
    RegisterCandidate {
        candidate: Identity,
        name: String,
        party_name: String,
    },
    #[serde(rename_all = "camelCase")]
    RegisterVoter {
        voter: Identity,
        name: String,
        national_id: String,
        age: i64,
    },
    StartVoting,
    EndVoting,
    ResetElection,
    /// Cast the caller's ballot.
    Vote { candidate: Identity },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterCandidate { .. } => "registerCandidate",
            Self::RegisterVoter { .. } => "registerVoter",
            Self::StartVoting => "startVoting",
            Self::EndVoting => "endVoting",
            Self::ResetElection => "resetElection",
            Self::Vote { .. } => "vote",
        }
    }

    /// Run this operation against `election` on behalf of `caller`.
    pub fn apply(self, caller: Identity, election: &mut Election) -> engine::Result<Event> {
        match self {
            Self::RegisterCandidate {
                candidate,
                name,
                party_name,
            } => election.register_candidate(caller, candidate, name, party_name),
            Self::RegisterVoter {
                voter,
                name,
                national_id,
                age,
            } => election.register_voter(caller, voter, name, national_id, age),
            Self::StartVoting => election.start_voting(caller),
            Self::EndVoting => election.end_voting(caller),
            Self::ResetElection => election.reset_election(caller),
            Self::Vote { candidate } => election.vote(caller, candidate),
        }
    }
}

/// An operation together with the identity submitting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub caller: Identity,
    #[serde(flatten)]
    pub operation: Operation,
}

impl Transaction {
    pub fn new(caller: Identity, operation: Operation) -> Self {
        Self { caller, operation }
    }

    fn apply(&self, election: &mut Election) -> Outcome {
        self.operation.clone().apply(self.caller, election).into()
    }
}

/// What happened to an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    Applied { event: Event },
    Rejected { error: ElectionError },
}

impl From<engine::Result<Event>> for Outcome {
    fn from(result: engine::Result<Event>) -> Self {
        match result {
            Ok(event) => Self::Applied { event },
            Err(error) => Self::Rejected { error },
        }
    }
}

/// The permanent record of one accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Position in the ledger, starting at 1.
    pub seq: u64,
    pub transaction: Transaction,
    pub outcome: Outcome,
    pub prev_hash: Digest,
    /// SHA-256 of `prev_hash` followed by the JSON of `seq`, `transaction` and `outcome`.
    pub hash: Digest,
}

/// The hashed portion of a [`Receipt`].
#[derive(Serialize)]
struct ReceiptBody<'a> {
    seq: u64,
    transaction: &'a Transaction,
    outcome: &'a Outcome,
}

impl Receipt {
    fn seal(seq: u64, transaction: Transaction, outcome: Outcome, prev_hash: Digest) -> Result<Self> {
        let hash = Self::compute_hash(seq, &transaction, &outcome, &prev_hash)?;
        Ok(Self {
            seq,
            transaction,
            outcome,
            prev_hash,
            hash,
        })
    }

    fn compute_hash(
        seq: u64,
        transaction: &Transaction,
        outcome: &Outcome,
        prev_hash: &Digest,
    ) -> Result<Digest> {
        let body = serde_json::to_vec(&ReceiptBody {
            seq,
            transaction,
            outcome,
        })?;
        Ok(Digest::chain(prev_hash, &body))
    }

    /// Does `hash` match the rest of the receipt?
    pub fn is_sealed(&self) -> Result<bool> {
        let hash = Self::compute_hash(self.seq, &self.transaction, &self.outcome, &self.prev_hash)?;
        Ok(hash == self.hash)
    }

    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, Outcome::Applied { .. })
    }
}

/// Something that wants to hear about every receipt as it is recorded,
/// e.g. to refresh a dashboard.
pub trait ReceiptObserver {
    fn on_receipt(&self, receipt: &Receipt);
}

/// The ordering authority. Transactions are applied strictly in submission
/// order, each one fully or not at all.
pub struct Ledger {
    election: Election,
    receipts: Vec<Receipt>,
    genesis: Digest,
    journal: Option<Journal>,
    observers: Vec<Box<dyn ReceiptObserver>>,
}

impl Ledger {
    /// An in-memory ledger for a brand new election.
    pub fn new(admin: Identity) -> Self {
        Self {
            election: Election::new(admin),
            receipts: Vec::new(),
            genesis: JournalHeader::new(admin).genesis(),
            journal: None,
            observers: Vec::new(),
        }
    }

    /// Open the journal at `path` for appending, creating it if it does not exist.
    /// An existing journal is fully verified and must belong to `admin`.
    pub fn open(path: impl AsRef<Path>, admin: Identity) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let mut ledger = Self::new(admin);
            ledger.journal = Some(Journal::create(path, &JournalHeader::new(admin))?);
            info!("Started new journal at {}", path.display());
            return Ok(ledger);
        }

        let (mut ledger, len) = Self::read_journal(path)?;
        if ledger.election.admin() != admin {
            return Err(JournalError::AdminMismatch {
                expected: admin,
                found: ledger.election.admin(),
            }
            .into());
        }
        ledger.journal = Some(Journal::reopen(path, len)?);
        Ok(ledger)
    }

    /// Open the journal named by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(config.journal_path(), config.admin())
    }

    /// Rebuild state from the journal at `path` without opening it for writing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::read_journal(path.as_ref())?.0)
    }

    /// Replay the journal at `path`, also returning how many bytes of it hold
    /// complete receipts.
    fn read_journal(path: &Path) -> Result<(Self, u64)> {
        let contents = journal::read(path)?;
        let ledger = Self::replay(contents.header, contents.receipts)?;
        info!(
            "Replayed {} transaction(s) from {}",
            ledger.receipts.len(),
            path.display()
        );
        Ok((ledger, contents.len))
    }

    /// Verify and re-apply a sequence of receipts from scratch.
    fn replay(header: JournalHeader, receipts: Vec<Receipt>) -> Result<Self> {
        if header.version != JOURNAL_VERSION {
            return Err(JournalError::Version(header.version).into());
        }
        let mut ledger = Self::new(header.admin);
        for receipt in receipts {
            let expected = ledger.next_seq();
            if receipt.seq != expected {
                return Err(JournalError::Sequence {
                    expected,
                    found: receipt.seq,
                }
                .into());
            }
            if receipt.prev_hash != ledger.head() || !receipt.is_sealed()? {
                return Err(JournalError::BrokenChain { seq: receipt.seq }.into());
            }
            if receipt.transaction.apply(&mut ledger.election) != receipt.outcome {
                return Err(JournalError::OutcomeMismatch { seq: receipt.seq }.into());
            }
            ledger.receipts.push(receipt);
        }
        Ok(ledger)
    }

    /// Register an observer to be told about every subsequent receipt.
    pub fn observe(&mut self, observer: impl ReceiptObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Accept a transaction into the ledger and apply it.
    ///
    /// A rejected operation still gets a receipt; it is only an `Err` here if the
    /// transaction could not be recorded at all, in which case nothing changed.
    pub fn submit(&mut self, transaction: Transaction) -> Result<&Receipt> {
        let seq = self.next_seq();
        let prev_hash = self.head();

        // Nothing becomes visible until the receipt is sealed and on disk.
        let mut staged = self.election.clone();
        let outcome = transaction.apply(&mut staged);
        let receipt = Receipt::seal(seq, transaction, outcome, prev_hash)?;
        if let Some(journal) = &mut self.journal {
            journal.append(&receipt)?;
        }
        self.election = staged;

        for observer in &self.observers {
            observer.on_receipt(&receipt);
        }
        let index = self.receipts.len();
        self.receipts.push(receipt);
        Ok(&self.receipts[index])
    }

    pub fn election(&self) -> &Election {
        &self.election
    }

    /// Every receipt so far, in order.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Hash of the latest receipt, or the genesis digest if there are none.
    pub fn head(&self) -> Digest {
        self.receipts
            .last()
            .map_or(self.genesis, |receipt| receipt.hash)
    }

    fn next_seq(&self) -> u64 {
        self.receipts.len() as u64 + 1
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    use crate::error::Error;
    use crate::model::ElectionPhase;

    /// Remembers the sequence numbers it has seen.
    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<u64>>>);

    impl ReceiptObserver for Recorder {
        fn on_receipt(&self, receipt: &Receipt) {
            self.0.borrow_mut().push(receipt.seq);
        }
    }

    fn register_candidate(n: u8) -> Operation {
        Operation::RegisterCandidate {
            candidate: Identity::example(100 + n),
            name: format!("Candidate {n}"),
            party_name: format!("Party {n}"),
        }
    }

    fn register_voter(n: u8) -> Operation {
        Operation::RegisterVoter {
            voter: Identity::example(n),
            name: format!("Voter {n}"),
            national_id: format!("ID{n}"),
            age: 30,
        }
    }

    /// Two candidates, two voters, one vote each way, then end.
    fn run_tied_election(ledger: &mut Ledger, admin: Identity) {
        for operation in [
            register_candidate(1),
            register_candidate(2),
            Operation::StartVoting,
            register_voter(1),
            register_voter(2),
        ] {
            ledger.submit(Transaction::new(admin, operation)).unwrap();
        }
        for n in [1, 2] {
            let vote = Operation::Vote {
                candidate: Identity::example(100 + n),
            };
            ledger
                .submit(Transaction::new(Identity::example(n), vote))
                .unwrap();
        }
        ledger
            .submit(Transaction::new(admin, Operation::EndVoting))
            .unwrap();
    }

    #[test]
    fn transaction_wire_shape() {
        let tx = Transaction::new(
            Identity::example(1),
            Operation::Vote {
                candidate: Identity::example(101),
            },
        );
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "caller": Identity::example(1).to_string(),
                "op": "vote",
                "candidate": Identity::example(101).to_string(),
            })
        );
        assert_eq!(serde_json::from_value::<Transaction>(json).unwrap(), tx);

        let json = serde_json::json!({
            "caller": Identity::example(1).to_string(),
            "op": "registerVoter",
            "voter": Identity::example(2).to_string(),
            "name": "Voter Two",
            "nationalId": "5678",
            "age": -3,
        });
        let tx: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx.operation.name(), "registerVoter");
    }

    #[election_test]
    fn receipts_chain(admin: Identity, mut ledger: Ledger) {
        let genesis = ledger.head();
        let first = ledger
            .submit(Transaction::new(admin, register_candidate(1)))
            .unwrap()
            .clone();
        assert_eq!(first.seq, 1);
        assert_eq!(first.prev_hash, genesis);
        assert!(first.is_applied());
        assert!(first.is_sealed().unwrap());

        // Rejected transactions are recorded too, and change nothing.
        let intruder = Identity::example(66);
        let second = ledger
            .submit(Transaction::new(intruder, Operation::StartVoting))
            .unwrap()
            .clone();
        assert_eq!(second.seq, 2);
        assert_eq!(second.prev_hash, first.hash);
        assert_eq!(
            second.outcome,
            Outcome::Rejected {
                error: ElectionError::Unauthorized { caller: intruder }
            }
        );
        assert_eq!(ledger.election().phase(), ElectionPhase::NotStarted);
        assert_eq!(ledger.head(), second.hash);
        assert_eq!(ledger.receipts().len(), 2);
    }

    #[election_test]
    fn observers_see_every_receipt(admin: Identity, mut ledger: Ledger) {
        let recorder = Recorder::default();
        ledger.observe(recorder.clone());
        ledger
            .submit(Transaction::new(admin, Operation::EndVoting))
            .unwrap();
        ledger
            .submit(Transaction::new(admin, Operation::StartVoting))
            .unwrap();
        assert_eq!(*recorder.0.borrow(), vec![1, 2]);
    }

    #[election_test(started)]
    fn votes_are_cast_by_the_caller(admin: Identity, mut ledger: Ledger) {
        ledger
            .submit(Transaction::new(admin, register_candidate(1)))
            .unwrap();
        ledger
            .submit(Transaction::new(admin, register_voter(1)))
            .unwrap();

        let vote = Operation::Vote {
            candidate: Identity::example(101),
        };
        let receipt = ledger
            .submit(Transaction::new(Identity::example(1), vote.clone()))
            .unwrap();
        assert_eq!(
            receipt.outcome,
            Outcome::Applied {
                event: Event::VoteCast {
                    voter: Identity::example(1),
                    candidate: Identity::example(101),
                }
            }
        );
        let receipt = ledger
            .submit(Transaction::new(Identity::example(1), vote))
            .unwrap();
        assert!(!receipt.is_applied());
        assert_eq!(
            ledger
                .election()
                .get_candidate(Identity::example(101))
                .unwrap()
                .vote_count,
            1
        );
    }

    #[election_test]
    fn journal_round_trip(admin: Identity) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("election.jsonl");

        let mut ledger = Ledger::open(&path, admin).unwrap();
        run_tied_election(&mut ledger, admin);
        let head = ledger.head();
        drop(ledger);

        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.head(), head);
        assert_eq!(reloaded.receipts().len(), 8);
        let election = reloaded.election();
        assert!(election.get_election_results().unwrap().is_tie);
        assert_eq!(election.get_tied_candidates().unwrap().len(), 2);

        // Reopening for append continues the same chain.
        let mut reopened = Ledger::open(&path, admin).unwrap();
        reopened
            .submit(Transaction::new(admin, Operation::ResetElection))
            .unwrap();
        drop(reopened);
        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.receipts().len(), 9);
        assert_eq!(reloaded.receipts()[8].prev_hash, head);
        assert_eq!(reloaded.election().phase(), ElectionPhase::NotStarted);
        assert_eq!(reloaded.election().registry().total_votes(), 0);
    }

    #[election_test]
    fn journal_admin_must_match(admin: Identity) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("election.jsonl");
        Ledger::open(&path, admin).unwrap();

        let other = Identity::example(66);
        assert!(matches!(
            Ledger::open(&path, other),
            Err(Error::Journal(JournalError::AdminMismatch { expected, found }))
                if expected == other && found == admin
        ));
    }

    #[election_test]
    fn reopen_after_missing_final_newline(admin: Identity) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("election.jsonl");
        let mut ledger = Ledger::open(&path, admin).unwrap();
        ledger
            .submit(Transaction::new(admin, Operation::StartVoting))
            .unwrap();
        drop(ledger);
        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, text.trim_end()).unwrap();

        let mut ledger = Ledger::open(&path, admin).unwrap();
        assert!(ledger
            .submit(Transaction::new(admin, Operation::EndVoting))
            .unwrap()
            .is_applied());
        drop(ledger);

        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.receipts().len(), 2);
        assert_eq!(reloaded.election().phase(), ElectionPhase::Ended);
    }

    #[election_test]
    fn torn_append_is_recovered(admin: Identity) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("election.jsonl");
        let mut ledger = Ledger::open(&path, admin).unwrap();
        ledger
            .submit(Transaction::new(admin, register_candidate(1)))
            .unwrap();
        let head = ledger.head();
        drop(ledger);

        // A crash part way through writing the second receipt.
        let mut text = fs::read_to_string(&path).unwrap();
        text.push_str("{\"seq\":2,\"transa");
        fs::write(&path, text).unwrap();

        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.receipts().len(), 1);
        assert_eq!(reloaded.head(), head);

        let mut ledger = Ledger::open(&path, admin).unwrap();
        let receipt = ledger
            .submit(Transaction::new(admin, Operation::StartVoting))
            .unwrap();
        assert_eq!(receipt.seq, 2);
        assert_eq!(receipt.prev_hash, head);
        drop(ledger);

        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.receipts().len(), 2);
        assert_eq!(reloaded.election().phase(), ElectionPhase::Started);
    }

    #[election_test]
    fn failed_append_changes_nothing(admin: Identity) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("election.jsonl");
        let mut ledger = Ledger::open(&path, admin).unwrap();
        ledger
            .submit(Transaction::new(admin, register_candidate(1)))
            .unwrap();
        let recorder = Recorder::default();
        ledger.observe(recorder.clone());
        let head = ledger.head();
        let before = serde_json::to_value(ledger.election()).unwrap();

        ledger.journal = Some(Journal::read_only(&path).unwrap());
        assert!(matches!(
            ledger.submit(Transaction::new(admin, Operation::StartVoting)),
            Err(Error::Io(_))
        ));
        assert_eq!(serde_json::to_value(ledger.election()).unwrap(), before);
        assert_eq!(ledger.election().phase(), ElectionPhase::NotStarted);
        assert_eq!(ledger.receipts().len(), 1);
        assert_eq!(ledger.head(), head);
        assert!(recorder.0.borrow().is_empty());
    }

    /// Apply long random sequences of every kind of operation, from the admin,
    /// voters and strangers alike. After each one, ballots cast and total votes
    /// must agree, and a rejected operation must have left the election untouched.
    #[election_test]
    fn random_operations(admin: Identity) {
        let mut rng = StdRng::seed_from_u64(0xba11_07);
        let candidates: Vec<_> = (101..=104).map(Identity::example).collect();
        let voters: Vec<_> = (1..=12).map(Identity::example).collect();
        let stranger = Identity::example(66);
        let (mut restarts, mut resets, mut votes) = (0, 0, 0);

        for _ in 0..20 {
            let mut ledger = Ledger::new(admin);
            for _ in 0..200 {
                let candidate = if rng.gen_bool(0.9) {
                    candidates[rng.gen_range(0..candidates.len())]
                } else {
                    Identity::example(200)
                };
                let voter = voters[rng.gen_range(0..voters.len())];
                let operation = match rng.gen_range(0..12) {
                    0 | 1 => Operation::RegisterCandidate {
                        candidate,
                        name: "C".into(),
                        party_name: "P".into(),
                    },
                    2 | 3 => Operation::RegisterVoter {
                        voter,
                        name: "V".into(),
                        national_id: "0".into(),
                        age: rng.gen_range(-2..100),
                    },
                    4 => Operation::StartVoting,
                    5 => Operation::EndVoting,
                    6 => Operation::ResetElection,
                    _ => Operation::Vote { candidate },
                };
                let caller = match (&operation, rng.gen_bool(0.1)) {
                    (_, true) => stranger,
                    (Operation::Vote { .. }, false) => voter,
                    (_, false) => admin,
                };

                let before = serde_json::to_value(ledger.election()).unwrap();
                let outcome = ledger
                    .submit(Transaction::new(caller, operation))
                    .unwrap()
                    .outcome
                    .clone();
                match outcome {
                    Outcome::Rejected { .. } => {
                        assert_eq!(serde_json::to_value(ledger.election()).unwrap(), before)
                    }
                    Outcome::Applied { event } => match event {
                        Event::VotingStarted { restart: true } => restarts += 1,
                        Event::ElectionReset { .. } => resets += 1,
                        Event::VoteCast { .. } => votes += 1,
                        _ => {}
                    },
                }
                let registry = ledger.election().registry();
                assert_eq!(registry.total_votes(), registry.ballots_cast());
            }
        }
        assert!(restarts > 0 && resets > 0 && votes > 0);
    }

    #[election_test]
    fn tampering_is_detected(admin: Identity) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("election.jsonl");
        let mut ledger = Ledger::open(&path, admin).unwrap();
        run_tied_election(&mut ledger, admin);
        drop(ledger);
        let original = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = original.lines().collect();

        // Rewrite history: the second voter's ballot goes to the first candidate.
        let tampered = original.replacen(
            &format!(
                "\"candidate\":\"{}\"}},\"outcome\":{{\"status\":\"applied\",\"event\":{{\"event\":\"voteCast\",\"voter\":\"{}\"",
                Identity::example(102),
                Identity::example(2)
            ),
            &format!(
                "\"candidate\":\"{}\"}},\"outcome\":{{\"status\":\"applied\",\"event\":{{\"event\":\"voteCast\",\"voter\":\"{}\"",
                Identity::example(101),
                Identity::example(2)
            ),
            1,
        );
        assert_ne!(tampered, original);
        fs::write(&path, tampered).unwrap();
        assert!(matches!(
            Ledger::load(&path),
            Err(Error::Journal(JournalError::BrokenChain { seq: 7 }))
        ));

        // Drop a receipt from the middle.
        let mut gapped = lines.clone();
        gapped.remove(3);
        fs::write(&path, gapped.join("\n")).unwrap();
        assert!(matches!(
            Ledger::load(&path),
            Err(Error::Journal(JournalError::Sequence {
                expected: 3,
                found: 4
            }))
        ));

        // Truncating the tail is still a valid (shorter) history.
        fs::write(&path, lines[..4].join("\n")).unwrap();
        assert_eq!(Ledger::load(&path).unwrap().receipts().len(), 3);

        // Garbage is a format error, not a verification failure.
        fs::write(&path, format!("{}\nnot json\n", lines[0])).unwrap();
        assert!(matches!(Ledger::load(&path), Err(Error::Json(_))));
    }

    #[election_test]
    fn replay_detects_forged_outcomes(admin: Identity) {
        let intruder = Identity::example(66);
        let header = JournalHeader::new(admin);
        // Well-chained, but claims an intruder's transition was applied.
        let forged = Receipt::seal(
            1,
            Transaction::new(intruder, Operation::StartVoting),
            Outcome::Applied {
                event: Event::VotingStarted { restart: false },
            },
            header.genesis(),
        )
        .unwrap();
        assert!(matches!(
            Ledger::replay(header.clone(), vec![forged]),
            Err(Error::Journal(JournalError::OutcomeMismatch { seq: 1 }))
        ));

        let bad_version = JournalHeader {
            version: JOURNAL_VERSION + 1,
            admin,
        };
        assert!(matches!(
            Ledger::replay(bad_version, vec![]),
            Err(Error::Journal(JournalError::Version(2)))
        ));
    }
}
