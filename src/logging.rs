use std::fmt::{Display, Formatter};
use std::path::Path;

use log::{info, warn};

use crate::error::{Error, Result};
use crate::ledger::{Outcome, Receipt, ReceiptObserver};

/// Set up the global logger from a log4rs YAML file.
pub fn init(path: impl AsRef<Path>) -> Result<()> {
    log4rs::init_file(path, Default::default()).map_err(|e| Error::Logging(e.to_string()))
}

/// Log-friendly name for a transaction's position in the ledger.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct TxId(pub u64);

impl Display for TxId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx{}", self.0)
    }
}

/// A receipt observer that logs every transaction outcome.
#[derive(Debug, Copy, Clone, Default)]
pub struct LogObserver;

impl ReceiptObserver for LogObserver {
    fn on_receipt(&self, receipt: &Receipt) {
        let id = TxId(receipt.seq);
        let op = receipt.transaction.operation.name();
        let caller = receipt.transaction.caller;
        match &receipt.outcome {
            Outcome::Applied { event } => info!("{id} {op} by {caller}: {event}"),
            Outcome::Rejected { error } => warn!("{id} {op} by {caller} rejected: {error}"),
        }
    }
}
