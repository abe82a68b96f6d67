//! A single-election engine: an admin registers candidates and voters, drives
//! the election through `NotStarted -> Started -> Ended`, registered voters
//! cast one vote each, and results and ties are read back once voting ends.
//!
//! [`engine::Election`] holds the state and enforces every rule. [`ledger::Ledger`]
//! is a host around it that orders transactions and keeps a hash-chained journal.

#[cfg(test)]
#[macro_use]
extern crate election_test;

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod model;

pub use config::Config;
pub use engine::Election;
pub use error::{ElectionError, Error, Result};
pub use ledger::{Ledger, Operation, Transaction};
