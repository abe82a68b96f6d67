//! Plain data shared by the engine, the ledger, and anything rendering their state.

mod candidate;
mod event;
mod identity;
mod phase;
mod results;
mod role;
mod voter;

pub use candidate::Candidate;
pub use event::Event;
pub use identity::{Identity, IdentityParseError, IDENTITY_LEN};
pub use phase::ElectionPhase;
pub use results::ElectionResult;
pub use role::Role;
pub use voter::Voter;
