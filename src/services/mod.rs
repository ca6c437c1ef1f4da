pub mod aggregator;
pub mod alias;
pub mod roster;

pub use aggregator::TaskSubmissionCount;
pub use alias::AliasGenerator;
pub use roster::RosterService;
