//! Traits needed to work with overlap detection and correction
pub use crate::candidates::CandidateSource;
pub use crate::ledger::ResolutionLedger;
pub use crate::peak::PeakGeometry;
