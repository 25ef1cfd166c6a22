//! Resolution of multi-mapping reads.
//!
//! A read (or a mate pair) often aligns equally well in several places. The
//! resolvers decide which hits are counted in full and which only contribute
//! ambiguous depth:
//!
//! - [`single::Resolver`] handles reads on their own.
//! - [`pair::Resolver`] handles mate pairs and hands reads without a usable
//!   mate to the single-read resolver.

pub mod pair;
pub mod single;

/// The number of reads between progress messages.
pub(crate) const PROGRESS_INTERVAL: usize = 10_000;
