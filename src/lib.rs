//! `refcons` is a crate for calling reference-guided consensus sequences from
//! short-read alignment hits.
//!
//! Given a set of reference sequences and a hit stream (one line per candidate
//! alignment of a read), the crate works out which placements of each read
//! (or mate pair) to trust, piles up the evidence from those placements, and
//! calls a consensus base (or insertion, or deletion) at every reference
//! position.
//!
//! ## Reading hit streams
//!
//! A hit stream is a text file with ten tab-delimited fields per line (see
//! [`record::hit`]). Lines are read with the [`Reader`] facility and parsed
//! into [`record::HitRecord`]s. A record only becomes useful once its
//! compact edit string is decoded against the reference it cites; that is
//! what [`hit::Hit::try_from_record()`] does. The decoded
//! [alignment](crate::alignment::Alignment) is always reported in forward
//! reference orientation and with its gaps
//! [normalized](crate::alignment::normalize).
//!
//! Hit streams are usually far too large to hold in memory, so hits are never
//! kept around. Instead, an [`index::Index`] of byte offsets is built in a
//! single forward scan, and hits are materialized on demand with an
//! [`index::Materializer`].
//!
//! ```
//! use std::io::Cursor;
//!
//! use refcons::index;
//! use refcons::reference::ReferenceSet;
//!
//! let data = b"read0\tseq0\t+\t1\t4\t1\t4\t4\t40\t2T1\n";
//!
//! let mut references = ReferenceSet::default();
//! references.add("seq0", b"ACGTACGT")?;
//!
//! let index = index::Builder.try_build_from(refcons::Reader::new(&data[..]))?;
//! let mut materializer = index::Materializer::new(Cursor::new(&data[..]), &index, &references);
//!
//! for hit in materializer.materialize("read0")? {
//!     println!("{}", String::from_utf8_lossy(hit.alignment().read()));
//! }
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Calling a consensus
//!
//! Most users will not want to drive the index, the
//! [resolvers](crate::resolve) and the [pileups](crate::pileup) by hand.
//! The [`engine::Engine`] runs all of them over a hit stream, given a
//! [`config::Config`], and hands back one [`consensus::Consensus`] per
//! reference. Each consensus carries the called sequence, the changes relative
//! to the reference, the evidence behind every call, and an alignment of the
//! reference against the called sequence that can be turned into a
//! [`projection::Projection`] of reference coordinates. The [`write`] module
//! renders all of this in the usual text formats.
//!
//! ```
//! use std::io::Cursor;
//!
//! use refcons::config::Config;
//! use refcons::engine::Engine;
//! use refcons::reference::ReferenceSet;
//!
//! let mut references = ReferenceSet::default();
//! references.add("seq0", b"ACGTACGT")?;
//!
//! let data = b"r0\tseq0\t+\t1\t8\t1\t10\t10\t80\t4(gg)4\n\
//!              r1\tseq0\t+\t1\t8\t1\t10\t10\t80\t4(gg)4\n";
//!
//! let config = Config::default();
//! let output = Engine::new(&config, &references).run(Cursor::new(&data[..]))?;
//!
//! let consensus = &output.consensuses()[0];
//! assert_eq!(consensus.sequence(), b"ACGTGGACGT");
//!
//! let projection = consensus.projection();
//! let pairs = projection.project(4, 8).unwrap();
//! assert_eq!(pairs[0].consensus(), 6..10);
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod alignment;
pub mod config;
pub mod consensus;
pub mod engine;
pub mod hit;
pub mod index;
pub mod line;
pub mod pileup;
pub mod projection;
pub mod reader;
pub mod record;
pub mod reference;
pub mod resolve;
pub mod write;

pub use self::reader::Reader;
