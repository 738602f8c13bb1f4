//! RDS/RBDS group-stream decoder.
//!
//! Decodes the Radio Data System side channel of FM broadcasts as defined
//! by the 1998 RBDS specification. The decoder consumes 4-block groups
//! (each block a 16-bit word tagged with the tuner's block error rate)
//! and accumulates the station's auxiliary data:
//! - program identification, program type, traffic flags
//! - program service name and radiotext, with two-level confidence
//!   filtering that rides out reception errors
//! - alternative frequency tables (method A and B)
//! - clock time, slow labeling codes, program item number
//! - transparent data channels, emergency warnings, enhanced other
//!   networks, and open data application routing
//!
//! The bit-level layer (demodulation, block synchronization, error
//! correction) is the tuner's job; this crate starts at groups.

pub mod af;
pub mod data;
pub mod decoder;
pub mod spylog;

// Re-export the main types for convenience.
pub use af::{AfDecodeTable, AfEncoding, AfTable, AfTableGroup, Band, Frequency};
pub use data::{Bler, Block, Blocks, GroupType, GroupVersion, RdsData};
pub use decoder::{DecoderConfig, RdsDecoder};
