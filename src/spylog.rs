//! Reader for RDS Spy log files, the offline test input.
//!
//! One group per line: four whitespace-separated block tokens in transmit
//! order (A B C D). A token is four hex digits, optionally suffixed with
//! `/0`..`/3` giving the tuner's reported block error rate, or `----`
//! for a block the tuner could not correct (kept as value 0 with the
//! highest error rate). Anything after the fourth token, and any line
//! that does not parse as a group (headers, timestamps, comments), is
//! skipped.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::data::{Bler, Block, Blocks};

/// Result type for log reading.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a log file.
#[derive(Debug, Error)]
pub enum Error {
    /// The log file could not be read.
    #[error("cannot read log file: {0}")]
    Io(#[from] std::io::Error),

    /// The file was read but contained no decodable groups.
    #[error("log contains no RDS groups")]
    Empty,
}

/// Load every group from an RDS Spy log file.
pub fn load_spy_log(path: impl AsRef<Path>) -> Result<Vec<Blocks>> {
    let contents = fs::read_to_string(path.as_ref())?;
    let groups: Vec<Blocks> = contents.lines().filter_map(parse_group_line).collect();
    debug!(path = %path.as_ref().display(), groups = groups.len(), "spy log loaded");
    if groups.is_empty() {
        return Err(Error::Empty);
    }
    Ok(groups)
}

fn parse_group_line(line: &str) -> Option<Blocks> {
    let mut tokens = line.split_whitespace();
    let a = parse_block_token(tokens.next()?)?;
    let b = parse_block_token(tokens.next()?)?;
    let c = parse_block_token(tokens.next()?)?;
    let d = parse_block_token(tokens.next()?)?;
    Some(Blocks { a, b, c, d })
}

fn parse_block_token(token: &str) -> Option<Block> {
    if token == "----" {
        return Some(Block {
            val: 0,
            errors: Bler::SixPlus,
        });
    }
    let (hex, errors) = match token.split_once('/') {
        Some((hex, suffix)) => (hex, bler_from_suffix(suffix)?),
        None => (token, Bler::None),
    };
    if hex.len() != 4 {
        return None;
    }
    let val = u16::from_str_radix(hex, 16).ok()?;
    Some(Block { val, errors })
}

fn bler_from_suffix(suffix: &str) -> Option<Bler> {
    match suffix {
        "0" => Some(Bler::None),
        "1" => Some(Bler::OneToTwo),
        "2" => Some(Bler::ThreeToFive),
        "3" => Some(Bler::SixPlus),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_group_line() {
        let group = parse_group_line("F212 0408 E20E 2020").expect("valid group");
        assert_eq!(group.a.val, 0xF212);
        assert_eq!(group.b.val, 0x0408);
        assert_eq!(group.c.val, 0xE20E);
        assert_eq!(group.d.val, 0x2020);
        assert_eq!(group.a.errors, Bler::None);
    }

    #[test]
    fn parses_error_suffixes() {
        let group = parse_group_line("F212/1 0408/0 E20E/2 2020/3").expect("valid group");
        assert_eq!(group.a.errors, Bler::OneToTwo);
        assert_eq!(group.b.errors, Bler::None);
        assert_eq!(group.c.errors, Bler::ThreeToFive);
        assert_eq!(group.d.errors, Bler::SixPlus);
    }

    #[test]
    fn uncorrectable_block_maps_to_six_plus() {
        let group = parse_group_line("F212 0408 ---- 2020").expect("valid group");
        assert_eq!(group.c.val, 0);
        assert_eq!(group.c.errors, Bler::SixPlus);
    }

    #[test]
    fn trailing_tokens_are_ignored() {
        let group = parse_group_line("F212 0408 E20E 2020 12:34:56.789");
        assert!(group.is_some(), "timestamp suffix should not break parsing");
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_group_line("").is_none());
        assert!(parse_group_line("# RDS Spy capture").is_none());
        assert!(parse_group_line("F212 0408 E20E").is_none(), "three blocks");
        assert!(parse_group_line("F212 0408 E20E XYZW").is_none(), "bad hex");
        assert!(parse_group_line("F2123 0408 E20E 2020").is_none(), "5 digits");
        assert!(parse_group_line("F212/9 0408 E20E 2020").is_none(), "bad suffix");
    }
}
