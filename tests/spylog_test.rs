//! End-to-end tests: RDS Spy log file through the decoder.

use std::fs;

use rdsdec::data::valid;
use rdsdec::{spylog, Bler, DecoderConfig, RdsDecoder};

/// Decode a log's groups with the given PS algorithm and return the
/// decoder.
fn decode_log(path: &str, advanced_ps: bool) -> RdsDecoder {
    let groups = spylog::load_spy_log(path).expect("log should load");
    let mut decoder = RdsDecoder::new(DecoderConfig {
        advanced_ps_decoding: advanced_ps,
    });
    for blocks in &groups {
        decoder.decode(blocks);
    }
    decoder
}

#[test]
fn decodes_station_from_log() {
    // Four group 0A segments spelling "RADIO 1 ", with a header line and
    // a timestamp suffix that the reader must skip.
    let log = "\
# RDS Spy capture 2020-06-14
F212 0400 E20E 5241 10:15:02.124
F212 0401 E20E 4449 10:15:02.211
F212 0402 E20E 4F20 10:15:02.298
F212 0403 E20E 3120 10:15:02.384
";
    let path = "/tmp/rdsdec_test_station.spy";
    fs::write(path, log).expect("failed to write test log");

    let decoder = decode_log(path, false);
    let rds = decoder.data();

    assert_eq!(rds.pi_code, 0xF212);
    assert!(rds.is_valid(valid::PI_CODE | valid::PS | valid::PTY));
    assert_eq!(&rds.ps.display, b"RADIO 1 ");
    assert_eq!(rds.stats.data_cnt, 4);
    assert_eq!(rds.stats.groups[0].a, 4);

    fs::remove_file(path).ok();
}

#[test]
fn uncorrectable_block_b_drops_group() {
    let log = "\
F212 ---- E20E 5241
F212 0400 E20E 5241
";
    let path = "/tmp/rdsdec_test_badblock.spy";
    fs::write(path, log).expect("failed to write test log");

    let decoder = decode_log(path, false);
    let rds = decoder.data();

    assert_eq!(rds.stats.data_cnt, 2);
    assert_eq!(
        rds.stats.blckb_errors, 1,
        "the uncorrectable block B group must be dropped"
    );
    assert_eq!(rds.stats.groups[0].a, 1, "only one group dispatched");

    fs::remove_file(path).ok();
}

#[test]
fn error_suffixes_reach_the_decoder() {
    // Block A with 6+ errors: the PI code must not be taken from it.
    let log = "F212/3 0400 E20E 5241\n";
    let path = "/tmp/rdsdec_test_suffix.spy";
    fs::write(path, log).expect("failed to write test log");

    let groups = spylog::load_spy_log(path).expect("log should load");
    assert_eq!(groups[0].a.errors, Bler::SixPlus);

    let decoder = decode_log(path, false);
    assert!(!decoder.data().is_valid(valid::PI_CODE));

    fs::remove_file(path).ok();
}

#[test]
fn advanced_ps_needs_repetition_across_log() {
    let mut log = String::from("# capture\n");
    // One rotation only: not enough for the advanced algorithm.
    for (seg, chars) in ["5241", "4449", "4F20", "3120"].iter().enumerate() {
        log.push_str(&format!("F212 040{seg} E20E {chars}\n"));
    }
    let path = "/tmp/rdsdec_test_onepass.spy";
    fs::write(path, &log).expect("failed to write test log");

    let decoder = decode_log(path, true);
    assert!(
        !decoder.data().is_valid(valid::PS),
        "advanced PS decoding must not trust a single rotation"
    );
    fs::remove_file(path).ok();

    // Two rotations converge.
    let mut twice = String::from(&log);
    for (seg, chars) in ["5241", "4449", "4F20", "3120"].iter().enumerate() {
        twice.push_str(&format!("F212 040{seg} E20E {chars}\n"));
    }
    let path = "/tmp/rdsdec_test_twopass.spy";
    fs::write(path, &twice).expect("failed to write test log");

    let decoder = decode_log(path, true);
    let rds = decoder.data();
    assert!(rds.is_valid(valid::PS));
    assert_eq!(&rds.ps.display, b"RADIO 1 ");

    fs::remove_file(path).ok();
}

#[test]
fn missing_file_is_io_error() {
    let err = spylog::load_spy_log("/tmp/rdsdec_test_does_not_exist.spy")
        .expect_err("missing file must not load");
    assert!(matches!(err, spylog::Error::Io(_)));
}

#[test]
fn file_without_groups_is_empty() {
    let path = "/tmp/rdsdec_test_headers_only.spy";
    fs::write(path, "# just a header\n# and a comment\n").expect("failed to write test log");

    let err = spylog::load_spy_log(path).expect_err("no groups to load");
    assert!(matches!(err, spylog::Error::Empty));

    fs::remove_file(path).ok();
}
