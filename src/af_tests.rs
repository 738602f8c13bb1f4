// Unit tests for the alternative frequency decoder.
// Included via #[cfg(test)] mod in af.rs.

use super::*;

/// AF code for a UHF frequency given in 0.1 MHz units (981 = 98.1 MHz).
fn uhf_code(freq: u16) -> u8 {
    (freq - 876 + 1) as u8
}

/// Block C value announcing a new table: count code plus first carried
/// code.
fn start_block(count: u8, second: u8) -> u16 {
    (u16::from(224 + count) << 8) | u16::from(second)
}

/// Block C value carrying two codes of the current table.
fn pair(first: u8, second: u8) -> u16 {
    (u16::from(first) << 8) | u16::from(second)
}

fn entry_freqs(table: &AfDecodeTable) -> Vec<u16> {
    table.table.entries().iter().map(|e| e.freq).collect()
}

#[test]
fn af_code_to_freq_uhf() {
    assert_eq!(af_code_to_freq(1, Band::Uhf), 876, "87.6 MHz");
    assert_eq!(af_code_to_freq(10, Band::Uhf), 885, "88.5 MHz");
    assert_eq!(af_code_to_freq(204, Band::Uhf), 1079, "107.9 MHz");
}

#[test]
fn af_code_to_freq_lf() {
    assert_eq!(af_code_to_freq(1, Band::LfMf), 153, "153 kHz");
    assert_eq!(af_code_to_freq(15, Band::LfMf), 279, "279 kHz");
}

#[test]
fn af_code_to_freq_mf() {
    assert_eq!(af_code_to_freq(16, Band::LfMf), 531, "531 kHz");
    assert_eq!(af_code_to_freq(25, Band::LfMf), 612, "612 kHz");
}

#[test]
fn count_code_boundaries() {
    assert!(!is_count_code(224));
    assert!(is_count_code(225));
    assert!(is_count_code(249));
    assert!(!is_count_code(250));
    assert_eq!(count_from_code(225), 1);
    assert_eq!(count_from_code(249), 25);
}

#[test]
fn frequency_ordering_lf_mf_below_uhf() {
    let lf = Frequency::from_code(1, Band::LfMf);
    let uhf = Frequency::from_code(1, Band::Uhf);
    assert!(lf.precedes(&uhf), "LF/MF sorts below UHF");
    assert!(!uhf.precedes(&lf));

    let lower = Frequency::from_code(10, Band::Uhf);
    let higher = Frequency::from_code(20, Band::Uhf);
    assert!(lower.precedes(&higher));
    assert!(!higher.precedes(&lower));
}

#[test]
fn method_a_stream_builds_single_table() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(start_block(3, uhf_code(981)));
    group.decode_group_block(pair(uhf_code(983), uhf_code(987)));

    assert_eq!(group.count, 1, "one table expected");
    let table = &group.tables()[0];
    assert_eq!(table.enc_method, AfEncoding::MethodA);
    assert_eq!(entry_freqs(table), vec![981, 983, 987]);
    assert!(
        table.table.entries().iter().all(|e| e.attrib == AfAttribute::SameProgram),
        "method A entries are all same-program"
    );
    assert_eq!(
        table.table.tuned_freq.freq, 0,
        "provisional anchor moves into the entries once method A is known"
    );
}

#[test]
fn method_b_stream_anchors_on_tuned_frequency() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(start_block(3, uhf_code(985)));
    // Pair carrying the tuned frequency first: the other side is the
    // alternative.
    group.decode_group_block(pair(uhf_code(985), uhf_code(981)));
    // Tuned frequency second; the alternative is above it.
    group.decode_group_block(pair(uhf_code(987), uhf_code(985)));

    assert_eq!(group.count, 1);
    let table = &group.tables()[0];
    assert_eq!(table.enc_method, AfEncoding::MethodB);
    assert_eq!(table.table.tuned_freq.freq, 985, "anchor is the tuned frequency");
    assert_eq!(entry_freqs(table), vec![985, 981, 987]);

    let entries = table.table.entries();
    assert_eq!(
        entries[1].attrib,
        AfAttribute::SameProgram,
        "98.1 MHz is below the tuned frequency"
    );
    assert_eq!(
        entries[2].attrib,
        AfAttribute::RegionalVariant,
        "98.7 MHz is above the tuned frequency"
    );
}

#[test]
fn method_b_pair_without_tuned_match_is_dropped() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(start_block(5, uhf_code(985)));
    group.decode_group_block(pair(uhf_code(985), uhf_code(981)));
    let before = entry_freqs(&group.tables()[0]);

    group.decode_group_block(pair(uhf_code(991), uhf_code(993)));
    assert_eq!(
        entry_freqs(&group.tables()[0]),
        before,
        "a method B pair must include the tuned frequency"
    );
}

#[test]
fn single_entry_count_means_method_a() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(start_block(1, uhf_code(981)));

    assert_eq!(group.count, 1);
    let table = &group.tables()[0];
    assert_eq!(
        table.enc_method,
        AfEncoding::MethodA,
        "only method A declares a single-entry table"
    );
    assert_eq!(entry_freqs(table), vec![981]);
}

#[test]
fn method_a_table_is_reused_across_announcements() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(start_block(1, uhf_code(981)));
    // A later announcement goes into the same universal table.
    group.decode_group_block(start_block(2, uhf_code(983)));
    group.decode_group_block(pair(uhf_code(985), 205));

    assert_eq!(group.count, 1, "method A never allocates a second table");
    assert_eq!(entry_freqs(&group.tables()[0]), vec![981, 983, 985]);
}

#[test]
fn lf_mf_sentinel_switches_band() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(start_block(4, uhf_code(981)));
    group.decode_group_block(pair(250, 1));

    let table = &group.tables()[0];
    let entries = table.table.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].band, Band::Uhf);
    assert_eq!(entries[1].band, Band::LfMf);
    assert_eq!(entries[1].freq, 153, "LF code 1 is 153 kHz");
}

#[test]
fn filler_codes_consume_expected_count() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(start_block(3, uhf_code(981)));
    group.decode_group_block(pair(205, 205));
    // The announced count is used up; stray codes cannot be attributed
    // to any table.
    group.decode_group_block(pair(uhf_code(983), uhf_code(985)));

    assert_eq!(entry_freqs(&group.tables()[0]), vec![981]);
}

#[test]
fn nth_block_without_current_table_is_dropped() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(pair(uhf_code(983), uhf_code(985)));
    assert_eq!(group.count, 0, "no table may appear without a count code");
}

#[test]
fn entries_stay_unique() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(start_block(6, uhf_code(981)));
    group.decode_group_block(pair(uhf_code(983), uhf_code(983)));
    group.decode_group_block(pair(uhf_code(983), uhf_code(981)));

    assert_eq!(entry_freqs(&group.tables()[0]), vec![981, 983]);
}

#[test]
fn tables_are_keyed_by_tuned_frequency() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(start_block(3, uhf_code(900)));
    group.decode_group_block(start_block(3, uhf_code(910)));
    // Back to the first announcement's frequency: no third table.
    group.decode_group_block(start_block(3, uhf_code(900)));

    assert_eq!(group.count, 2, "same tuned frequency reuses its table");
}

#[test]
fn table_pool_is_bounded() {
    let mut group = AfTableGroup::default();
    for i in 0..(AF_GROUP_LEN as u16 + 5) {
        group.decode_group_block(start_block(3, uhf_code(900 + i)));
    }
    assert_eq!(group.count as usize, AF_GROUP_LEN);
}

#[test]
fn entry_capacity_is_bounded() {
    let mut group = AfTableGroup::default();
    group.decode_group_block(start_block(25, uhf_code(900)));
    for i in 0..15u16 {
        group.decode_group_block(pair(uhf_code(901 + 2 * i), uhf_code(902 + 2 * i)));
    }
    // Announce again to keep feeding the same method A table.
    group.decode_group_block(start_block(25, uhf_code(950)));
    for i in 0..15u16 {
        group.decode_group_block(pair(uhf_code(951 + 2 * i), uhf_code(952 + 2 * i)));
    }

    assert_eq!(group.count, 1);
    assert_eq!(group.tables()[0].table.count as usize, AF_TABLE_LEN);
}

#[test]
fn decoding_same_announcement_twice_is_idempotent() {
    let mut group = AfTableGroup::default();
    for _ in 0..2 {
        group.decode_group_block(start_block(3, uhf_code(981)));
        group.decode_group_block(pair(uhf_code(983), uhf_code(987)));
    }
    assert_eq!(group.count, 1);
    assert_eq!(entry_freqs(&group.tables()[0]), vec![981, 983, 987]);
}
