//! Input block model and the aggregated RDS data record.
//!
//! The tuner hands the decoder one *group* at a time: four 16-bit blocks
//! (A, B, C, D), each tagged with the tuner's block error rate. Everything
//! decoded from those groups accumulates in [`RdsData`], with
//! [`RdsData::valid_values`] recording which fields have actually been
//! received since the last reset.

use crate::af::{AfDecodeTable, AfTableGroup};

/// Block error rate reported by the tuner for one 16-bit block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Bler {
    /// No block errors.
    #[default]
    None = 0,
    /// 1-2 bit errors, corrected.
    OneToTwo = 1,
    /// 3-5 bit errors, corrected.
    ThreeToFive = 2,
    /// 6 or more errors; the block is unreliable.
    SixPlus = 3,
}

impl Bler {
    /// Numeric error level, used where levels are summed.
    pub fn raw(self) -> u8 {
        self as u8
    }
}

/// Maximum allowed error rate for block A (carries the PI code).
pub const BLER_A_MAX: Bler = Bler::ThreeToFive;
/// Maximum allowed error rate for block B.
///
/// Block B determines what the latter blocks contain, so it gets a
/// stricter tolerance: a misread group type corrupts every field decoded
/// from the rest of the group.
pub const BLER_B_MAX: Bler = Bler::OneToTwo;
/// Maximum allowed error rate for block C.
pub const BLER_C_MAX: Bler = Bler::ThreeToFive;
/// Maximum allowed error rate for block D.
pub const BLER_D_MAX: Bler = Bler::ThreeToFive;

/// One RDS data block: a 16-bit value and its error rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Block {
    /// The block value.
    pub val: u16,
    /// Error rate reported by the tuner for this block.
    pub errors: Bler,
}

/// All four blocks of one RDS group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blocks {
    pub a: Block,
    pub b: Block,
    pub c: Block,
    pub d: Block,
}

/// Group type version (the A/B bit of block B).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupVersion {
    #[default]
    A,
    B,
}

/// RDS group type: code 0..=15 plus the A/B version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupType {
    /// The group type code, 0..=15.
    pub code: u8,
    /// The group type version.
    pub version: GroupVersion,
}

impl GroupType {
    /// Extract the group type from block B (bits 15..12 and bit 11).
    pub fn from_block_b(val: u16) -> Self {
        GroupType {
            code: (val >> 12) as u8,
            version: if val & 0x0800 != 0 {
                GroupVersion::B
            } else {
                GroupVersion::A
            },
        }
    }
}

/// Bits of [`RdsData::valid_values`] marking which fields have been
/// decoded at least once since the last reset.
pub mod valid {
    /// Alternative frequency table(s).
    pub const AF: u32 = 0x00001;
    /// Clock time and date.
    pub const CLOCK: u32 = 0x00002;
    /// Emergency warning system raw blocks.
    pub const EWS: u32 = 0x00004;
    /// Fast basic tuning (group 15B). Counted but never marked valid.
    pub const FBT: u32 = 0x00008;
    /// Decoder identification flags (the music-coding bit slot).
    pub const MC: u32 = 0x00010;
    /// Program item number code.
    pub const PIC: u32 = 0x00020;
    /// Program identification code.
    pub const PI_CODE: u32 = 0x00040;
    /// Program service name.
    pub const PS: u32 = 0x00080;
    /// Program type.
    pub const PTY: u32 = 0x00100;
    /// Program type name.
    pub const PTYN: u32 = 0x00200;
    /// Radiotext.
    pub const RT: u32 = 0x00400;
    /// Slow labeling codes.
    pub const SLC: u32 = 0x00800;
    /// Transparent data channels.
    pub const TDC: u32 = 0x01000;
    /// Traffic announcement code.
    pub const TA_CODE: u32 = 0x02000;
    /// Traffic program code.
    pub const TP_CODE: u32 = 0x04000;
    /// Music/speech flag.
    pub const MS: u32 = 0x08000;
    /// Enhanced other network data.
    pub const EON: u32 = 0x10000;
}

/// Number of transparent data channels.
pub const NUM_TDC: usize = 32;
/// Transparent data bytes kept per channel.
pub const TDC_LEN: usize = 32;
/// Maximum number of simultaneously registered open data applications.
pub const NUM_ODA: usize = 10;
/// Radiotext length in characters.
pub const RT_LEN: usize = 64;
/// Program service name length in characters.
pub const PS_LEN: usize = 8;

/// Program Service name, 8 characters.
///
/// `display` is what a UI should show. The shadow arrays implement the
/// two-level confidence scheme used by the advanced decoding mode: a
/// character only reaches `display` once every position has been received
/// identically often enough.
///
/// None of the text arrays in this module are null terminated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PsData {
    /// PS text to display.
    pub display: [u8; PS_LEN],
    /// High probability candidate text.
    pub(crate) hi_prob: [u8; PS_LEN],
    /// Low probability candidate text.
    pub(crate) lo_prob: [u8; PS_LEN],
    /// Hit count for each high probability character.
    pub(crate) hi_prob_cnt: [u8; PS_LEN],
}

/// One radiotext buffer (64 characters) with its confidence shadows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtText {
    /// Radiotext to display.
    pub display: [u8; RT_LEN],
    pub(crate) hi_prob: [u8; RT_LEN],
    pub(crate) lo_prob: [u8; RT_LEN],
    pub(crate) hi_prob_cnt: [u8; RT_LEN],
}

impl Default for RtText {
    fn default() -> Self {
        RtText {
            display: [0; RT_LEN],
            hi_prob: [0; RT_LEN],
            lo_prob: [0; RT_LEN],
            hi_prob_cnt: [0; RT_LEN],
        }
    }
}

/// Which of the two radiotext buffers a group addresses (block B bit 4).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RtFlag {
    #[default]
    A,
    B,
}

/// Radiotext state: two message buffers and the A/B flag last seen.
///
/// Stations toggle the flag when the message changes; a flag transition
/// restarts character validation on the newly addressed buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RtData {
    pub a: RtText,
    pub b: RtText,
    /// Buffer addressed by the most recent radiotext group.
    pub current: RtFlag,
}

/// Clock time from group 4A (RBDS 3.1.5.6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockTime {
    /// Modified Julian Day bit 16.
    pub day_high: bool,
    /// Modified Julian Day bits 15..0.
    pub day_low: u16,
    /// Hour (UTC).
    pub hour: u8,
    /// Minute (UTC).
    pub minute: u8,
    /// Local time offset from UTC in multiples of half hours.
    pub utc_offset: i8,
}

impl ClockTime {
    /// The full 17-bit Modified Julian Day.
    pub fn mjd(&self) -> u32 {
        (u32::from(self.day_high) << 16) | u32::from(self.day_low)
    }
}

/// Slow labeling code payload, tagged by the variant code (RBDS 3.1.5.2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlcVariant {
    /// Paging and extended country code (variant 0).
    Paging { paging: u8, country_code: u8 },
    /// TMC identification (variant 1).
    TmcId(u16),
    /// Paging identification (variant 2).
    PagingId(u16),
    /// Language codes (variant 3).
    Language(u16),
    /// Variants 4 and 5 carry no assigned meaning.
    #[default]
    NotAssigned,
    /// For use by broadcasters (variant 6).
    Broadcasters(u16),
    /// Identification of the EWS channel (variant 7).
    EwsChannel(u16),
}

/// Slow labeling codes from group 1A block C.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slc {
    /// Linkage actuator (RBDS 3.2.1.8.3).
    pub la: bool,
    pub variant: SlcVariant,
}

/// Program item number code: scheduled start of the current program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pic {
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl Pic {
    /// Decode a raw PIN word (day in the top five bits).
    pub(crate) fn from_raw(raw: u16) -> Self {
        let day = (raw >> 11) as u8;
        if day == 0 {
            // With zero day bits the remaining bits are undefined.
            return Pic::default();
        }
        Pic {
            day,
            hour: ((raw >> 6) & 0x1F) as u8,
            minute: (raw & 0x3F) as u8,
        }
    }
}

/// Program Type Name (group 10A), 8 characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ptyn {
    /// The PTYN to display.
    pub display: [u8; PS_LEN],
    /// A/B flag last seen; a flip wipes the buffer.
    pub(crate) last_ab: bool,
}

/// Decoder identification flags, one per group 0 PS segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiFlags {
    /// PTY changes dynamically (segment 0).
    pub dynamic_pty: bool,
    /// Compressed audio (segment 1).
    pub compressed: bool,
    /// Artificial head recording (segment 2).
    pub artificial_head: bool,
    /// Stereo broadcast (segment 3).
    pub stereo: bool,
}

impl DiFlags {
    pub(crate) fn set(&mut self, segment: usize, value: bool) {
        match segment {
            0 => self.dynamic_pty = value,
            1 => self.compressed = value,
            2 => self.artificial_head = value,
            3 => self.stereo = value,
            _ => {}
        }
    }
}

/// Transparent data channels: a 32-byte sliding window per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tdc {
    /// TDC data, most recent bytes last.
    pub data: [[u8; TDC_LEN]; NUM_TDC],
    /// Current channel, set by the last 5A group.
    pub curr_channel: u8,
}

impl Default for Tdc {
    fn default() -> Self {
        Tdc {
            data: [[0; TDC_LEN]; NUM_TDC],
            curr_channel: 0,
        }
    }
}

/// Emergency warning system raw blocks from group 9A.
///
/// The format of the message bits is assigned per country, so the blocks
/// are kept raw (block B reduced to its five EWS bits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ews {
    pub b: Block,
    pub c: Block,
    pub d: Block,
}

/// Data about the cross-referenced other network (group 14).
#[derive(Debug, Clone, Default)]
pub struct OtherNetwork {
    /// Program service name of the other network.
    pub ps: [u8; PS_LEN],
    /// Program type of the other network.
    pub pty: u8,
    pub tp_code: bool,
    pub ta_code: bool,
    /// Alternative frequencies of the other network.
    pub af: AfDecodeTable,
    /// Program identification code of the other network.
    pub pi_code: u16,
    /// Program item number of the other network.
    pub pic: Pic,
}

/// Enhanced Other Network data.
#[derive(Debug, Clone, Default)]
pub struct EonData {
    pub on: OtherNetwork,
}

/// One registered open data application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OdaApp {
    /// Application identification (AID). Never zero for a live entry.
    pub id: u16,
    /// Group type carrying this application's data.
    pub gt: GroupType,
    /// Number of packets received for this application.
    pub pkt_count: u16,
}

/// Per-group-type receive counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCount {
    /// A versions received.
    pub a: u16,
    /// B versions received.
    pub b: u16,
}

/// Receive statistics, accumulated across every decoded group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub af: u32,
    pub clock: u32,
    pub eon: u32,
    pub ews: u32,
    pub fbt: u32,
    pub in_house: u32,
    pub paging: u32,
    pub pic: u32,
    pub pi_code: u32,
    pub ps: u32,
    pub pty: u32,
    pub ptyn: u32,
    pub rt: u32,
    pub slc: u32,
    pub tdc: u32,
    pub tmc: u32,
    pub ta_code: u32,
    pub tp_code: u32,
    pub ms: u32,
    /// Receive counts per group type.
    pub groups: [GroupCount; 16],
    /// Number of groups handed to the decoder.
    pub data_cnt: u32,
    /// Number of groups aborted because block B exceeded its threshold.
    pub blckb_errors: u32,
}

/// All data extracted from the RDS group stream.
///
/// Some fields (PTY, PIC, clock) only hold the last value received;
/// others (PS, RT, AF) accumulate across many groups. A field is
/// undefined unless its bit in `valid_values` is set.
#[derive(Debug, Clone, Default)]
pub struct RdsData {
    /// Program identification code.
    pub pi_code: u16,
    /// Program item number code.
    pub pic: Pic,
    /// Program type code.
    pub pty: u8,
    /// Traffic program code (RBDS 3.2.1.3).
    pub tp_code: bool,
    /// Traffic announcement code (RBDS 3.2.1.3).
    pub ta_code: bool,
    /// true for music, false for speech (RBDS 3.2.1.4).
    pub music: bool,
    /// Decoder identification flags.
    pub di: DiFlags,
    /// Program service name.
    pub ps: PsData,
    /// Radiotext.
    pub rt: RtData,
    /// Broadcast clock time.
    pub clock: ClockTime,
    /// Slow labeling codes.
    pub slc: Slc,
    /// Program type name.
    pub ptyn: Ptyn,
    /// Alternative frequencies.
    pub af: AfTableGroup,
    /// Enhanced other network data.
    pub eon: EonData,
    /// Number of currently registered open data applications.
    pub oda_cnt: u8,
    /// The registered open data applications.
    pub oda: [OdaApp; NUM_ODA],
    /// Transparent data channels.
    pub tdc: Tdc,
    /// Emergency warning system data.
    pub ews: Ews,
    /// Receive statistics.
    pub stats: DecoderStats,
    /// Bitmask (see [`valid`]) of the fields decoded so far.
    pub valid_values: u32,
}

impl RdsData {
    /// Have all of the given [`valid`] bits been decoded?
    pub fn is_valid(&self, bits: u32) -> bool {
        self.valid_values & bits == bits
    }

    pub(crate) fn set_valid(&mut self, bits: u32) {
        self.valid_values |= bits;
    }
}

/// Program type names from the 1998 RBDS specification (US table).
const PTY_NAMES: [&str; 32] = [
    "None",
    "News",
    "Information",
    "Sports",
    "Talk",
    "Rock",
    "Classic Rock",
    "Adult Hits",
    "Soft Rock",
    "Top 40",
    "Country",
    "Oldies",
    "Soft",
    "Nostalgia",
    "Jazz",
    "Classical",
    "Rhythm and Blues",
    "Soft Rhythm and Blues",
    "Foreign Language",
    "Religious Music",
    "Religious Talk",
    "Personality",
    "Public",
    "College",
    "Unassigned",
    "Unassigned",
    "Unassigned",
    "Unassigned",
    "Unassigned",
    "Weather",
    "Emergency Test",
    "Emergency",
];

/// Name of a program type code per the 1998 RBDS table.
pub fn pty_name(pty: u8) -> &'static str {
    PTY_NAMES.get(pty as usize).copied().unwrap_or("Unknown")
}

/// Well-known open data applications, keyed by application id.
const ODA_APPS: &[(u16, &str)] = &[
    (0x0D45, "RDS-TMC: ALERT-C / EN ISO 14819-1"),
    (0x4BD7, "RadioText+ (RT+)"),
    (0x4BD8, "RadioText Plus / RT+ for eRT"),
    (0x6552, "Enhanced RadioText (eRT)"),
    (0xC3B0, "iTunes Tagging"),
    (0xCD46, "RDS-TMC: ALERT-C"),
    (0xCD47, "RDS-TMC: ALERT-C"),
    (0xE911, "EAS open protocol"),
];

/// Name of a known open data application.
pub fn oda_app_name(app_id: u16) -> &'static str {
    ODA_APPS
        .iter()
        .find(|(id, _)| *id == app_id)
        .map(|(_, name)| *name)
        .unwrap_or("(unknown ODA)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_type_extraction() {
        // Code 2, version A, plus payload bits that must be ignored.
        let gt = GroupType::from_block_b(0x2410);
        assert_eq!(gt.code, 2);
        assert_eq!(gt.version, GroupVersion::A);

        let gt = GroupType::from_block_b(0xF800);
        assert_eq!(gt.code, 15);
        assert_eq!(gt.version, GroupVersion::B);
    }

    #[test]
    fn bler_levels_are_ordered() {
        assert!(Bler::None < Bler::OneToTwo);
        assert!(Bler::OneToTwo < Bler::ThreeToFive);
        assert!(Bler::ThreeToFive < Bler::SixPlus);
        assert_eq!(Bler::SixPlus.raw(), 3);
    }

    #[test]
    fn clock_mjd_combines_high_bit() {
        let clock = ClockTime {
            day_high: true,
            day_low: 0x0001,
            ..ClockTime::default()
        };
        assert_eq!(clock.mjd(), 0x10001);
    }

    #[test]
    fn pin_with_zero_day_is_cleared() {
        let pic = Pic::from_raw((0 << 11) | (12 << 6) | 15);
        assert_eq!(pic, Pic::default());

        let pic = Pic::from_raw((7 << 11) | (12 << 6) | 15);
        assert_eq!(
            pic,
            Pic {
                day: 7,
                hour: 12,
                minute: 15
            }
        );
    }

    #[test]
    fn pty_names_follow_the_us_table() {
        assert_eq!(pty_name(0), "None");
        assert_eq!(pty_name(1), "News");
        assert_eq!(pty_name(15), "Classical");
        assert_eq!(pty_name(31), "Emergency");
        assert_eq!(pty_name(200), "Unknown");
    }

    #[test]
    fn oda_names_cover_the_common_apps() {
        assert_eq!(oda_app_name(0x4BD7), "RadioText+ (RT+)");
        assert_eq!(oda_app_name(0xC3B0), "iTunes Tagging");
        assert_eq!(oda_app_name(0x1234), "(unknown ODA)");
    }
}
