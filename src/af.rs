//! Alternative frequency table decoding (RBDS 3.2.1.6).
//!
//! Group 0A carries two AF codes per group. The stream interleaves count
//! frames ("n frequencies follow") with frequency frames, without any
//! framing primitive to recover from a lost block, and the encoding
//! method (A or B) is never announced: it has to be inferred from the
//! codes themselves. Method A is a plain list of alternatives for the one
//! tuned frequency; method B pairs each alternative with the tuned
//! frequency so that regional variants can be told apart.
//!
//! Tables are kept in a fixed pool indexed by small integers, keyed by
//! their tuned frequency.

// See table 12 in RBDS spec section 3.2.1.6.1.
const MIN_FREQ_CODE: u8 = 1;
const MAX_FREQ_CODE: u8 = 204;
const FILLER_CODE: u8 = 205;
const MIN_COUNT_CODE: u8 = 225;
const MAX_COUNT_CODE: u8 = 249;
const LF_MF_FOLLOWS: u8 = 250;

/// Maximum entries per AF table.
pub const AF_TABLE_LEN: usize = 25;
/// Maximum number of AF tables decoded simultaneously.
pub const AF_GROUP_LEN: usize = 20;

/// The frequency band an AF code belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Band {
    /// The UHF (FM broadcast) band.
    #[default]
    Uhf,
    /// The LF/MF bands.
    LfMf,
}

/// How an alternative frequency relates to the tuned frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AfAttribute {
    /// Same program as the tuned frequency.
    #[default]
    SameProgram,
    /// Regional variant of the tuned program.
    RegionalVariant,
}

/// Alternative frequency encoding method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AfEncoding {
    /// Not yet known; inferred from the stream.
    #[default]
    Unknown,
    /// Method A: a plain list of alternatives.
    MethodA,
    /// Method B: alternatives paired with the tuned frequency.
    MethodB,
}

/// A frequency in a band.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frequency {
    pub band: Band,
    /// Relation to the tuned frequency. Only meaningful for entries of an
    /// AF table.
    pub attrib: AfAttribute,
    /// UHF: multiples of 0.1 MHz (885 = 88.5 MHz). LF/MF: kHz.
    pub freq: u16,
}

impl Frequency {
    pub(crate) fn from_code(code: u8, band: Band) -> Self {
        Frequency {
            band,
            attrib: AfAttribute::SameProgram,
            freq: af_code_to_freq(code, band),
        }
    }

    /// Same band and same frequency value (the attribute is ignored).
    pub fn same_frequency(&self, other: &Frequency) -> bool {
        self.band == other.band && self.freq == other.freq
    }

    /// Frequency ordering: within a band by value, LF/MF below UHF.
    pub(crate) fn precedes(&self, other: &Frequency) -> bool {
        if self.band == other.band {
            return self.freq < other.freq;
        }
        self.band == Band::LfMf && other.band == Band::Uhf
    }
}

/// Does the code announce how many frequencies follow?
pub fn is_count_code(code: u8) -> bool {
    (MIN_COUNT_CODE..=MAX_COUNT_CODE).contains(&code)
}

/// The count announced by a count code. Only call after
/// [`is_count_code`].
pub fn count_from_code(code: u8) -> u8 {
    1 + code - MIN_COUNT_CODE
}

/// Does the code map to an actual frequency?
fn code_is_freq(code: u8) -> bool {
    (MIN_FREQ_CODE..=MAX_FREQ_CODE).contains(&code)
}

/// Convert an AF code to a frequency in the given band.
///
/// See table 10 in RBDS spec section 3.2.1.6.1. UHF codes are 0.1 MHz
/// steps from 87.6 MHz; LF codes 1..16 are 9 kHz steps from 153 kHz; MF
/// codes from 16 up are 9 kHz steps from 531 kHz.
pub fn af_code_to_freq(code: u8, band: Band) -> u16 {
    if band == Band::Uhf {
        return 876 + u16::from(code) - 1;
    }
    if code < 16 {
        return 153 + 9 * (u16::from(code) - 1);
    }
    531 + 9 * (u16::from(code) - 16)
}

/// A decoded table of alternative frequencies.
#[derive(Debug, Clone, Copy)]
pub struct AfTable {
    /// The tuned frequency anchoring this table (method B), or the
    /// provisional anchor while the encoding method is unknown.
    pub tuned_freq: Frequency,
    /// Number of live entries.
    pub count: u8,
    /// The alternative frequencies.
    pub entry: [Frequency; AF_TABLE_LEN],
}

impl Default for AfTable {
    fn default() -> Self {
        AfTable {
            tuned_freq: Frequency::default(),
            count: 0,
            entry: [Frequency::default(); AF_TABLE_LEN],
        }
    }
}

impl AfTable {
    /// The live entries of the table.
    pub fn entries(&self) -> &[Frequency] {
        &self.entry[..self.count as usize]
    }

    fn contains(&self, freq: &Frequency) -> bool {
        self.entries().iter().any(|e| e.same_frequency(freq))
    }

    /// Append a frequency, keeping entries unique. Returns false when the
    /// table is full or the frequency is already present.
    fn insert(&mut self, freq: Frequency) -> bool {
        if self.count as usize >= AF_TABLE_LEN {
            return false;
        }
        if self.contains(&freq) {
            return false;
        }
        self.entry[self.count as usize] = freq;
        self.count += 1;
        true
    }
}

/// Decoding state wrapped around one [`AfTable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AfDecodeTable {
    /// The table new frequencies are inserted into.
    pub table: AfTable,
    /// Encoding method, once known.
    pub enc_method: AfEncoding,
    /// Band for the following codes; toggles to LF/MF on code 250.
    band: Band,
    /// Method carried over from earlier blocks of the same table.
    prev_enc_method: AfEncoding,
    /// Frequencies still expected before the table is complete.
    expected_cnt: u8,
}

impl AfDecodeTable {
    fn dec_expected(&mut self) {
        self.expected_cnt = self.expected_cnt.saturating_sub(1);
    }

    /// Consume a control code. Returns true when the code was handled,
    /// false when it maps to an actual frequency the caller must decode.
    fn handle_code(&mut self, code: u8) -> bool {
        if code == FILLER_CODE {
            self.dec_expected();
            return true;
        }
        if code == LF_MF_FOLLOWS {
            self.band = Band::LfMf;
            self.dec_expected();
            return true;
        }
        // Every other non-frequency code is consumed and ignored.
        let handled = !code_is_freq(code);
        if handled {
            self.dec_expected();
        }
        handled
    }

    fn add_alt_freq(&mut self, freq: Frequency) -> bool {
        self.dec_expected();
        self.table.insert(freq)
    }

    /// Decode the first block of a table announcement: the expected count
    /// plus the first carried code.
    pub(crate) fn decode_start_block(&mut self, num_freqs: u8, second: u8) {
        self.expected_cnt = num_freqs;
        self.band = Band::Uhf; // UHF first; LF/MF only after code 250.

        if self.prev_enc_method != AfEncoding::Unknown {
            self.enc_method = self.prev_enc_method;
        }

        if self.handle_code(second) {
            return;
        }
        let freq = Frequency::from_code(second, self.band);
        self.add_alt_freq(freq);
    }

    /// Decode blocks 2..n of the table.
    pub(crate) fn decode_nth_block(&mut self, first: u8, second: u8) {
        if self.expected_cnt == 0 {
            // More codes than announced: a start block was probably
            // missed, so the pair cannot be attributed to any table.
            return;
        }

        let handled_first = self.handle_code(first);
        let first_freq = (!handled_first).then(|| Frequency::from_code(first, self.band));
        let handled_second = self.handle_code(second);
        let second_freq = (!handled_second).then(|| Frequency::from_code(second, self.band));

        if self.enc_method == AfEncoding::Unknown {
            match (first_freq, second_freq) {
                // Two control codes carry no evidence either way.
                (None, None) => return,
                (Some(f), Some(s)) => {
                    if f.same_frequency(&self.table.tuned_freq)
                        || s.same_frequency(&self.table.tuned_freq)
                    {
                        self.enc_method = AfEncoding::MethodB;
                    } else {
                        self.enc_method = AfEncoding::MethodA;
                        if self.table.tuned_freq.freq != 0 {
                            // The provisional anchor was a real method A
                            // entry all along; move it into the table.
                            let anchor = self.table.tuned_freq;
                            self.add_alt_freq(anchor);
                            self.table.tuned_freq = Frequency::default();
                        }
                    }
                }
                // Method B always sends two real frequencies, so a lone
                // control code means method A.
                _ => self.enc_method = AfEncoding::MethodA,
            }
        }

        self.prev_enc_method = self.enc_method;

        if self.enc_method == AfEncoding::MethodA {
            if let Some(freq) = first_freq {
                self.add_alt_freq(freq);
            }
            if let Some(freq) = second_freq {
                self.add_alt_freq(freq);
            }
            return;
        }

        // Method B: one of the pair must be the tuned frequency, the
        // other is the alternative.
        let (Some(f), Some(s)) = (first_freq, second_freq) else {
            return;
        };
        let tuned = self.table.tuned_freq;
        let mut alt = if tuned.same_frequency(&f) {
            s
        } else if tuned.same_frequency(&s) {
            f
        } else {
            // Neither side matches the tuned frequency: drop the pair.
            return;
        };
        if tuned.precedes(&alt) {
            // An alternative above the tuned frequency marks a regional
            // variant rather than a simulcast.
            alt.attrib = AfAttribute::RegionalVariant;
        }
        self.add_alt_freq(alt);
    }
}

/// A pool of AF decode tables, one per tuned frequency seen.
#[derive(Debug, Clone)]
pub struct AfTableGroup {
    /// Table addressed by the current announcement, if any.
    current_table_idx: Option<usize>,
    /// Number of tables in use.
    pub count: u8,
    /// The decode tables.
    pub table: [AfDecodeTable; AF_GROUP_LEN],
}

impl Default for AfTableGroup {
    fn default() -> Self {
        AfTableGroup {
            current_table_idx: None,
            count: 0,
            table: [AfDecodeTable::default(); AF_GROUP_LEN],
        }
    }
}

impl AfTableGroup {
    /// The tables in use.
    pub fn tables(&self) -> &[AfDecodeTable] {
        &self.table[..self.count as usize]
    }

    /// Route one group 0A block C into the pool.
    pub(crate) fn decode_group_block(&mut self, block: u16) {
        let first = (block >> 8) as u8;
        let second = (block & 0xFF) as u8;
        if is_count_code(first) {
            self.decode_start_block(count_from_code(first), second);
        } else {
            self.decode_nth_block(first, second);
        }
    }

    fn find_table_idx(&self, tuned: &Frequency) -> Option<usize> {
        self.tables()
            .iter()
            .position(|t| t.table.tuned_freq.same_frequency(tuned))
    }

    fn allocate(&mut self, encoding: AfEncoding, anchor: Option<Frequency>) -> Option<usize> {
        if self.count as usize >= AF_GROUP_LEN {
            return None;
        }
        let idx = self.count as usize;
        self.count += 1;
        let table = &mut self.table[idx];
        table.enc_method = encoding;
        if table.enc_method == AfEncoding::Unknown {
            // The anchor stays in tuned_freq until the encoding method is
            // known; it moves into the entries if this turns out to be
            // method A.
            if let Some(freq) = anchor {
                table.table.tuned_freq = freq;
            }
        }
        Some(idx)
    }

    /// A count code starts a new table announcement; pick (or allocate)
    /// the table it addresses.
    fn decode_start_block(&mut self, num_freqs: u8, second: u8) {
        let mut encoding = AfEncoding::Unknown;

        // Method A has a single universal table: its entries are all
        // alternatives for the one tuned frequency of this station.
        self.current_table_idx = if self.count == 1 && self.table[0].enc_method == AfEncoding::MethodA
        {
            encoding = AfEncoding::MethodA;
            Some(0)
        } else {
            None
        };

        if num_freqs == 1 && self.current_table_idx.is_none() {
            // Only method A ever declares a single-entry table.
            encoding = AfEncoding::MethodA;
            self.current_table_idx = self
                .tables()
                .iter()
                .position(|t| t.enc_method == AfEncoding::MethodA)
                .or_else(|| self.allocate(encoding, None));
        }

        if self.current_table_idx.is_none() {
            let freq = Frequency::from_code(second, Band::Uhf);
            self.current_table_idx = self
                .find_table_idx(&freq)
                .or_else(|| self.allocate(encoding, Some(freq)));
        }

        let Some(idx) = self.current_table_idx else {
            // Pool exhausted; the announcement cannot be tracked.
            return;
        };
        self.table[idx].decode_start_block(num_freqs, second);
    }

    /// Blocks 2..n belong to the table selected by the last start block.
    fn decode_nth_block(&mut self, first: u8, second: u8) {
        let Some(idx) = self.current_table_idx else {
            return;
        };
        self.table[idx].decode_nth_block(first, second);
    }
}

#[cfg(test)]
#[path = "af_tests.rs"]
mod tests;
