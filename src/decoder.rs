//! The RDS group decoder.
//!
//! [`RdsDecoder::decode`] takes one 4-block group at a time, dispatches
//! on the group type extracted from block B, and merges whatever the
//! group carried into the owned [`RdsData`] record. Decoding never
//! fails: blocks whose error rate exceeds the per-field threshold simply
//! leave their fields untouched, and malformed sequences are dropped
//! silently. The validity bitmask and the receive statistics are the only
//! channels through which the caller observes what happened.

use tracing::{debug, trace};

use crate::af;
use crate::data::{
    valid, Bler, Block, Blocks, GroupType, GroupVersion, OdaApp, Pic, RdsData, RtFlag, RtText,
    Slc, SlcVariant, BLER_A_MAX, BLER_B_MAX, BLER_C_MAX, BLER_D_MAX, NUM_ODA, NUM_TDC, RT_LEN,
    TDC_LEN,
};

const TP_CODE_MASK: u16 = 0b0000_0100_0000_0000;
const PTY_MASK: u16 = 0b0000_0011_1110_0000;
const TA_MASK: u16 = 0b0000_0000_0001_0000;
const MS_MASK: u16 = 0b0000_0000_0000_1000;
const DI_MASK: u16 = 0b0000_0000_0000_0100;
const DI_ADDR_MASK: u16 = 0b0000_0000_0000_0011;

/// Receptions required before a PS character is trusted.
const PS_VALIDATE_LIMIT: u8 = 2;
/// Receptions required before a radiotext character is trusted.
const RT_VALIDATE_LIMIT: u8 = 2;

/// Callback invoked for every group belonging to a registered open data
/// application.
pub type DecodeOdaFn = Box<dyn FnMut(u16, &RdsData, &Blocks, GroupType)>;
/// Callback invoked from [`RdsDecoder::reset`] so the host can drop any
/// application data it accumulated.
pub type ClearOdaFn = Box<dyn FnMut()>;

/// Decoder configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderConfig {
    /// Use the two-level confidence algorithm for PS (and radiotext)
    /// instead of writing received characters straight to the display
    /// buffers.
    pub advanced_ps_decoding: bool,
}

/// Decodes a stream of RDS groups into an [`RdsData`] record.
pub struct RdsDecoder {
    rds: RdsData,
    decode_oda_cb: Option<DecodeOdaFn>,
    clear_oda_cb: Option<ClearOdaFn>,
    advanced_ps_decoding: bool,
}

impl RdsDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        RdsDecoder {
            rds: RdsData::default(),
            decode_oda_cb: None,
            clear_oda_cb: None,
            advanced_ps_decoding: config.advanced_ps_decoding,
        }
    }

    /// The decoded data record.
    pub fn data(&self) -> &RdsData {
        &self.rds
    }

    /// Bind the open data application callbacks.
    ///
    /// `decode_cb` runs synchronously inside [`decode`](Self::decode) for
    /// every group whose type matches a registered application;
    /// `clear_cb` runs from [`reset`](Self::reset). Both are optional.
    pub fn set_oda_callbacks(&mut self, decode_cb: DecodeOdaFn, clear_cb: ClearOdaFn) {
        self.decode_oda_cb = Some(decode_cb);
        self.clear_oda_cb = Some(clear_cb);
    }

    /// Reset the decoded data to the default state and notify the ODA
    /// host to do the same.
    pub fn reset(&mut self) {
        self.rds = RdsData::default();
        if let Some(cb) = self.clear_oda_cb.as_mut() {
            cb();
        }
    }

    /// Decode one group.
    pub fn decode(&mut self, blocks: &Blocks) {
        self.rds.stats.data_cnt += 1;

        if blocks.a.errors <= BLER_A_MAX {
            self.rds.pi_code = blocks.a.val;
            self.rds.set_valid(valid::PI_CODE);
            self.rds.stats.pi_code += 1;
        }

        if blocks.b.errors > BLER_B_MAX {
            self.rds.stats.blckb_errors += 1;
            debug!(errors = blocks.b.errors.raw(), "block B above threshold, group dropped");
            return;
        }

        let gt = GroupType::from_block_b(blocks.b.val);

        // B-version groups repeat the PI code in block C; prefer it when
        // block C came in cleaner than block B.
        if gt.version == GroupVersion::B
            && blocks.c.errors <= BLER_C_MAX
            && blocks.c.errors < blocks.b.errors
        {
            self.rds.pi_code = blocks.c.val;
            self.rds.set_valid(valid::PI_CODE);
            self.rds.stats.pi_code += 1;
        }

        let group = &mut self.rds.stats.groups[usize::from(gt.code)];
        match gt.version {
            GroupVersion::A => group.a += 1,
            GroupVersion::B => group.b += 1,
        }

        self.decode_pty(&blocks.b);

        trace!(
            code = gt.code,
            version = ?gt.version,
            pi = format!("0x{:04X}", self.rds.pi_code),
            "group received"
        );

        match gt.code {
            0 => self.decode_group_type_0(gt, blocks),
            1 => self.decode_group_type_1(gt, blocks),
            2 => self.decode_group_type_2(gt, blocks),
            3 => self.decode_group_type_3(gt, blocks),
            4 => self.decode_group_type_4(gt, blocks),
            5 => self.decode_group_type_5(gt, blocks),
            6 => self.decode_group_type_6(gt, blocks),
            7 => self.decode_group_type_7(gt, blocks),
            8 => self.decode_group_type_8(gt, blocks),
            9 => self.decode_group_type_9(gt, blocks),
            10 => self.decode_group_type_10(gt, blocks),
            11..=13 => self.decode_oda(gt, blocks),
            14 => self.decode_group_type_14(gt, blocks),
            15 => self.decode_group_type_15(gt, blocks),
            _ => {}
        }
    }

    /// Read TP and PTY from block B. Runs for every accepted group.
    fn decode_pty(&mut self, block: &Block) {
        self.rds.tp_code = block.val & TP_CODE_MASK != 0;
        self.rds.pty = ((block.val & PTY_MASK) >> 5) as u8;

        self.rds.set_valid(valid::TP_CODE);
        if self.rds.tp_code {
            self.rds.stats.tp_code += 1;
        }
        self.rds.set_valid(valid::PTY);
        self.rds.stats.pty += 1;
    }

    fn decode_ta(&mut self, block: &Block) {
        self.rds.ta_code = block.val & TA_MASK != 0;
        self.rds.set_valid(valid::TA_CODE);
        self.rds.stats.ta_code += 1;
    }

    fn decode_ms(&mut self, block: &Block) {
        self.rds.music = block.val & MS_MASK != 0;
        self.rds.set_valid(valid::MS);
        self.rds.stats.ms += 1;
    }

    /// One decoder identification flag rides along with each PS segment.
    fn decode_di(&mut self, block: &Block) {
        let segment = usize::from(block.val & DI_ADDR_MASK);
        self.rds.di.set(segment, block.val & DI_MASK != 0);
        self.rds.set_valid(valid::MC);
    }

    /// Decode the two AF codes in group 0A block C (RBDS 3.2.1.6.2).
    fn decode_alt_freq(&mut self, blocks: &Blocks) {
        // The AF stream has no way to resynchronize after a corrupted
        // byte, so only error-free blocks are accepted.
        if blocks.c.errors != Bler::None {
            return;
        }
        self.rds.set_valid(valid::AF);
        self.rds.stats.af += 1;
        self.rds.af.decode_group_block(blocks.c.val);
    }

    /// 0A/0B: basic tuning and switching information.
    fn decode_group_type_0(&mut self, gt: GroupType, blocks: &Blocks) {
        if gt.version == GroupVersion::A {
            self.decode_alt_freq(blocks);
        }

        if blocks.d.errors > BLER_D_MAX {
            return;
        }

        self.decode_ta(&blocks.b);
        self.decode_ms(&blocks.b);
        self.decode_di(&blocks.b);

        let pair_idx = usize::from(blocks.b.val & DI_ADDR_MASK) * 2;
        let chars = blocks.d.val.to_be_bytes();
        if self.advanced_ps_decoding {
            self.update_ps_advanced(pair_idx, chars[0]);
            self.update_ps_advanced(pair_idx + 1, chars[1]);
        } else {
            self.update_ps_simple(pair_idx, chars[0]);
            self.update_ps_simple(pair_idx + 1, chars[1]);
        }
        self.rds.stats.ps += 1;
    }

    /// Decode slow labeling codes from group 1A block C (RBDS 3.1.5.2).
    fn decode_slow_labeling(&mut self, blocks: &Blocks) {
        const LA_MASK: u16 = 0b1000_0000_0000_0000;
        const VARIANT_MASK: u16 = 0b0111_0000_0000_0000;
        const DATA_MASK: u16 = 0b0000_1111_1111_1111;
        const PAGING_MASK: u16 = 0b0000_1111_0000_0000;
        const COUNTRY_MASK: u16 = 0b0000_0000_1111_1111;

        if blocks.c.errors > BLER_C_MAX {
            return;
        }
        self.rds.set_valid(valid::SLC);
        self.rds.stats.slc += 1;

        let c = blocks.c.val;
        // 3.2.1.8.3: with LA=1, a service carrying TP=1 or TP=0/TA=1 must
        // not be linked to another service carrying TP=0/TA=0.
        self.rds.slc = Slc {
            la: c & LA_MASK != 0,
            variant: match (c & VARIANT_MASK) >> 12 {
                0 => SlcVariant::Paging {
                    paging: ((c & PAGING_MASK) >> 8) as u8,
                    country_code: (c & COUNTRY_MASK) as u8,
                },
                1 => SlcVariant::TmcId(c & DATA_MASK),
                2 => SlcVariant::PagingId(c & DATA_MASK),
                3 => SlcVariant::Language(c & DATA_MASK),
                6 => SlcVariant::Broadcasters(c & DATA_MASK),
                7 => SlcVariant::EwsChannel(c & DATA_MASK),
                _ => SlcVariant::NotAssigned,
            },
        };
    }

    /// 1A/1B: program item number, plus slow labeling codes for 1A.
    fn decode_group_type_1(&mut self, gt: GroupType, blocks: &Blocks) {
        if gt.version == GroupVersion::A {
            self.decode_slow_labeling(blocks);
        }

        if blocks.d.errors <= BLER_D_MAX {
            self.rds.pic = Pic::from_raw(blocks.d.val);
            self.rds.set_valid(valid::PIC);
            self.rds.stats.pic += 1;
        }
    }

    /// 2A/2B: radiotext.
    fn decode_group_type_2(&mut self, gt: GroupType, blocks: &Blocks) {
        let decode_rt = if (blocks.b.val >> 4) & 1 != 0 {
            RtFlag::A
        } else {
            RtFlag::B
        };
        let flag_changed = self.rds.rt.current != decode_rt;
        let rt = match decode_rt {
            RtFlag::A => &mut self.rds.rt.a,
            RtFlag::B => &mut self.rds.rt.b,
        };

        if gt.version == GroupVersion::A {
            if blocks.c.errors > BLER_C_MAX || blocks.d.errors > BLER_D_MAX {
                return;
            }
            let [c0, c1] = blocks.c.val.to_be_bytes();
            let [d0, d1] = blocks.d.val.to_be_bytes();
            let chars = [c0, c1, d0, d1];
            let addr = usize::from(blocks.b.val & 0xF) * 4;

            update_rt_simple(rt, blocks, 4, addr, &chars);
            if flag_changed {
                bump_rt_validation(rt);
            }
            update_rt_advanced(rt, blocks, 4, addr, &chars);
        } else {
            if blocks.d.errors > BLER_D_MAX {
                return;
            }
            let [d0, d1] = blocks.d.val.to_be_bytes();
            let chars = [d0, d1, 0, 0];
            let addr = usize::from(blocks.b.val & 0xF) * 2;

            // B-version radiotext is 32 characters; pin the terminator so
            // the tail of the buffer never shows.
            rt.display[32] = 0x0D;
            rt.hi_prob[32] = 0x0D;
            rt.lo_prob[32] = 0x0D;
            rt.hi_prob_cnt[32] = RT_VALIDATE_LIMIT;

            update_rt_simple(rt, blocks, 2, addr, &chars);
            if flag_changed {
                bump_rt_validation(rt);
            }
            update_rt_advanced(rt, blocks, 2, addr, &chars);
        }

        self.rds.rt.current = decode_rt;
        self.rds.set_valid(valid::RT);
        self.rds.stats.rt += 1;
    }

    /// 3A: open data application registration (RBDS 3.1.5.4). 3B carries
    /// the application's own data.
    fn decode_group_type_3(&mut self, gt: GroupType, blocks: &Blocks) {
        if gt.version == GroupVersion::B {
            self.decode_oda(gt, blocks);
            return;
        }

        // The whole of block D is the application id: accept it only
        // error free.
        if blocks.d.errors != Bler::None {
            return;
        }
        let app_id = blocks.d.val;
        if app_id == 0 {
            return;
        }

        let app_gt = GroupType {
            code: ((blocks.b.val & 0b11110) >> 1) as u8,
            version: if blocks.b.val & 1 != 0 {
                GroupVersion::B
            } else {
                GroupVersion::A
            },
        };

        let cnt = usize::from(self.rds.oda_cnt);
        if let Some(oda) = self.rds.oda[..cnt].iter_mut().find(|oda| oda.id == app_id) {
            // Re-registration may move the application to another group.
            oda.gt = app_gt;
        } else if cnt < NUM_ODA {
            self.rds.oda[cnt] = OdaApp {
                id: app_id,
                gt: app_gt,
                pkt_count: 0,
            };
            self.rds.oda_cnt += 1;
            debug!(
                app_id = format!("0x{:04X}", app_id),
                code = app_gt.code,
                version = ?app_gt.version,
                "ODA registered"
            );
        }
    }

    /// Route a group to the registered open data application, if any.
    fn decode_oda(&mut self, gt: GroupType, blocks: &Blocks) {
        let cnt = usize::from(self.rds.oda_cnt);
        let Some(idx) = self.rds.oda[..cnt].iter().position(|oda| oda.gt == gt) else {
            return;
        };
        self.rds.oda[idx].pkt_count += 1;
        if let Some(cb) = self.decode_oda_cb.as_mut() {
            cb(self.rds.oda[idx].id, &self.rds, blocks, gt);
        }
    }

    fn group_type_used_by_oda(&self, gt: GroupType) -> bool {
        let cnt = usize::from(self.rds.oda_cnt);
        self.rds.oda[..cnt].iter().any(|oda| oda.gt == gt)
    }

    /// Decode the clock from group 4A (RBDS 3.1.5.6).
    fn update_clock(&mut self, blocks: &Blocks) {
        if blocks.b.errors > BLER_B_MAX
            || blocks.c.errors > BLER_C_MAX
            || blocks.d.errors > BLER_D_MAX
        {
            return;
        }
        // The date and time bits span all three blocks, so the combined
        // error budget is held to the strictest single-block limit.
        if blocks.b.errors.raw() + blocks.c.errors.raw() + blocks.d.errors.raw() > BLER_B_MAX.raw()
        {
            return;
        }

        const B_MJD: u16 = 0b0000_0000_0000_0011; // bottom two bits of B
        const C_MJD: u16 = 0b1111_1111_1111_1110; // top 15 bits of C
        const D_HOUR: u16 = 0b1111_0000_0000_0000; // top nibble of D
        const D_MINUTE: u16 = 0b0000_1111_1100_0000; // middle 6 bits of D
        const D_UTC_OFFSET: u16 = 0b0000_0000_0001_1111; // bottom 5 bits of D
        const D_UTC_OFFSET_SIGN: u16 = 0b0000_0000_0010_0000;

        let (b, c, d) = (blocks.b.val, blocks.c.val, blocks.d.val);

        self.rds.set_valid(valid::CLOCK);
        self.rds.stats.clock += 1;

        // The Modified Julian Day is a 17-bit value.
        let clock = &mut self.rds.clock;
        clock.day_high = (b & B_MJD) >> 1 != 0;
        clock.day_low = ((b & 0x1) << 15) | ((c & C_MJD) >> 1);
        clock.hour = (((c & 0x1) << 4) | ((d & D_HOUR) >> 12)) as u8;
        clock.minute = ((d & D_MINUTE) >> 6) as u8;
        let offset = (d & D_UTC_OFFSET) as i8;
        clock.utc_offset = if d & D_UTC_OFFSET_SIGN != 0 {
            -offset
        } else {
            offset
        };
    }

    /// 4A: clock time and date. 4B: open data.
    fn decode_group_type_4(&mut self, gt: GroupType, blocks: &Blocks) {
        if gt.version == GroupVersion::A {
            self.update_clock(blocks);
        } else {
            self.decode_oda(gt, blocks);
        }
    }

    /// Append one block (two bytes) to the current transparent data
    /// channel's sliding window.
    fn decode_tdc_block(&mut self, block: &Block) {
        let channel = usize::from(self.rds.tdc.curr_channel);
        if channel >= NUM_TDC {
            return;
        }
        self.rds.set_valid(valid::TDC);
        self.rds.stats.tdc += 1;

        let data = &mut self.rds.tdc.data[channel];
        data.copy_within(2.., 0);
        let [hi, lo] = block.val.to_be_bytes();
        data[TDC_LEN - 2] = hi;
        data[TDC_LEN - 1] = lo;
    }

    /// 5A/5B: transparent data channels, unless claimed by an ODA.
    fn decode_group_type_5(&mut self, gt: GroupType, blocks: &Blocks) {
        if self.group_type_used_by_oda(gt) {
            self.decode_oda(gt, blocks);
            return;
        }
        if gt.version == GroupVersion::A {
            self.rds.tdc.curr_channel = (blocks.b.val & 0x1F) as u8;
            self.decode_tdc_block(&blocks.c);
            self.decode_tdc_block(&blocks.d);
        } else {
            self.decode_tdc_block(&blocks.d);
        }
    }

    /// 6A/6B: in-house applications, unless claimed by an ODA. Consumer
    /// receivers ignore the in-house payload, so only the counter moves.
    fn decode_group_type_6(&mut self, gt: GroupType, blocks: &Blocks) {
        if self.group_type_used_by_oda(gt) {
            self.decode_oda(gt, blocks);
            return;
        }
        self.rds.stats.in_house += 1;
    }

    /// 7A: radio paging (counted only; no station has been seen
    /// broadcasting it). 7B: open data.
    fn decode_group_type_7(&mut self, gt: GroupType, blocks: &Blocks) {
        if gt.version == GroupVersion::A {
            if self.group_type_used_by_oda(gt) {
                self.decode_oda(gt, blocks);
            } else {
                self.rds.stats.paging += 1;
            }
        } else {
            self.decode_oda(gt, blocks);
        }
    }

    /// 8A: traffic message channel. The ALERT-C payload (EN ISO 14819-1)
    /// is left to a registered ODA; without one only the counter moves.
    fn decode_group_type_8(&mut self, gt: GroupType, blocks: &Blocks) {
        if self.group_type_used_by_oda(gt) {
            self.decode_oda(gt, blocks);
            return;
        }
        if gt.version == GroupVersion::A {
            self.rds.stats.tmc += 1;
        }
    }

    /// 9A: emergency warning system raw blocks. 9B: open data.
    fn decode_group_type_9(&mut self, gt: GroupType, blocks: &Blocks) {
        if self.group_type_used_by_oda(gt) {
            self.decode_oda(gt, blocks);
            return;
        }
        if gt.version != GroupVersion::A {
            return;
        }
        // The format of the EWS message bits is assigned per country, so
        // the blocks are stored raw.
        self.rds.stats.ews += 1;
        self.rds.set_valid(valid::EWS);
        self.rds.ews.b = Block {
            val: blocks.b.val & 0b11111,
            errors: blocks.b.errors,
        };
        self.rds.ews.c = blocks.c;
        self.rds.ews.d = blocks.d;
    }

    /// Decode the program type name from group 10A.
    fn decode_ptyn(&mut self, blocks: &Blocks) {
        const B_PTYN_AB_FLAG: u16 = 0b10000;
        const B_PTYN_SEGMENT_ADDR: u16 = 0b00001;

        self.rds.set_valid(valid::PTYN);
        self.rds.stats.ptyn += 1;

        let ab = blocks.b.val & B_PTYN_AB_FLAG != 0;
        if self.rds.ptyn.last_ab != ab {
            // Flag flip announces a new name; stale halves must not mix.
            self.rds.ptyn.display = [0; 8];
            self.rds.ptyn.last_ab = ab;
        }

        let base = if blocks.b.val & B_PTYN_SEGMENT_ADDR != 0 {
            4
        } else {
            0
        };
        if blocks.c.errors <= BLER_C_MAX {
            let [hi, lo] = blocks.c.val.to_be_bytes();
            self.rds.ptyn.display[base] = hi;
            self.rds.ptyn.display[base + 1] = lo;
        }
        if blocks.d.errors <= BLER_D_MAX {
            let [hi, lo] = blocks.d.val.to_be_bytes();
            self.rds.ptyn.display[base + 2] = hi;
            self.rds.ptyn.display[base + 3] = lo;
        }
    }

    /// 10A: program type name. 10B: open data.
    fn decode_group_type_10(&mut self, gt: GroupType, blocks: &Blocks) {
        if gt.version == GroupVersion::A {
            self.decode_ptyn(blocks);
        } else {
            self.decode_oda(gt, blocks);
        }
    }

    /// Decode the variant-coded payload of group 14A (RBDS 3.2.1.8).
    fn decode_eon_variant(&mut self, blocks: &Blocks) {
        const EON_VC_AF: u16 = 4;
        const EON_VC_PTY_TA: u16 = 13;
        const EON_VC_PIN: u16 = 14;

        let c = blocks.c.val;
        let on = &mut self.rds.eon.on;
        match blocks.b.val & 0xF {
            // Variants 0..=3 carry the other network's PS name, two
            // characters per variant.
            variant @ 0..=3 => {
                let base = usize::from(variant) * 2;
                let [hi, lo] = c.to_be_bytes();
                on.ps[base] = hi;
                on.ps[base + 1] = lo;
            }
            EON_VC_AF => {
                // See RBDS 3.2.1.6.6.
                let first = (c >> 8) as u8;
                let second = (c & 0xFF) as u8;
                if af::is_count_code(first) {
                    on.af.decode_start_block(af::count_from_code(first), second);
                } else {
                    on.af.decode_nth_block(first, second);
                }
            }
            EON_VC_PTY_TA => {
                on.pty = ((c >> 11) & 0x1F) as u8;
                on.ta_code = c & 0x1 != 0;
            }
            EON_VC_PIN => on.pic = Pic::from_raw(c),
            // Mapped-frequency, linkage and broadcaster variants are not
            // kept.
            other => trace!(variant = other, "EON variant ignored"),
        }
    }

    /// 14A/14B: enhanced other networks (RBDS 3.1.5.19).
    fn decode_group_type_14(&mut self, gt: GroupType, blocks: &Blocks) {
        self.rds.stats.eon += 1;
        self.rds.set_valid(valid::EON);

        if gt.version == GroupVersion::A {
            self.decode_eon_variant(blocks);
        } else {
            if blocks.d.errors <= BLER_D_MAX {
                self.rds.eon.on.pi_code = blocks.d.val;
            }
            self.rds.eon.on.tp_code = blocks.b.val & 0b1000 != 0;
            self.rds.eon.on.ta_code = blocks.b.val & 0b0100 != 0;
        }
    }

    /// 15A: phased out by the 1998 revision, ignored. 15B: fast basic
    /// tuning and switching.
    fn decode_group_type_15(&mut self, gt: GroupType, blocks: &Blocks) {
        if gt.version == GroupVersion::A {
            return;
        }
        self.rds.stats.fbt += 1;
        if blocks.d.errors > BLER_D_MAX {
            return;
        }
        self.decode_ta(&blocks.b);
    }

    /// The basic program service update: write the character through
    /// as-per the RBDS specification.
    fn update_ps_simple(&mut self, char_idx: usize, byte: u8) {
        if char_idx >= self.rds.ps.display.len() {
            return;
        }
        self.rds.ps.display[char_idx] = byte;
        self.rds.set_valid(valid::PS);
    }

    /// The advanced program service update.
    ///
    /// Only displays complete names, for stations that rotate text
    /// through the PS field in violation of the RBDS standard, and rides
    /// out error-corrupted characters: a character must be received
    /// identically [`PS_VALIDATE_LIMIT`] times before it is trusted, and
    /// a whole name must validate before anything is displayed.
    fn update_ps_advanced(&mut self, char_idx: usize, byte: u8) {
        let ps = &mut self.rds.ps;
        if char_idx >= ps.display.len() {
            return;
        }

        let mut in_transition = false;

        if ps.hi_prob[char_idx] == byte {
            if ps.hi_prob_cnt[char_idx] < PS_VALIDATE_LIMIT {
                ps.hi_prob_cnt[char_idx] += 1;
            } else {
                // Saturated; mirror into the low probability slot too.
                ps.hi_prob_cnt[char_idx] = PS_VALIDATE_LIMIT;
                ps.lo_prob[char_idx] = byte;
            }
        } else if ps.lo_prob[char_idx] == byte {
            // Swap the candidates. The counter goes one past the limit
            // because the transition pass below knocks it back down.
            if ps.hi_prob_cnt[char_idx] >= PS_VALIDATE_LIMIT {
                in_transition = true;
                ps.hi_prob_cnt[char_idx] = PS_VALIDATE_LIMIT + 1;
            } else {
                ps.hi_prob_cnt[char_idx] = PS_VALIDATE_LIMIT;
            }
            ps.lo_prob[char_idx] = ps.hi_prob[char_idx];
            ps.hi_prob[char_idx] = byte;
        } else if ps.hi_prob_cnt[char_idx] == 0 {
            ps.hi_prob[char_idx] = byte;
            ps.hi_prob_cnt[char_idx] = 1;
        } else {
            ps.lo_prob[char_idx] = byte;
        }

        if in_transition {
            // Decrement every position so a half-replaced name does not
            // reach the display mid-change.
            for cnt in ps.hi_prob_cnt.iter_mut() {
                if *cnt > 1 {
                    *cnt -= 1;
                }
            }
        }

        let complete = ps.hi_prob_cnt.iter().all(|&cnt| cnt >= PS_VALIDATE_LIMIT);
        if complete {
            ps.display = ps.hi_prob;
            self.rds.set_valid(valid::PS);
        }
    }
}

/// Per-character error limits for radiotext: the first two characters of
/// a 4-character write come from block C, everything else from block D.
fn rt_char_acceptable(blocks: &Blocks, i: usize, count: usize) -> bool {
    if i < 2 && count > 2 {
        blocks.c.errors <= BLER_C_MAX
    } else {
        blocks.d.errors <= BLER_D_MAX
    }
}

/// The basic radiotext update: write characters straight to the display
/// buffer, honoring the 0x0D end-of-message character.
fn update_rt_simple(rt: &mut RtText, blocks: &Blocks, count: usize, addr: usize, chars: &[u8; 4]) {
    for i in 0..count {
        if !rt_char_acceptable(blocks, i, count) {
            continue;
        }
        rt.display[addr + i] = chars[i];
        if chars[i] == 0x0D {
            // End of message: wipe out the rest of the text.
            for slot in rt.display[addr + i + 1..].iter_mut() {
                *slot = 0;
            }
            break;
        }
    }

    // Any null character before the written address becomes a space.
    for slot in rt.display[..addr].iter_mut() {
        if *slot == 0 {
            *slot = b' ';
        }
    }
}

/// Restart radiotext validation; called when the A/B flag flips to a new
/// message.
fn bump_rt_validation(rt: &mut RtText) {
    rt.hi_prob_cnt = [0; RT_LEN];
    rt.hi_prob = [0; RT_LEN];
    rt.lo_prob = [0; RT_LEN];
}

/// The advanced radiotext update: same two-level confidence scheme as the
/// advanced PS update, with nulls treated as spaces.
fn update_rt_advanced(
    rt: &mut RtText,
    blocks: &Blocks,
    count: usize,
    addr: usize,
    chars: &[u8; 4],
) {
    let mut text_changing = false;

    for i in 0..count {
        if !rt_char_acceptable(blocks, i, count) {
            continue;
        }
        let byte = if chars[i] == 0 { b' ' } else { chars[i] };
        let pos = addr + i;

        if rt.hi_prob[pos] == byte {
            if rt.hi_prob_cnt[pos] < RT_VALIDATE_LIMIT {
                rt.hi_prob_cnt[pos] += 1;
            } else {
                rt.hi_prob_cnt[pos] = RT_VALIDATE_LIMIT;
                rt.lo_prob[pos] = byte;
            }
        } else if rt.lo_prob[pos] == byte {
            if rt.hi_prob_cnt[pos] >= RT_VALIDATE_LIMIT {
                text_changing = true;
                rt.hi_prob_cnt[pos] = RT_VALIDATE_LIMIT + 1;
            } else {
                rt.hi_prob_cnt[pos] = RT_VALIDATE_LIMIT;
            }
            rt.lo_prob[pos] = rt.hi_prob[pos];
            rt.hi_prob[pos] = byte;
        } else if rt.hi_prob_cnt[pos] == 0 {
            rt.hi_prob[pos] = byte;
            rt.hi_prob_cnt[pos] = 1;
        } else {
            rt.lo_prob[pos] = byte;
        }
    }

    if !text_changing {
        return;
    }
    // The text is changing: decrement every position so a message in
    // transition is not displayed piecemeal.
    for cnt in rt.hi_prob_cnt.iter_mut() {
        if *cnt > 1 {
            *cnt -= 1;
        }
    }
}

#[cfg(test)]
#[path = "decoder_tests.rs"]
mod tests;
