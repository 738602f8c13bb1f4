//! rdsstats: decode an RDS Spy log and report receive statistics.
//!
//! Feeds every group of the log through the decoder (advanced PS
//! decoding enabled, open data applications counted through the ODA
//! callback) and prints what was received.
//!
//! ```bash
//! rdsstats capture.spy
//! rdsstats --json -vv capture.spy
//! ```

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{ArgAction, Parser};
use serde::Serialize;
use tracing::info;

use rdsdec::data::{oda_app_name, pty_name, valid, DecoderStats};
use rdsdec::{spylog, DecoderConfig, RdsDecoder};

// http://www.rds.org.uk/2010/pdf/R17_032_1.pdf
const AID_RT_PLUS: u16 = 0x4BD7; // Radiotext Plus (RT+).
const AID_TMC: u16 = 0xCD46; // RDS-TMC ALERT-C.
const AID_ITUNES: u16 = 0xC3B0; // iTunes tagging.

#[derive(Parser, Debug)]
#[command(author, version, about = "RDS receive statistics from an RDS Spy log", long_about = None)]
struct Args {
    /// Path to the RDS Spy log file
    log: PathBuf,

    /// Use the simple (per-standard) PS decoding algorithm
    #[arg(long, default_value_t = false)]
    simple_ps: bool,

    /// Output the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Verbosity level (-v=info, -vv=debug, -vvv=trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Packet counts for the open data applications the tool recognizes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
struct OdaCounts {
    rtplus: u32,
    tmc: u32,
    itunes: u32,
}

/// The `--json` report.
#[derive(Debug, Serialize)]
struct StatsReport {
    groups_total: u32,
    block_b_errors: u32,
    groups: Vec<GroupReport>,
    packets: PacketReport,
    oda: OdaCounts,
    station: Option<StationReport>,
}

#[derive(Debug, Serialize)]
struct GroupReport {
    group: String,
    count: u16,
}

#[derive(Debug, Serialize)]
struct PacketReport {
    af: u32,
    clock: u32,
    eon: u32,
    ews: u32,
    fbt: u32,
    ih: u32,
    ms: u32,
    paging: u32,
    pi_code: u32,
    pic: u32,
    ps: u32,
    pty: u32,
    ptyn: u32,
    rt: u32,
    slc: u32,
    ta_code: u32,
    tdc: u32,
    tmc: u32,
    tp_code: u32,
}

#[derive(Debug, Serialize)]
struct StationReport {
    pi: String,
    pty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ps: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    radiotext: Option<String>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();

    let groups = match spylog::load_spy_log(&args.log) {
        Ok(groups) => groups,
        Err(spylog::Error::Io(err)) => {
            eprintln!("can't read \"{}\": {err}", args.log.display());
            return ExitCode::from(2);
        }
        Err(spylog::Error::Empty) => {
            eprintln!("\"{}\" is empty", args.log.display());
            return ExitCode::from(3);
        }
    };
    info!(groups = groups.len(), "log loaded");

    let mut decoder = RdsDecoder::new(DecoderConfig {
        advanced_ps_decoding: !args.simple_ps,
    });

    let oda_counts = Rc::new(RefCell::new(OdaCounts::default()));
    let decode_counts = Rc::clone(&oda_counts);
    let clear_counts = Rc::clone(&oda_counts);
    decoder.set_oda_callbacks(
        Box::new(move |app_id, _rds, _blocks, _gt| {
            let mut counts = decode_counts.borrow_mut();
            match app_id {
                AID_RT_PLUS => counts.rtplus += 1,
                AID_TMC => counts.tmc += 1,
                AID_ITUNES => counts.itunes += 1,
                _ => {}
            }
        }),
        Box::new(move || {
            *clear_counts.borrow_mut() = OdaCounts::default();
        }),
    );

    for blocks in &groups {
        decoder.decode(blocks);
    }

    let oda = *oda_counts.borrow();
    if args.json {
        let report = build_report(&decoder, oda);
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("can't serialize report: {err}");
                return ExitCode::from(2);
            }
        }
    } else {
        print_stats(&decoder, oda);
    }

    ExitCode::SUCCESS
}

fn print_stats(decoder: &RdsDecoder, oda: OdaCounts) {
    let rds = decoder.data();
    let stats = &rds.stats;

    println!("RDS: {}", stats.data_cnt);
    println!("BERR: {}", stats.blckb_errors);
    for (code, group) in stats.groups.iter().enumerate() {
        println!("{code}A: {}", group.a);
        println!("{code}B: {}", group.b);
    }

    println!("AF: {}", stats.af);
    println!("CLOCK: {}", stats.clock);
    println!("EON: {}", stats.eon);
    println!("EWS: {}", stats.ews);
    println!("FBT: {}", stats.fbt);
    println!("IH: {}", stats.in_house);
    println!("MS: {}", stats.ms);
    println!("PAGING: {}", stats.paging);
    println!("PI_CODE: {}", stats.pi_code);
    println!("PIC: {}", stats.pic);
    println!("PS: {}", stats.ps);
    println!("PTY: {}", stats.pty);
    println!("PTYN: {}", stats.ptyn);
    println!("RT: {}", stats.rt);
    println!("SLC: {}", stats.slc);
    println!("TA_CODE: {}", stats.ta_code);
    println!("TDC: {}", stats.tdc);
    println!("TMC: {}", stats.tmc);
    println!("TP_CODE: {}", stats.tp_code);

    println!("RT+: {}", oda.rtplus);
    println!("RDS-TMC: {}", oda.tmc);
    println!("iTunes: {}", oda.itunes);

    if rds.is_valid(valid::PI_CODE) {
        println!("Station: 0x{:04X} ({})", rds.pi_code, pty_name(rds.pty));
    }
    if rds.is_valid(valid::PS) {
        println!("PS: \"{}\"", String::from_utf8_lossy(&rds.ps.display));
    }
    if rds.is_valid(valid::RT) {
        println!("Radiotext: \"{}\"", current_radiotext(rds));
    }
    for oda in &rds.oda[..usize::from(rds.oda_cnt)] {
        println!(
            "ODA 0x{:04X} ({}): {} packets",
            oda.id,
            oda_app_name(oda.id),
            oda.pkt_count
        );
    }
}

fn build_report(decoder: &RdsDecoder, oda: OdaCounts) -> StatsReport {
    let rds = decoder.data();
    let stats = &rds.stats;

    let station = rds.is_valid(valid::PI_CODE).then(|| StationReport {
        pi: format!("0x{:04X}", rds.pi_code),
        pty: pty_name(rds.pty).to_string(),
        ps: rds
            .is_valid(valid::PS)
            .then(|| String::from_utf8_lossy(&rds.ps.display).into_owned()),
        radiotext: rds.is_valid(valid::RT).then(|| current_radiotext(rds)),
    });

    StatsReport {
        groups_total: stats.data_cnt,
        block_b_errors: stats.blckb_errors,
        groups: group_reports(stats),
        packets: PacketReport {
            af: stats.af,
            clock: stats.clock,
            eon: stats.eon,
            ews: stats.ews,
            fbt: stats.fbt,
            ih: stats.in_house,
            ms: stats.ms,
            paging: stats.paging,
            pi_code: stats.pi_code,
            pic: stats.pic,
            ps: stats.ps,
            pty: stats.pty,
            ptyn: stats.ptyn,
            rt: stats.rt,
            slc: stats.slc,
            ta_code: stats.ta_code,
            tdc: stats.tdc,
            tmc: stats.tmc,
            tp_code: stats.tp_code,
        },
        oda,
        station,
    }
}

fn group_reports(stats: &DecoderStats) -> Vec<GroupReport> {
    let mut reports = Vec::with_capacity(32);
    for (code, group) in stats.groups.iter().enumerate() {
        reports.push(GroupReport {
            group: format!("{code}A"),
            count: group.a,
        });
        reports.push(GroupReport {
            group: format!("{code}B"),
            count: group.b,
        });
    }
    reports
}

/// The currently addressed radiotext buffer, trimmed at the end-of-text
/// character.
fn current_radiotext(rds: &rdsdec::RdsData) -> String {
    let text = match rds.rt.current {
        rdsdec::data::RtFlag::A => &rds.rt.a.display,
        rdsdec::data::RtFlag::B => &rds.rt.b.display,
    };
    let end = text
        .iter()
        .position(|&b| b == 0x0D || b == 0)
        .unwrap_or(text.len());
    String::from_utf8_lossy(&text[..end]).into_owned()
}
