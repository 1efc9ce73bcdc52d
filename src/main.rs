//! hedge-engine CLI
//!
//! Net paper trades and allocate them to physical cargoes from the command line.
//!
//! # Usage
//!
//! ```bash
//! # FIFO-net a paper ledger
//! hedge-engine net --paper paper.json
//!
//! # Net, then allocate to cargoes
//! hedge-engine match --paper paper.json --physical physical.json
//!
//! # Strict direction matching with a three-tier benchmark order, as JSON
//! hedge-engine match --paper paper.json --physical physical.json \
//!     --direction opposite --tiers BRENT,JCC --format json
//!
//! # Generate a random book for testing
//! hedge-engine generate --trades 500 --cargoes 40 --output ./book
//! ```

use hedge_engine::core::table::{cargo_record, paper_from_json, paper_record, physical_from_json};
use hedge_engine::core::trade::PaperTrade;
use hedge_engine::core::cargo::Cargo;
use hedge_engine::optimization::allocation::{
    AllocationEngine, AllocationPolicy, AllocationResult, BenchmarkTiers, DirectionPolicy,
};
use hedge_engine::optimization::exposure::ExposureReport;
use hedge_engine::optimization::netting::NettingEngine;
use hedge_engine::simulation::book_generator::{generate_book, BookConfig};
use std::fs;
use std::path::Path;
use std::process;

fn print_usage() {
    eprintln!(
        r#"hedge-engine: FIFO paper netting and physical hedge allocation

USAGE:
    hedge-engine <COMMAND> [OPTIONS]

COMMANDS:
    net         FIFO-net a paper ledger
    match       Net paper, then allocate it to physical cargoes
    generate    Generate a random paper/physical book (for testing)
    help        Show this message

OPTIONS (net, match):
    --paper <FILE>        Paper ledger: JSON array of row objects
    --format <FORMAT>     Output format: text (default) or json

OPTIONS (match):
    --physical <FILE>     Physical ledger: JSON array of row objects
    --policy <FILE>       Allocation policy JSON (direction, benchmarks, min_cargo_need)
    --direction <POLICY>  ignore (default) or opposite
    --tiers <LIST>        Comma-separated benchmark priority (default: BRENT)

OPTIONS (generate):
    --trades <N>          Number of paper tickets (default: 200)
    --cargoes <N>         Number of cargoes (default: 20)
    --output <DIR>        Write paper.json and physical.json into DIR

Set RUST_LOG=info (or debug) for engine logging.

EXAMPLES:
    hedge-engine net --paper paper.json
    hedge-engine match --paper paper.json --physical physical.json
    hedge-engine match --paper paper.json --physical physical.json --direction opposite --tiers BRENT,JCC
    hedge-engine generate --trades 500 --cargoes 40 --output ./book"#
    );
}

fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with(format!("cannot read '{}': {}", path, e)))
}

fn load_paper(path: &str) -> Vec<PaperTrade> {
    paper_from_json(&read_file(path)).unwrap_or_else(|e| exit_with(format!("{}: {}", path, e)))
}

fn load_physical(path: &str) -> Vec<Cargo> {
    physical_from_json(&read_file(path)).unwrap_or_else(|e| exit_with(format!("{}: {}", path, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with(format!("cannot serialize output: {}", e)))
}

/// Pull the value following a flag.
fn flag_value(args: &[String], i: usize, flag: &str, expected: &str) -> String {
    args.get(i)
        .cloned()
        .unwrap_or_else(|| exit_with(format!("{} requires {}", flag, expected)))
}

/// Accepted values for `--format`.
fn output_format(raw: &str) -> Option<&'static str> {
    match raw.trim().to_lowercase().as_str() {
        "text" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn format_flag(args: &[String], i: usize) -> &'static str {
    let raw = flag_value(args, i, "--format", "'text' or 'json'");
    output_format(&raw)
        .unwrap_or_else(|| exit_with(format!("unknown format '{}', expected 'text' or 'json'", raw)))
}

#[derive(serde::Serialize)]
struct MatchOutput<'a> {
    #[serde(flatten)]
    result: &'a AllocationResult,
    exposure: &'a ExposureReport,
}

fn cmd_net(args: &[String]) {
    let mut paper_path = None;
    let mut format = "text";
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--paper" => {
                i += 1;
                paper_path = Some(flag_value(args, i, "--paper", "a file path"));
            }
            "--format" => {
                i += 1;
                format = format_flag(args, i);
            }
            _ => exit_with(format!("unknown option: {}", args[i])),
        }
        i += 1;
    }

    let path = paper_path.unwrap_or_else(|| exit_with("--paper <FILE> is required"));
    let result = NettingEngine::net_positions(&load_paper(&path));

    if format == "json" {
        println!("{}", to_json(&result));
    } else {
        println!("{}", result);
        for trade in result.trades() {
            let path = trade.close_path();
            println!(
                "  Tkt#{:<12} {:<20} vol {:>12} open {:>12} closed {:>12} {}",
                trade.ticket(),
                trade.group_key().as_str(),
                trade.volume(),
                trade.net_open_volume(),
                trade.closed_volume(),
                path.description
            );
        }
    }
}

fn cmd_match(args: &[String]) {
    let mut paper_path = None;
    let mut physical_path = None;
    let mut policy_path = None;
    let mut direction = None;
    let mut tiers = None;
    let mut format = "text";
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--paper" => {
                i += 1;
                paper_path = Some(flag_value(args, i, "--paper", "a file path"));
            }
            "--physical" => {
                i += 1;
                physical_path = Some(flag_value(args, i, "--physical", "a file path"));
            }
            "--policy" => {
                i += 1;
                policy_path = Some(flag_value(args, i, "--policy", "a file path"));
            }
            "--direction" => {
                i += 1;
                let raw = flag_value(args, i, "--direction", "'ignore' or 'opposite'");
                direction = Some(
                    raw.parse::<DirectionPolicy>()
                        .unwrap_or_else(|e| exit_with(e)),
                );
            }
            "--tiers" => {
                i += 1;
                let raw = flag_value(args, i, "--tiers", "a comma-separated list");
                tiers = Some(BenchmarkTiers::new(raw.split(',')));
            }
            "--format" => {
                i += 1;
                format = format_flag(args, i);
            }
            _ => exit_with(format!("unknown option: {}", args[i])),
        }
        i += 1;
    }

    let paper_path = paper_path.unwrap_or_else(|| exit_with("--paper <FILE> is required"));
    let physical_path = physical_path.unwrap_or_else(|| exit_with("--physical <FILE> is required"));

    let mut policy = match policy_path {
        Some(path) => AllocationPolicy::from_json(&read_file(&path))
            .unwrap_or_else(|e| exit_with(format!("{}: {}", path, e))),
        None => AllocationPolicy::default(),
    };
    if let Some(direction) = direction {
        policy.direction = direction;
    }
    if let Some(tiers) = tiers {
        policy.benchmarks = tiers;
    }

    let paper = load_paper(&paper_path);
    let cargoes = load_physical(&physical_path);
    if cargoes.is_empty() {
        log::warn!("physical ledger '{}' is empty", physical_path);
    }

    let netted = NettingEngine::net_positions(&paper);
    let result = AllocationEngine::new(policy).allocate(&cargoes, netted.trades());
    let exposure = ExposureReport::from_allocation(&result);

    if format == "json" {
        println!(
            "{}",
            to_json(&MatchOutput {
                result: &result,
                exposure: &exposure,
            })
        );
    } else {
        println!("=== Hedge Relations (run {}) ===", result.run_id);
        if result.relations.is_empty() {
            println!("No matches.");
        }
        for rel in &result.relations {
            let lag = rel
                .time_lag_days
                .map(|d| format!("{:+}d", d))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<12} <- Tkt#{:<12} {:<7} {:>12}  lag {:>6}  mtm {:>12}  pl {:>12}",
                rel.cargo_id.as_str(),
                rel.ticket,
                rel.month.as_str(),
                rel.allocated_volume,
                lag,
                rel.unrealized_mtm,
                rel.allocated_pl
            );
            if !rel.close_path.is_empty() {
                println!("      closed via {}", rel.close_path);
            }
        }
        println!();
        println!("{}", exposure);
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = BookConfig::default();
    let mut output_dir: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--trades" => {
                i += 1;
                config.trade_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| exit_with("--trades requires a number"));
            }
            "--cargoes" => {
                i += 1;
                config.cargo_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| exit_with("--cargoes requires a number"));
            }
            "--output" => {
                i += 1;
                output_dir = Some(flag_value(args, i, "--output", "a directory"));
            }
            _ => exit_with(format!("unknown option: {}", args[i])),
        }
        i += 1;
    }

    let book = generate_book(&config);
    let paper: Vec<_> = book.paper.iter().map(paper_record).collect();
    let physical: Vec<_> = book.cargoes.iter().map(cargo_record).collect();

    match output_dir {
        Some(dir) => {
            let dir = Path::new(&dir);
            fs::create_dir_all(dir)
                .unwrap_or_else(|e| exit_with(format!("cannot create '{}': {}", dir.display(), e)));
            for (name, rows) in [("paper.json", &paper), ("physical.json", &physical)] {
                let path = dir.join(name);
                fs::write(&path, to_json(rows))
                    .unwrap_or_else(|e| exit_with(format!("cannot write '{}': {}", path.display(), e)));
            }
            eprintln!(
                "Generated {} paper tickets and {} cargoes → {}",
                paper.len(),
                physical.len(),
                dir.display()
            );
        }
        None => {
            let combined = serde_json::json!({ "paper": paper, "physical": physical });
            println!("{}", to_json(&combined));
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "net" => cmd_net(rest),
        "match" => cmd_match(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
