//! genl-families - dump the kernel's generic netlink family registry.
//!
//! Sends a single controller dump request and prints every registered
//! family with its operations and multicast groups.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use genlink::netlink::NetlinkSocket;
use genlink::netlink::genl::{FamilyDescriptor, dump_families};

#[derive(Parser)]
#[command(name = "genl-families")]
#[command(about = "List registered generic netlink families", long_about = None)]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "genlink=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn print_family(family: &FamilyDescriptor) {
    println!("{:-<65}", "");
    println!(
        "{:4}  {}  (version {}, hdrsize {}, maxattr {})",
        family.id, family.name, family.version, family.header_size, family.max_attr
    );

    if !family.operations.is_empty() {
        println!("  operations:");
        for op in &family.operations {
            println!("    {:3}. id: {:3}  flags: {:#06x}", op.index, op.id, op.flags);
        }
    }

    if !family.groups.is_empty() {
        println!("  multicast groups:");
        for group in &family.groups {
            println!("    {:3}. id: {:3}  name: {}", group.index, group.id, group.name);
        }
    }
}

fn main() -> genlink::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut socket = NetlinkSocket::generic()?;
    let families = dump_families(&mut socket)?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&families).expect("descriptors serialize")
        );
    } else {
        for family in &families {
            print_family(family);
        }
    }

    Ok(())
}
