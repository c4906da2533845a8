use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use feeder_ybus::{
    load_circuit, make_ybus, phase_slots, save_network, write_network, BusIndex, RegulatorPolicy,
    Topology, YbusOpt, YbusOptBuilder,
};
use std::path::PathBuf;

/// Three-phase admittance matrix assembly for distribution feeders.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the reduced admittance matrix
    Build(BuildArgs),

    /// List buses in matrix order
    Buses(BusesArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Circuit export (JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file, written to stdout if absent
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Regulator embedding.
    #[arg(long, default_value_t = RegulatorPolicy::Ideal)]
    policy: RegulatorPolicy,

    /// Transformer regularization.
    #[arg(long)]
    epsilon: Option<f64>,

    /// Base apparent power (kVA).
    #[arg(long)]
    kva_base: Option<f64>,

    /// Base line-to-line voltage (kV).
    #[arg(long)]
    kvll_base: Option<f64>,

    /// Include the branch admittance and incidence matrices.
    #[arg(long, default_value_t = false)]
    branches: bool,
}

#[derive(Args)]
struct BusesArgs {
    /// Circuit export (JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Include buses only reached through regulators.
    #[arg(long, default_value_t = false)]
    with_regulators: bool,
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_level(false)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(_) => {
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Build(args) => build(args),
        Commands::Buses(args) => buses(args),
    }
}

fn build(args: &BuildArgs) -> Result<()> {
    let ckt = load_circuit(&args.input)?;

    let mut builder = YbusOptBuilder::default();
    builder.reg_policy(args.policy);
    if let Some(epsilon) = args.epsilon {
        builder.epsilon(epsilon);
    }
    if let Some(kva) = args.kva_base {
        builder.kva_base(kva);
    }
    if let Some(kv) = args.kvll_base {
        builder.kvll_base(kv);
    }
    let opt = builder.build()?;

    let (network, branches) = make_ybus(&ckt, &opt)?;
    let branches = if args.branches {
        Some(&branches)
    } else {
        None
    };

    match &args.output {
        Some(out_path) => save_network(out_path, &network, branches)?,
        None => write_network(std::io::stdout().lock(), &network, branches)?,
    }
    Ok(())
}

fn buses(args: &BusesArgs) -> Result<()> {
    let ckt = load_circuit(&args.input)?;
    let opt = YbusOpt::default();
    let topo = Topology::from_circuit(&ckt, &opt)?;

    let index = if args.with_regulators {
        BusIndex::new(topo.pairs_with_regulators(), &topo.source_bus)?
    } else {
        BusIndex::new(topo.branch_pairs(), &topo.source_bus)?
    };
    for (i, name) in index.names().iter().enumerate() {
        let slots = phase_slots(i);
        println!("{}\t{}\t{}\t{}", name, slots[0], slots[1], slots[2]);
    }
    Ok(())
}
