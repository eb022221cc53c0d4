use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use mobcap_core::{Engine, FileProtectionStore, MobcapConfig, ProximityStrategyKind};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use std::path::PathBuf;
use std::sync::Arc;

mod sim;

use sim::{SimSettings, SyntheticWorld};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    /// Cylinder test against every observer
    Direct,
    /// Ring walk over loaded cells
    Ring,
}

impl From<StrategyArg> for ProximityStrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Direct => ProximityStrategyKind::DirectScan,
            StrategyArg::Ring => ProximityStrategyKind::RingScan,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON configuration file (defaults to ./mobcap.ron if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long, default_value = "6000")]
    ticks: u64,

    /// Seed for the synthetic world
    #[arg(long, default_value = "12345")]
    seed: u64,

    /// Number of wandering observers
    #[arg(long, default_value = "4")]
    observers: usize,

    /// Proximity strategy, overriding the configuration
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// World name to simulate
    #[arg(long, default_value = "overworld")]
    world: String,

    /// Half-width of the loaded square in chunk cells
    #[arg(long, default_value = "12")]
    radius: i32,

    /// Persist animal protection to the configured file
    #[arg(long)]
    persist: bool,

    /// Print the default configuration as RON and exit
    #[arg(long)]
    dump_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.dump_default_config {
        let text = MobcapConfig::default()
            .to_ron_string()
            .context("Failed to serialize default configuration")?;
        println!("{}", text);
        return Ok(());
    }

    let config =
        MobcapConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let protection_file = config.general.protection.file.clone();

    let mut engine = Engine::new(config);
    if let Some(strategy) = args.strategy {
        engine = engine.with_strategy(strategy.into());
    }
    if args.persist {
        engine = engine.with_store(Arc::new(FileProtectionStore::new(&protection_file)));
        let loaded = engine
            .load_protection()
            .with_context(|| format!("Failed to load protection file {:?}", protection_file))?;
        log::info!("Restored {} protected animals", loaded);
    }

    log::info!("Starting mobcap harness");
    log::info!("  World: {}", args.world);
    log::info!("  Ticks: {}", args.ticks);
    log::info!("  Seed: {}", args.seed);
    log::info!("  Observers: {}", args.observers);
    log::info!("  Proximity: {}", engine.proximity().name());

    let settings = SimSettings {
        world: args.world.clone(),
        radius_cells: args.radius.max(1),
        observers: args.observers,
        ..SimSettings::default()
    };
    let mut world = SyntheticWorld::new(settings, Xoshiro256StarStar::seed_from_u64(args.seed));
    world.setup(&mut engine);

    let progress = ProgressBar::new(args.ticks);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} ticks ({per_sec}) {msg}")
            .context("Invalid progress template")?,
    );
    for _ in 0..args.ticks {
        world.step(&mut engine);
        progress.inc(1);
        if engine.current_tick() % 100 == 0 {
            progress.set_message(format!("{} alive", world.population()));
        }
    }
    progress.finish_with_message(format!("{} alive", world.population()));

    if args.persist {
        log::info!("Final protection flush: {:?}", engine.flush_protection());
    }

    let stats = world.stats();
    println!("attempts:      {}", stats.attempts);
    println!("allowed:       {}", stats.allowed);
    println!("uncontrolled:  {}", stats.uncontrolled);
    for (reason, count) in &stats.denied {
        println!("denied {:<24} {}", reason, count);
    }
    println!("despawned:     {}", stats.despawned);
    println!("deaths:        {}", stats.deaths);
    println!("silent losses: {}", stats.silent_losses);
    println!("recount drift: {}", stats.recount_drift);
    println!();

    match engine.world_report(&args.world) {
        Some(report) => print!("{}", report),
        None => println!("world '{}' is not under population control", args.world),
    }

    Ok(())
}
