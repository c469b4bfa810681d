use anyhow::{Context, Result};
use fsarray_demo::cli::Cli;
use fsarray_demo::scenario;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    for scenario in cli.scenario.scenarios() {
        println!("--- {} ---", scenario.name());
        let snapshots = scenario::run(scenario)
            .with_context(|| format!("Scenario failed: {}", scenario.name()))?;
        for snapshot in &snapshots {
            println!("{}", snapshot);
        }
    }

    if let Some(count) = cli.count {
        println!("--- growth over {} random pushes ---", count);
        let growths = scenario::grow_random(count, &mut rand::rng())
            .context("Random growth failed")?;
        for growth in growths {
            println!("len {:>6} -> capacity {:>6}", growth.len, growth.capacity);
        }
    }

    Ok(())
}
