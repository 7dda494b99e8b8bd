use grid_search::compare::{compare_parallel, compare_sequential};
use grid_search::config::{Cli, Config};
use grid_search::map::Grid;
use grid_search::report::{format_table, render_overlay, write_json};

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("failed to read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let grid = match &config.map_path {
        Some(map_path) => Grid::from_file(map_path)?,
        None => {
            let random = &config.random;
            info!(
                "No map file specified, generating a {}x{} map with obstacle density {} (seed {})",
                random.width, random.height, random.obstacle_density, random.seed
            );
            let mut rng = StdRng::seed_from_u64(random.seed);
            Grid::random(
                random.width,
                random.height,
                random.obstacle_density,
                &[config.start, config.goal],
                &mut rng,
            )?
        }
    };
    info!(
        "Map {}x{} with {} free cells",
        grid.width(),
        grid.height(),
        grid.free_count()
    );

    let grid = Arc::new(grid);
    let results = if config.parallel {
        compare_parallel(
            Arc::clone(&grid),
            config.start,
            config.goal,
            &config.modes,
            config.heuristic,
        )
        .await?
    } else {
        compare_sequential(
            &grid,
            config.start,
            config.goal,
            &config.modes,
            config.heuristic,
        )?
    };

    for result in results.iter().filter(|result| !result.found_path()) {
        warn!("{} found no path from {} to {}", result.mode, config.start, config.goal);
    }

    if config.render {
        for result in &results {
            println!("{}", result.mode);
            println!(
                "{}",
                render_overlay(&grid, result, config.start, config.goal)
            );
        }
    }

    print!("{}", format_table(&results));

    if let Some(output_path) = &config.output_path {
        write_json(output_path, &results)?;
        info!("Results written to {output_path}");
    }

    Ok(())
}
