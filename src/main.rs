//! Entry point for the RuNeZonal application.
//! Handles CLI parsing and logging setup, then runs the zonal statistics pipeline.

use clap::Parser;
use log::LevelFilter;
use ru_ne_zonal::cli::Args;
use ru_ne_zonal::parallel::get_parallel_info;
use ru_ne_zonal::pipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    println!(
        r#"
------------------------------------------------------------------
          ______      _   _      _____                 _
          | ___ \    | \ | |    |___  /                | |
          | |_/ /   _|  \| | ___   / /  ___  _ __   __ _| |
          |    / | | | . ` |/ _ \ / /  / _ \| '_ \ / _` | |
          | |\ \ |_| | |\  |  __/./ /__| (_) | | | | (_| | |
          \_| \_\__,_\_| \_/\___|\_____/\___/|_| |_|\__,_|_|
                Zonal statistics for NetCDF forecasts
------------------------------------------------------------------
                        "#
    );

    let config = args.into_config();
    config.parallel.setup_global_pool()?;
    get_parallel_info().log_info();

    let summary = pipeline::run(&config)?;
    log::info!(
        "Wrote {} tables from {} files into {}",
        summary.written.len(),
        summary.files_processed,
        config.output_dir.display()
    );

    Ok(())
}
