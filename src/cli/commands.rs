use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::processors::{IntegrityChecker, Pipeline};
use crate::utils::progress::ProgressReporter;
use crate::writers::ParquetWriter;
use std::path::PathBuf;

fn load_config(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    years: Option<Vec<i32>>,
) -> Result<PipelineConfig> {
    PipelineConfig::load(config.as_deref())?.with_overrides(data_dir, years)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            data_dir,
            years,
            config,
            compression,
            quiet,
        } => {
            let config = load_config(config, data_dir, years)?.with_compression(compression)?;
            println!("Building bikeshare demand...");
            println!("Data directory: {}", config.data_dir.display());
            println!("Years: {:?}", config.years);

            let pipeline = Pipeline::new(config).with_silent(quiet);
            let summary = pipeline.run()?;

            let checker = IntegrityChecker::new();
            println!("\n{}", checker.generate_summary(&summary.integrity));
            println!("Weather phrases: {}", summary.phrases);
            for year in &summary.years {
                println!(
                    "{}",
                    checker.aggregation_summary(&format!("pickups {}", year.year), &year.pickups)
                );
                println!(
                    "{}",
                    checker.aggregation_summary(&format!("returns {}", year.year), &year.returns)
                );
                println!(
                    "demand {}: {} rows -> {}",
                    year.year,
                    year.demand_rows,
                    year.results_path.display()
                );
            }

            let file_info = pipeline.config().parquet_writer()?.get_file_info(&summary.parquet_path)?;
            println!("\n{}", file_info.summary());
            println!(
                "\nWrote {} rows to {} and {}",
                summary.combined_rows,
                summary.csv_path.display(),
                summary.parquet_path.display()
            );
        }

        Commands::Aggregate {
            action,
            year,
            data_dir,
            config,
            quiet,
        } => {
            let config = load_config(config, data_dir, None)?;
            let data_dir = config.data_dir.clone();
            let summary = Pipeline::new(config)
                .with_silent(quiet)
                .aggregate_direction(&action, year)?;

            println!(
                "{}",
                IntegrityChecker::new().aggregation_summary(&format!("{} {}", action, year), &summary)
            );
            println!("Tables written under {}", data_dir.display());
        }

        Commands::Clusters { data_dir, config } => {
            let config = load_config(config, data_dir, None)?;
            let pipeline = Pipeline::new(config);

            let progress = ProgressReporter::new_spinner("Clustering stations...", false);
            let stations = pipeline.load_stations()?;
            let (table, report) = pipeline.build_clusters(&stations)?;
            progress.finish_with_message(&format!(
                "Clustered {} stations into {} clusters",
                stations.len(),
                table.clusters.len()
            ));

            println!("\n{:>10} {:>6} {:>6} {:>10}", "cluster_id", "size", "L1", "L2");
            for cluster in &table.clusters {
                println!(
                    "{:>10} {:>6} {:>6} {:>10}",
                    cluster.cluster_id, cluster.size, cluster.l1, cluster.l2
                );
            }

            println!("\n{}", IntegrityChecker::new().generate_summary(&report));
        }

        Commands::WeatherPhrases { data_dir } => {
            let config = load_config(None, data_dir, None)?;
            let pipeline = Pipeline::new(config);

            let observations = pipeline.load_observations()?;
            let phrases = pipeline.normalize_weather(&observations)?;

            println!(
                "{:<32} {:>7} {:>5} {:>7} {:>7} {:>8} {:>6} {:>5} {:>6}",
                "phrase", "count", "wind", "wintry", "thunder", "extreme", "foggy", "rain", "clear"
            );
            for row in phrases.rows() {
                let i = &row.indicators;
                println!(
                    "{:<32} {:>7} {:>5} {:>7} {:>7} {:>8} {:>6} {:>5} {:>6}",
                    row.phrase,
                    row.count,
                    i.wind as u8,
                    i.wintry as u8,
                    i.thunderstorm as u8,
                    i.extreme_weather as u8,
                    i.foggy as u8,
                    i.rain,
                    i.clear_sky as u8
                );
            }
            println!("\n{} phrases from {} observations", phrases.len(), observations.len());
        }

        Commands::Info { file } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;

            println!("\nFile Details:");
            println!("{}", file_info.summary());

            println!("\nDemand distribution:");
            for (demand, rows) in writer.demand_histogram(&file)? {
                println!("{:>6}: {}", demand, rows);
            }
        }
    }

    Ok(())
}
