use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bikeshare-demand")]
#[command(about = "Batch pipeline building per-cluster bikeshare demand from trips, stations and weather")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full batch: cluster, aggregate, compute demand, combine
    Run {
        #[arg(short, long, help = "Data directory [default: data]")]
        data_dir: Option<PathBuf>,

        #[arg(
            short,
            long,
            value_delimiter = ',',
            num_args = 1..,
            help = "Years to process [default: 2017,2018,2019]"
        )]
        years: Option<Vec<i32>>,

        #[arg(short, long, help = "TOML configuration file")]
        config: Option<PathBuf>,

        #[arg(long, help = "Parquet compression (snappy, gzip, lz4, zstd, none) [default: snappy]")]
        compression: Option<String>,

        #[arg(long, default_value = "false", help = "Hide progress bars")]
        quiet: bool,
    },

    /// Aggregate one direction of trips over one year into its action table
    Aggregate {
        #[arg(help = "Action to count: pickups or returns")]
        action: String,

        #[arg(short, long, help = "Year to aggregate")]
        year: i32,

        #[arg(short, long, help = "Data directory [default: data]")]
        data_dir: Option<PathBuf>,

        #[arg(short, long, help = "TOML configuration file")]
        config: Option<PathBuf>,

        #[arg(long, default_value = "false", help = "Hide progress bars")]
        quiet: bool,
    },

    /// Cluster the stations and print the cluster table with its integrity report
    Clusters {
        #[arg(short, long, help = "Data directory [default: data]")]
        data_dir: Option<PathBuf>,

        #[arg(short, long, help = "TOML configuration file")]
        config: Option<PathBuf>,
    },

    /// Print the weather phrase indicator table
    WeatherPhrases {
        #[arg(short, long, help = "Data directory [default: data]")]
        data_dir: Option<PathBuf>,
    },

    /// Display information about a demand Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,
    },
}
