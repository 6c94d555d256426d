//! Command-line interface

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "herbarium-server")]
#[command(about = "Medicinal plant classification service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Weight artifact path (overrides the configuration file)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Inference device: auto, cpu, cuda, or metal
    #[arg(short, long)]
    pub device: Option<String>,

    /// Listen address
    #[arg(short = 'l', long, default_value = "0.0.0.0")]
    pub listen: String,

    /// Listen port
    #[arg(short = 'P', long, default_value = "5000")]
    pub port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
