use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Multimodal search client", long_about = None)]
pub struct Args {
    /// Address of the search service. Overrides remote_addr from config.yaml.
    #[clap(long, global = true, env = "NEXUS_ADDR")]
    pub remote: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive search session
    Shell {},

    /// Search by text and print the results as json
    Search {
        /// Search query
        query: String,

        /// Refine the results, may be repeated to chain refinements
        #[clap(short, long)]
        refine: Vec<String>,
    },

    /// Search by example image and print the results as json
    Image {
        /// Path to an image file
        path: PathBuf,

        /// Refine the results, may be repeated to chain refinements
        #[clap(short, long)]
        refine: Vec<String>,
    },

    /// Print the resolved configuration
    Config {},
}
