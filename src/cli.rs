use crate::constants::{API_URL_ENV, DEFAULT_K, MAX_K, MIN_K};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pca-squeeze",
    about = "A client for the PCA image compression service",
    long_about = "pca-squeeze uploads an image to a remote PCA compression service, \
                  shows the size reduction and processing time, and saves the compressed \
                  result as compressed_k{K}.jpg. Lower K means a smaller file and lower quality.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    pca-squeeze compress photo.png -k 50 -o ./out\n  \
    pca-squeeze session --api-url http://localhost:8000\n  \
    pca-squeeze health"
)]
pub struct Args {
    #[arg(short = 'q', long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Print diagnostic output",
        long_help = "Print extra details and library debug traces. RUST_LOG overrides the trace filter."
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServiceArgs {
    #[arg(
        long,
        env = API_URL_ENV,
        help = "Compression service base URL (default: http://localhost:8000)"
    )]
    pub api_url: Option<String>,

    #[arg(
        long,
        help = "Back image buffers with temporary files instead of memory",
        long_help = "Keep the original and compressed images in scoped temporary files. \
                     The files are removed when superseded or when the program exits."
    )]
    pub temp_files: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress a single image with the remote service",
        long_about = "Select an image, send it to the compression service with the given K \
                      and save the result as compressed_k{K}.jpg in the output directory."
    )]
    Compress {
        #[arg(help = "Input image file path")]
        input: PathBuf,

        #[arg(
            short = 'k',
            long = "k",
            default_value_t = DEFAULT_K,
            value_parser = clap::value_parser!(u32).range(MIN_K as i64..=MAX_K as i64),
            help = "Compression intensity K (1-500, default: 50)",
            long_help = "Number of principal components the service keeps per color channel. \
                         Lower values give smaller files and lower quality."
        )]
        k: u32,

        #[arg(
            short = 'o',
            long,
            default_value = ".",
            help = "Directory to save the compressed image into"
        )]
        output: PathBuf,

        #[command(flatten)]
        service: ServiceArgs,
    },

    #[command(
        about = "Start an interactive compression session",
        long_about = "Read commands from standard input: open <path>, k <n>, compress, \
                      stats, save [dir], help, quit."
    )]
    Session {
        #[command(flatten)]
        service: ServiceArgs,
    },

    #[command(about = "Check that the compression service is reachable")]
    Health {
        #[arg(long, env = API_URL_ENV, help = "Compression service base URL")]
        api_url: Option<String>,
    },
}
