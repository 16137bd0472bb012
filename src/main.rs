//! CLI entry point for photomosaic generation

use clap::Parser;
use tilemosaic::io::cli::{Cli, MosaicCommand};

fn main() -> tilemosaic::Result<()> {
    let cli = Cli::parse();
    cli.init_tracing();
    MosaicCommand::new(cli).run().map(drop)
}
