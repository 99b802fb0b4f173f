//! Command-line driver for the thermal RC network solver stack: a `clap`
//! parser dispatching to one `run` function per analysis, `env_logger` wired
//! to `log` for solver/extractor diagnostics, and `anyhow` at the error
//! boundary.

mod commands;
mod output;
mod scenario;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "thermal", about = "Thermal RC network solver", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve a network scenario for its steady-state temperature field.
    Steady(commands::steady::SteadyArgs),
    /// Integrate a network scenario forward in time.
    Transient(commands::transient::TransientArgs),
    /// Extract a triangulated prism network from a stackup scenario and
    /// solve it, optionally dumping a VTK mesh.
    Mesh(commands::mesh::MeshArgs),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Command::Steady(args) => commands::steady::run(args),
        Command::Transient(args) => commands::transient::run(args),
        Command::Mesh(args) => commands::mesh::run(args),
    }
}
