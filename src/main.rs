use clap::Parser as _;
use hdf5struct::{Config, run};

fn main() -> anyhow::Result<()> {
    // Log to stderr (if run with `RUST_LOG=debug`).
    env_logger::init();

    let config = Config::parse();
    let stdout = std::io::stdout();
    run(&config, &mut stdout.lock())
}
