use clap::Parser;
use transgrid::{Args, initialize_tracer, run};

fn main() -> anyhow::Result<()> {
    initialize_tracer();
    run(&Args::parse())
}
