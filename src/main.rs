use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use catchmesh::cli::Cli;
#[cfg(feature = "netcdf")]
use catchmesh::io::PendingPath;
use catchmesh::runtime::SingleProcessRuntime;
use catchmesh::source::ShapefileSource;
use catchmesh::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();

    info!("reading {}", cli.input.display());
    let source = ShapefileSource::open(&cli.input, &cli.uid_field)
        .with_context(|| format!("opening {}", cli.input.display()))?;

    let config = cli.to_config();
    let runtime = SingleProcessRuntime;

    run(&source, &config, &runtime, &cli.output)?;
    info!("wrote {}", cli.output.display());
    Ok(())
}

#[cfg(feature = "netcdf")]
fn run(
    source: &ShapefileSource,
    config: &Config,
    runtime: &SingleProcessRuntime,
    output: &Path,
) -> Result<()> {
    use catchmesh::sink::NetcdfSink;

    let pending = PendingPath::new(output).context("preparing output path")?;
    let mut sink = NetcdfSink::new(pending.path());
    catchmesh::process(source, config, runtime, &mut sink).context("writing mesh")?;
    pending.finalize().context("finalizing output")
}

#[cfg(not(feature = "netcdf"))]
fn run(
    _source: &ShapefileSource,
    _config: &Config,
    _runtime: &SingleProcessRuntime,
    _output: &Path,
) -> Result<()> {
    anyhow::bail!("this build was compiled without the `netcdf` feature; rebuild with --features netcdf")
}
