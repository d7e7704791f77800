use clap::Parser;
use color_eyre::eyre::WrapErr;
use nexus::{Cli, Context, execute, init_logging};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();
    init_logging(&args.log_level, args.log_file.as_deref()).wrap_err("failed to initialize logging")?;

    let ctx = Context::load(args.config.as_deref(), args.assumptions.as_deref())?;
    let output = execute(&ctx, &args.command, args.format)?;
    println!("{output}");

    tracing::debug!("nexus finished");
    Ok(())
}
