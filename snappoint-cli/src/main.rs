//! Entry point for the `snappoint` command-line interface.
#![forbid(unsafe_code)]

fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    snappoint_cli::run()?;
    Ok(())
}
