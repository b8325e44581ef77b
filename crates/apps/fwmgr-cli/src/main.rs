use clap::Parser;
use fwmgr_cli::app::log_filter;
use fwmgr_cli::{run_cli, Cli};

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(cli.verbose)))
        .init();
    if let Err(err) = run_cli(cli) {
        eprintln!("fwmgr: {err:#}");
        std::process::exit(1);
    }
}
