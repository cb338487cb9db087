use clap::Parser;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

use cgx_cli::cli::{Cli, Commands};

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let result = match &cli.command {
        Commands::Convert {
            model,
            config,
            output,
            format,
            strict,
        } => commands::convert::handle(model, config.as_deref(), output.as_deref(), *format, *strict),
        Commands::Classify { model } => commands::classify::handle(model),
        Commands::DefaultConfig => commands::convert::print_default_config(),
    };

    if let Err(e) = result {
        error!("{e:?}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
