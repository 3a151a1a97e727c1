use clap::Parser;
use pqvault::cli::{commands, load_settings, output, Cli, Commands};
use pqvault::config::Settings;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // A broken config file is reported by the command itself.
    let filter = load_settings(&cli)
        .map(|s| s.log_filter)
        .unwrap_or_else(|_| Settings::default().log_filter);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Keygen { ref path } => commands::keygen::execute(path.as_deref()),
        Commands::Init => commands::init::execute(&cli),
        Commands::Store {
            ref label,
            ref key_type,
            ref encoding,
            ref value,
        } => commands::store::execute(&cli, label, key_type, encoding, value.as_deref()),
        Commands::Get { ref id } => commands::get::execute(&cli, id),
        Commands::Rotate {
            ref id,
            ref key_type,
            ref encoding,
            ref value,
        } => commands::rotate::execute(&cli, id, key_type, encoding, value.as_deref()),
        Commands::List => commands::list::execute(&cli),
        Commands::Mode => commands::mode::execute(&cli),
        Commands::SetMode { ref mode, atomic } => commands::set_mode::execute(&cli, mode, atomic),
        Commands::Repair => commands::repair::execute(&cli),
        Commands::Status => commands::status::execute(&cli),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
