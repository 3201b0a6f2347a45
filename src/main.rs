use clap::Parser;
use apivault::cli::commands::register::Mode;
use apivault::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let settings = match apivault::cli::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            apivault::cli::output::error(&e.to_string());
            std::process::exit(1);
        }
    };
    apivault::cli::init_logging(&settings.log_level);

    let result = match cli.command {
        Commands::Register {
            ref key_name,
            ref value,
            ref details,
        } => apivault::cli::commands::register::execute(
            &cli,
            &settings,
            key_name,
            value.as_deref(),
            details,
            Mode::Register,
        ),
        Commands::Add {
            ref key_name,
            ref value,
            ref details,
        } => apivault::cli::commands::register::execute(
            &cli,
            &settings,
            key_name,
            value.as_deref(),
            details,
            Mode::Add,
        ),
        Commands::Reveal { ref id } => apivault::cli::commands::reveal::execute(&cli, &settings, id),
        Commands::RevealDefault { ref key_name } => {
            apivault::cli::commands::reveal::execute_default(&cli, &settings, key_name)
        }
        Commands::Deactivate { ref id, force } => {
            apivault::cli::commands::deactivate::execute(&cli, &settings, id, force)
        }
        Commands::SetDefault { ref id } => {
            apivault::cli::commands::set_default::execute(&cli, &settings, id)
        }
        Commands::Update {
            ref id,
            ref details,
        } => apivault::cli::commands::update::execute(&cli, &settings, id, details),
        Commands::List {
            ref key_name,
            json,
        } => apivault::cli::commands::list::execute(&cli, &settings, key_name.as_deref(), json),
        Commands::Audit { last, ref since } => {
            apivault::cli::commands::audit_cmd::execute(&cli, &settings, last, since.as_deref())
        }
        Commands::Keygen => apivault::cli::commands::keygen::execute(),
    };

    if let Err(e) = result {
        if e.is_security_event() {
            tracing::error!(error = %e, "vault integrity failure");
        }
        apivault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
