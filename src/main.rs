use clap::Parser;
use log::{error, info};

use little_notes::{App, Cli, Config, FileBackend, NoteStore, Result};

pub fn initialize_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    info!("Using data directory {}", config.data_dir.display());
    let backend = FileBackend::new(&config.data_dir)?;
    let store = NoteStore::new(backend);

    let app = App::new(store, config, cli.verbose);
    app.run(cli.command)
}

fn main() {
    initialize_logger();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
