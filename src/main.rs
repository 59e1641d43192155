use std::process::ExitCode;

use tracing::{error, info};

use termchan::datetime::format_post_time;
use termchan::{BoardRegistry, Config, Storage, ThreadIndex};

fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = termchan::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        termchan::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!("{} {}", config.bbs.name, config.bbs.version);

    let storage = match Storage::from_config(&config.storage) {
        Ok(storage) => storage,
        Err(e) => {
            error!("Failed to open storage: {e}");
            return ExitCode::FAILURE;
        }
    };

    match BoardRegistry::new(&storage).list() {
        Ok(boards) => {
            info!(
                "{} boards, {} threads per page",
                boards.len(),
                config.page_size()
            );
            let threads = ThreadIndex::new(&storage);
            for board in boards {
                let latest = match threads.load(&board.name) {
                    Ok(index) => index
                        .threads()
                        .iter()
                        .flat_map(|t| t.posts())
                        .map(|p| p.timestamp)
                        .max(),
                    Err(e) => {
                        error!("Failed to load /{}/: {e}", board.name);
                        return ExitCode::FAILURE;
                    }
                };
                match latest {
                    Some(ts) => info!(
                        "  {board} (last post {})",
                        format_post_time(ts, &config.bbs.timezone)
                    ),
                    None => info!("  {board} (empty)"),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to read board list: {e}");
            ExitCode::FAILURE
        }
    }
}
