use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, warn};
use tokio::sync::mpsc;

use contact_support::app::{self, AppConfig, Variant};
use contact_support::ui::console::{Command, ConsoleObserver, HELP};

#[derive(Debug, Parser)]
#[command(name = "contact-support", about = "Reach customer support from the terminal")]
struct Args {
    /// Config file to read instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long, value_enum)]
    variant: Option<Variant>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref());
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    if config.base_url.trim().is_empty() {
        error!("no support server configured, pass --base-url or set base_url in the config file");
        return ExitCode::FAILURE;
    }

    let profile = config.variant.profile();
    println!("{}", profile.title);
    let (observer, screen) = ConsoleObserver::new(profile, std::io::stdout());
    let mut coordinator = match app::build_screen(&config, Box::new(observer)) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            error!("could not set up support screen: {e}");
            return ExitCode::FAILURE;
        }
    };

    coordinator.load_contact();
    println!("{HELP}");

    let mut lines = spawn_input_reader();
    while !screen.is_dismissed() {
        tokio::select! {
            _ = coordinator.process_next(), if coordinator.outstanding() > 0 => {}
            line = lines.recv() => {
                let Some(line) = line else { break };
                match Command::parse(&line) {
                    Some(Command::Help) => println!("{HELP}"),
                    Some(command) => {
                        if !command.dispatch(&mut coordinator) {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("{HELP}"),
                }
            }
        }
    }

    // Let in-flight opens and sends finish before the process exits.
    coordinator.run_until_idle().await;
    ExitCode::SUCCESS
}

/// Reads stdin on its own thread so a pending read never holds up shutdown.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("failed to read input: {e}");
                    break;
                }
            }
        }
    });
    rx
}
