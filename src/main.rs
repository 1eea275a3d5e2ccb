use std::fs;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

use referral_desk::{services, settings};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "referrals.toml")]
    config: String,
    /// Overrides `http.listen` from the config file.
    #[arg(short, long)]
    listen: Option<String>,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    init_logging(&args.log4rs)?;

    let mut settings = settings::Settings::new(&args.config)?;
    if let Some(listen) = args.listen {
        settings.http.listen = listen;
    }

    log::info!("Starting referral desk.");
    services::start_services(settings).await
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    if !Path::new(path).exists() {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}",
            )))
            .build();
        let config = Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;

        log4rs::init_config(config)?;
        log::warn!("{path} not found, logging to console only.");
        return Ok(());
    }

    if !Path::new("logs").exists() {
        fs::create_dir("logs")?;
    }

    log4rs::init_file(path, Default::default())
        .map_err(|e| anyhow::anyhow!("Could not initialize logging: {}", e))
}
