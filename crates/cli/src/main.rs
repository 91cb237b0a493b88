mod client;
mod config;
mod error;
mod local_state;
mod render;

use std::{io::Write, sync::Arc, time::Duration};

use clap::Parser;
use engine::{DEFAULT_MONTHLY_GOAL, Dashboard, SessionManager, parse_amount, parse_goal};

use crate::{
    client::HttpRemote,
    config::{AppConfig, Args, Command},
    error::{AppError, Result},
    local_state::FileCache,
};

const PASSWORD_ENV: &str = "MONEYBOX_PASSWORD";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = config::load(&args)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "moneybox={level},engine={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let mut sessions = sessions(&settings)?;
    let dashboard = run(&mut sessions, args.command).await?;
    sessions.logout();

    println!("{}", render::dashboard(&dashboard));
    for badge in &dashboard.badges {
        println!("{badge}");
    }
    Ok(())
}

fn sessions(settings: &AppConfig) -> Result<SessionManager> {
    let cache = FileCache::open(&settings.cache_path)?;
    tracing::debug!("using local cache at {}", cache.path().display());

    let mut builder = SessionManager::builder()
        .cache(cache)
        .remote_timeout(Duration::from_millis(settings.remote_timeout_ms))
        .badge_policy(settings.badge_policy);
    if settings.has_remote() {
        tracing::info!("syncing with {}", settings.base_url);
        builder = builder.remote(Arc::new(HttpRemote::new(&settings.base_url)?));
    }
    Ok(builder.build())
}

async fn run(sessions: &mut SessionManager, command: Command) -> Result<Dashboard> {
    let dashboard = match command {
        Command::Register { username, goal } => {
            let goal = match goal {
                Some(raw) => parse_goal(&raw)?,
                None => DEFAULT_MONTHLY_GOAL,
            };
            let password = read_password()?;
            sessions.register(&username, &password, goal).await?
        }
        Command::Save { username, amount } => {
            let amount = parse_amount(&amount)?;
            let password = read_password()?;
            sessions.login(&username, &password).await?;
            sessions.deposit(amount).await?
        }
        Command::Status { username } => {
            let password = read_password()?;
            sessions.login(&username, &password).await?
        }
        Command::Goal { username, amount } => {
            let goal = parse_goal(&amount)?;
            let password = read_password()?;
            sessions.login(&username, &password).await?;
            sessions.update_goal(goal).await?
        }
    };
    Ok(dashboard)
}

/// Password from the environment, otherwise one line of standard input.
fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }

    eprint!("password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Err(AppError::Input(format!(
            "no password on stdin and {PASSWORD_ENV} is not set"
        )));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
