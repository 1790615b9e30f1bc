//! Interactive read-eval-plan loop over a compiled-in world.
//!
//! Planning runs on the blocking pool through [`run_submit`], so Ctrl-C can
//! cancel a search that is taking too long without killing the session.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::warn;
use owo_colors::OwoColorize;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use box_mover::action::PlanToken;
use box_mover::planner::PlanOptions;
use box_mover::run_submit;
use box_mover::session::{Session, SessionReply};
use box_mover::worlds;

const DEFAULT_CONFIG_PATH: &str = "box_mover.toml";

#[derive(Parser)]
struct Cli {
    /// World to load; overrides the config file.
    world: Option<String>,
    /// TOML config file with the default world and planner timeouts.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ReplConfig {
    world: Option<String>,
    low_timeout_secs: Option<u64>,
    high_timeout_secs: Option<u64>,
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<ReplConfig> {
    let path = match explicit {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Path::new(DEFAULT_CONFIG_PATH),
        None => return Ok(ReplConfig::default()),
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("could not parse {}", path.display()))
}

fn options_from(config: &ReplConfig, cancel: CancellationToken) -> PlanOptions {
    let mut options = PlanOptions { cancel, ..Default::default() };
    if let Some(secs) = config.low_timeout_secs {
        options.low_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = config.high_timeout_secs {
        options.high_timeout = Duration::from_secs(secs);
    }
    options
}

fn prompt() -> anyhow::Result<()> {
    print!("{} ", ">".green());
    std::io::stdout().flush().context("could not write to stdout")
}

fn show_reply(session: &mut Session, reply: SessionReply) {
    match reply {
        SessionReply::Plan { interpretation, plan } => {
            println!("{}", format!("goal: {interpretation}").dimmed());
            for token in plan.iter() {
                if let PlanToken::Note(note) = token {
                    if !token.is_silent() {
                        println!("{}", note.cyan());
                    }
                }
            }
            let letters = plan
                .primitives()
                .map(|action| action.letter().to_string())
                .collect::<Vec<_>>()
                .join(" ");
            if !letters.is_empty() {
                println!("plan: {letters}");
            }
            match session.execute(&plan) {
                Ok(()) => print!("{}", session.state().render()),
                Err(err) => println!("{}", format!("execution failed: {err}").red()),
            }
        }
        SessionReply::Question(question) => println!("{}", question.yellow()),
        SessionReply::Failure(message) => println!("{}", message.red()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args = Cli::parse();
    let config = load_config(args.config.as_deref())?;
    let world_name =
        args.world.or_else(|| config.world.clone()).unwrap_or_else(|| "small".to_owned());
    let project = worlds::preset(&world_name).with_context(|| {
        format!("unknown world `{world_name}`; available: {}", worlds::NAMES.join(", "))
    })?;

    let mut cancel = CancellationToken::new();
    let mut session = Some(Session::new(project, options_from(&config, cancel.clone())));

    println!("Loaded world `{world_name}`. :examples lists utterances, :quit leaves.");
    print!("{}", session.as_ref().expect("session").state().render());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line.trim().to_owned(),
                None => break,
            },
            _ = signal::ctrl_c() => {
                println!();
                break;
            }
        };
        if line.is_empty() {
            continue;
        }

        match line.as_str() {
            ":q" | ":quit" => break,
            ":state" => {
                print!("{}", session.as_ref().expect("session").state().render());
            }
            ":examples" => {
                let current = session.as_ref().expect("session");
                for (index, example) in current.world().examples().iter().enumerate() {
                    println!("{index}: {example}");
                }
            }
            command if command.starts_with(":world") => {
                let name = command.trim_start_matches(":world").trim();
                match worlds::preset(name) {
                    Some(project) => {
                        cancel = CancellationToken::new();
                        session =
                            Some(Session::new(project, options_from(&config, cancel.clone())));
                        print!("{}", session.as_ref().expect("session").state().render());
                    }
                    None => println!(
                        "{}",
                        format!("unknown world; available: {}", worlds::NAMES.join(", ")).red()
                    ),
                }
            }
            _ => {
                let (mut returned, reply) = {
                    let mut turn =
                        pin!(run_submit(session.take().expect("session"), line.clone()).future());
                    loop {
                        tokio::select! {
                            outcome = &mut turn => break outcome?,
                            _ = signal::ctrl_c() => {
                                warn!("interrupting the planner");
                                cancel.cancel();
                            }
                        }
                    }
                };
                if cancel.is_cancelled() {
                    // The old token is spent; give the session a fresh one.
                    cancel = CancellationToken::new();
                    returned.set_cancel(cancel.clone());
                }
                show_reply(&mut returned, reply);
                session = Some(returned);
            }
        }
    }

    Ok(())
}
