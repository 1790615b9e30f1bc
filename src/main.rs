use std::collections::VecDeque;
use std::io::Write;

use anyhow::{Context, bail};
use clap::{CommandFactory, FromArgMatches, Parser};
use log::warn;
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use box_mover::action::{PlanToken, parse_action_string};
use box_mover::planner::PlanOptions;
use box_mover::session::{Session, SessionReply};
use box_mover::worlds;

#[derive(Parser)]
struct Cli {
    /// Name of a compiled-in world (small, medium, three).
    world: String,
    /// Utterances, example indices, or p/d/l/r action strings, handled in
    /// order against the same world.
    inputs: Vec<String>,
}

fn parse_or_readline() -> anyhow::Result<Cli> {
    // Args were provided (try to parse, exit on fail)
    if std::env::args_os().len() > 1 {
        return Ok(Cli::parse());
    }

    let mut cmd = Cli::command().no_binary_name(true);

    println!("No CLI arguments were provided");
    println!("Specify arguments via stdin:");
    println!("{}", cmd.render_long_help());

    std::io::stdout().flush().context("could not write to stdout")?;
    let mut buffer = String::new();
    std::io::stdin().read_line(&mut buffer).context("could not read stdin")?;

    let args = shlex::split(buffer.trim()).context("invalid quoting")?;
    let matches = cmd.try_get_matches_from(args).context("failed to parse args")?;

    Cli::from_arg_matches(&matches).context("failed to parse args")
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cancel = CancellationToken::new();
    if let Err(err) = ctrlc::set_handler({
        let cancel = cancel.clone();
        let mut is_repeat = false;
        move || {
            if is_repeat {
                warn!("Aborting immediately");
                std::process::exit(-1);
            }
            is_repeat = true;
            warn!("Stopping...");
            cancel.cancel();
        }
    }) {
        warn!("Failed to set interrupt handler! {}", err);
    }

    let args = parse_or_readline()?;
    let Some(project) = worlds::preset(&args.world) else {
        bail!(
            "unknown world `{}`; available: {}",
            args.world,
            worlds::NAMES.join(", ")
        );
    };

    let options = PlanOptions { cancel, ..Default::default() };
    let mut session = Session::new(project, options);
    print!("{}", session.state().render());

    let mut inputs: VecDeque<String> = args.inputs.into();
    while let Some(input) = inputs.pop_front() {
        if let Some(actions) = parse_action_string(&input) {
            session
                .perform(&actions)
                .with_context(|| format!("action string `{input}` failed"))?;
            print!("{}", session.state().render());
            continue;
        }

        let utterance = match input.trim().parse::<usize>() {
            Ok(index) => session
                .world()
                .examples()
                .get(index)
                .cloned()
                .with_context(|| format!("example {index} does not exist"))?,
            Err(_) => input,
        };
        println!("> {utterance}");

        match session.submit(&utterance) {
            SessionReply::Plan { interpretation, plan } => {
                println!("{}", format!("goal: {interpretation}").dimmed());
                let letters = plan
                    .primitives()
                    .map(|action| action.letter().to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                for token in plan.iter() {
                    if let PlanToken::Note(note) = token {
                        if !token.is_silent() {
                            println!("{}", note.cyan());
                        }
                    }
                }
                if !letters.is_empty() {
                    println!("plan: {letters}");
                }
                session.execute(&plan).context("the plan failed to execute")?;
                print!("{}", session.state().render());
            }
            SessionReply::Question(question) => {
                println!("{}", question.yellow());
                if inputs.is_empty() {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_line(&mut buffer)
                        .context("could not read a clarification")?;
                    if buffer.trim().is_empty() {
                        bail!("a clarification was required");
                    }
                    inputs.push_back(buffer.trim().to_owned());
                }
            }
            SessionReply::Failure(message) => bail!(message),
        }
    }

    Ok(())
}
