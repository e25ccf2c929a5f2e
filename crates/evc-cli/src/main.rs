use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use evc_core::{EventCommand, InterpreterError, SceneRequest};
use evc_runtime::memory::MemoryActor;
use evc_runtime::{Interpreter, MemoryHost, SwitchStore, VariableStore};
use log::debug;
use serde::Deserialize;

#[derive(Debug, Parser)]
#[command(name = "evc-player")]
#[command(about = "Event command interpreter CLI")]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    Play(PlayArgs),
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct PlayArgs {
    #[arg(long = "bundle")]
    bundle: String,
    #[arg(long = "seed")]
    seed: Option<u32>,
    #[arg(long = "max-frames", default_value_t = 360_000)]
    max_frames: u64,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[arg(long = "bundle")]
    bundle: String,
}

/// An authored event bundle: the page to play plus the world state it
/// starts from. Keys follow the authoring tool's camelCase convention.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventBundle {
    #[serde(default)]
    commands: Vec<EventCommand>,
    #[serde(default)]
    common_events: BTreeMap<i64, Vec<EventCommand>>,
    #[serde(default)]
    switches: BTreeMap<i64, bool>,
    #[serde(default)]
    variables: BTreeMap<i64, i64>,
    #[serde(default)]
    actors: Vec<BundleActor>,
    #[serde(default)]
    party: Vec<i64>,
    #[serde(default)]
    gold: i64,
    #[serde(default)]
    troops: Vec<i64>,
    #[serde(default = "default_map_id")]
    map_id: i64,
    #[serde(default)]
    event_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleActor {
    id: i64,
    name: String,
    #[serde(default = "default_hp")]
    hp: i64,
    #[serde(default = "default_mp")]
    mp: i64,
}

fn default_map_id() -> i64 {
    1
}

fn default_hp() -> i64 {
    100
}

fn default_mp() -> i64 {
    50
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32, InterpreterError> {
    match cli.command {
        Mode::Play(args) => run_play(args),
        Mode::Check(args) => run_check(args),
    }
}

fn emit_error(error: InterpreterError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
    );
    1
}

fn run_check(args: CheckArgs) -> Result<i32, InterpreterError> {
    let bundle = load_bundle(Path::new(&args.bundle))?;
    println!("commands: {}", bundle.commands.len());
    println!("common events: {}", bundle.common_events.len());
    for (id, list) in &bundle.common_events {
        println!("  [{}] {} commands", id, list.len());
    }
    println!("switches: {}", bundle.switches.len());
    println!("variables: {}", bundle.variables.len());
    println!("actors: {}", bundle.actors.len());
    Ok(0)
}

fn run_play(args: PlayArgs) -> Result<i32, InterpreterError> {
    let bundle = load_bundle(Path::new(&args.bundle))?;
    let mut host = build_host(&bundle);
    let mut interpreter = Interpreter::new();
    if let Some(seed) = args.seed {
        interpreter.set_random_seed(seed);
    }
    interpreter.setup(Arc::new(bundle.commands), bundle.event_id, bundle.map_id);

    let mut frames = 0u64;
    while interpreter.is_running() {
        interpreter.update(&mut host)?;
        if !pump_host(&mut host)? {
            println!();
            println!("[END]");
            return Ok(0);
        }
        host.advance_frame();
        frames += 1;
        if frames > args.max_frames {
            return Err(InterpreterError::new(
                "CLI_FRAME_LIMIT",
                format!("Event still running after {} frames.", args.max_frames),
            ));
        }
    }

    println!();
    println!("[END]");
    Ok(0)
}

fn build_host(bundle: &EventBundle) -> MemoryHost {
    let mut host = MemoryHost::new();
    host.current_map_id = bundle.map_id;
    for (id, list) in &bundle.common_events {
        host.common_events.insert(*id, Arc::new(list.clone()));
    }
    for (id, on) in &bundle.switches {
        host.switches.set_value(*id, *on);
    }
    for (id, value) in &bundle.variables {
        host.variables.set_value(*id, *value);
    }
    for actor in &bundle.actors {
        host.actors.entries.insert(
            actor.id,
            MemoryActor {
                name: actor.name.clone(),
                class_id: 1,
                level: 1,
                hp: actor.hp,
                max_hp: actor.hp,
                mp: actor.mp,
                max_mp: actor.mp,
                ..MemoryActor::default()
            },
        );
    }
    host.party.members = bundle.party.clone();
    host.party.gold = bundle.gold;
    for troop_id in &bundle.troops {
        host.battle.known_troops.insert(*troop_id);
    }
    host
}

/// Drains everything the last tick produced and plays the player's side
/// of any prompt. Returns false when the event ended the session.
fn pump_host(host: &mut MemoryHost) -> Result<bool, InterpreterError> {
    for line in host.message.take_lines() {
        println!("{}", line);
    }

    if let Some(setup) = host.message.choices.take() {
        println!();
        for (index, choice) in setup.choices.iter().enumerate() {
            println!("  [{}] {}", index, choice);
        }
        let raw = prompt_input("> ")?;
        let selected = if raw.is_empty() {
            setup.cancel_type
        } else {
            raw.parse::<i64>().map_err(|_| {
                InterpreterError::new("CLI_CHOICE_PARSE", format!("Invalid choice index: {}", raw))
            })?
        };
        host.message.resolve_choice(selected);
    } else if let Some((variable_id, max_digits)) = host.message.number_input.take() {
        println!();
        println!("(number, up to {} digits)", max_digits);
        let raw = prompt_input("> ")?;
        let value = raw.parse::<i64>().map_err(|_| {
            InterpreterError::new("CLI_NUMBER_PARSE", format!("Invalid number: {}", raw))
        })?;
        host.variables.set_value(variable_id, value);
        host.message.close();
    } else if let Some((variable_id, item_type_id)) = host.message.item_choice.take() {
        println!();
        println!("(item id, type {})", item_type_id);
        let raw = prompt_input("> ")?;
        let value = raw.parse::<i64>().map_err(|_| {
            InterpreterError::new("CLI_ITEM_PARSE", format!("Invalid item id: {}", raw))
        })?;
        host.variables.set_value(variable_id, value);
        host.message.close();
    } else if host.message.busy {
        // Plain text: reading it dismisses the window.
        host.message.scroll = None;
        host.message.close();
    }

    if let Some(transfer) = host.player.pending_transfer.take() {
        println!();
        println!(
            "[transfer to map {} at ({}, {})]",
            transfer.map_id, transfer.x, transfer.y
        );
        host.current_map_id = transfer.map_id;
    }

    for request in std::mem::take(&mut host.scene.pushed) {
        match request {
            SceneRequest::Battle => {
                let troop_id = host
                    .battle
                    .pending
                    .map(|(troop_id, _, _)| troop_id)
                    .unwrap_or(0);
                println!();
                println!("[battle against troop {}]", troop_id);
                println!("(result: 0 win, 1 escape, 2 lose)");
                let raw = prompt_input("> ")?;
                let result = raw.parse::<i64>().map_err(|_| {
                    InterpreterError::new(
                        "CLI_BATTLE_PARSE",
                        format!("Invalid battle result: {}", raw),
                    )
                })?;
                host.battle.finish_battle(result);
            }
            SceneRequest::Shop { goods, .. } => {
                println!();
                println!("[shop with {} goods]", goods.len());
            }
            SceneRequest::NameInput { actor_id, .. } => {
                let raw = prompt_input("name> ")?;
                if let Some(actor) = host.actors.entries.get_mut(&actor_id) {
                    actor.name = raw;
                }
            }
            other => debug!("scene request {other:?} has no CLI counterpart"),
        }
    }

    for request in std::mem::take(&mut host.scene.replaced) {
        match request {
            SceneRequest::GameOver => {
                println!();
                println!("[game over]");
                return Ok(false);
            }
            SceneRequest::Title => {
                println!();
                println!("[returned to title]");
                return Ok(false);
            }
            other => debug!("scene request {other:?} has no CLI counterpart"),
        }
    }
    host.scene.settle();

    if host.scene.video.take().is_some() {
        host.scene.video_playing = false;
    }

    Ok(true)
}

fn prompt_input(prefix: &str) -> Result<String, InterpreterError> {
    print!("{}", prefix);
    io::stdout()
        .flush()
        .map_err(|error| InterpreterError::new("CLI_IO", error.to_string()))?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|error| InterpreterError::new("CLI_IO", error.to_string()))?;
    Ok(input.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn load_bundle(path: &Path) -> Result<EventBundle, InterpreterError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        InterpreterError::new("CLI_IO", format!("{}: {}", path.display(), error))
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        InterpreterError::new("CLI_PARSE", format!("{}: {}", path.display(), error))
    })
}
