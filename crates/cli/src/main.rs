#![deny(unsafe_code)]
//! CLI binary for the physlets simulation applets.
//!
//! Subcommands:
//! - `list` prints available engines
//! - `schema <engine>` prints an engine's parameters and their ranges
//! - `run [engine]` drives an engine headless (or paced with `--realtime`),
//!   optionally from a scenario file, and can write a PNG of the last frame

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use physlets_core::{Driver, Engine, EngineError, Renderer, Scenario, Scene, SystemClock};
use physlets_engines::raster::RasterRenderer;
use physlets_engines::snapshot::{write_frame_png, write_png};
use physlets_engines::EngineKind;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process;

const DEFAULT_WIDTH: usize = 800;
const DEFAULT_HEIGHT: usize = 600;
const DEFAULT_TICKS: u64 = 600;

#[derive(Parser)]
#[command(name = "physlets", about = "Interactive physics applets, headless")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available engines.
    List,
    /// Show an engine's parameters with type, range, default and description.
    Schema {
        /// Engine name (e.g. "double-pendulum").
        engine: String,
    },
    /// Run an engine for N ticks.
    Run(RunArgs),
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// Engine name. Optional when `--scenario` names one.
    engine: Option<String>,

    /// Scenario JSON file; the flags below override its fields.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// World width in pixels.
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// World height in pixels.
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Number of driver ticks.
    #[arg(short, long)]
    ticks: Option<u64>,

    /// PRNG seed for deterministic spawning.
    #[arg(long)]
    seed: Option<u64>,

    /// Tick rate in Hz (only affects `--realtime` pacing).
    #[arg(long)]
    hz: Option<f64>,

    /// Engine parameters as a JSON object, merged over the scenario's.
    #[arg(long)]
    params: Option<String>,

    /// Pace ticks against the wall clock instead of running flat out.
    #[arg(long)]
    realtime: bool,

    /// Write the final frame as a PNG.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the resolved scenario as JSON, for replaying this run.
    #[arg(long)]
    save_scenario: Option<PathBuf>,
}

/// Combines the optional scenario file with command-line overrides.
fn resolve_scenario(args: &RunArgs) -> Result<Scenario, CliError> {
    let mut scenario = match &args.scenario {
        Some(path) => Scenario::load(path).map_err(|source| CliError::Scenario {
            path: path.clone(),
            source,
        })?,
        None => {
            let engine = args.engine.as_deref().ok_or(CliError::MissingEngine)?;
            let mut s = Scenario::new(engine, DEFAULT_WIDTH, DEFAULT_HEIGHT, 42);
            s.ticks = DEFAULT_TICKS;
            s
        }
    };

    if let Some(engine) = &args.engine {
        scenario.engine = engine.clone();
    }
    if let Some(width) = args.width {
        scenario.width = width;
    }
    if let Some(height) = args.height {
        scenario.height = height;
    }
    if let Some(ticks) = args.ticks {
        scenario.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    if let Some(hz) = args.hz {
        scenario.tick_hz = hz;
    }
    if let Some(text) = &args.params {
        let overrides: Value =
            serde_json::from_str(text).map_err(|e| CliError::Params(e.to_string()))?;
        merge_params(&mut scenario.params, overrides)?;
    }

    scenario.validate()?;
    Ok(scenario)
}

/// Shallow-merges the keys of `overrides` into `base`.
fn merge_params(base: &mut Value, overrides: Value) -> Result<(), CliError> {
    let Value::Object(overrides) = overrides else {
        return Err(CliError::Params("expected a JSON object".into()));
    };
    if !base.is_object() {
        *base = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(base) = base {
        base.extend(overrides);
    }
    Ok(())
}

/// Ticks the engine through the scenario, feeding scripted events.
fn drive<E: Engine + ?Sized, R: Renderer>(
    engine: &mut E,
    renderer: &mut R,
    scenario: &Scenario,
    realtime: bool,
) -> Result<Driver, EngineError> {
    let mut driver = Driver::new(scenario.tick_hz)?;
    let script = |tick: u64, d: &mut Driver| scenario.queue_events(tick, d);
    if realtime {
        driver.run_paced_with(engine, renderer, scenario.ticks, &mut SystemClock, script)?;
    } else {
        driver.run_with(engine, renderer, scenario.ticks, script)?;
    }
    Ok(driver)
}

fn save_scenario(scenario: &Scenario, path: &Path) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(scenario)?;
    std::fs::write(path, text).map_err(|source| CliError::SaveScenario {
        path: path.to_path_buf(),
        source,
    })
}

fn run_command(args: RunArgs, json: bool) -> Result<(), CliError> {
    let scenario = resolve_scenario(&args)?;
    let mut engine = EngineKind::from_name(
        &scenario.engine,
        scenario.width,
        scenario.height,
        scenario.seed,
        &scenario.params,
    )?;

    let mut driver = match &args.output {
        Some(path) => {
            let mut renderer = RasterRenderer::new();
            let driver = drive(&mut engine, &mut renderer, &scenario, args.realtime)?;
            let written = match renderer.last_frame() {
                Some(frame) => write_frame_png(frame, path),
                None => write_png(&engine.scene(), path),
            };
            written.map_err(|source| CliError::Snapshot {
                path: path.clone(),
                source,
            })?;
            driver
        }
        None => {
            let mut discard = |_: &Scene| -> Result<(), EngineError> { Ok(()) };
            drive(&mut engine, &mut discard, &scenario, args.realtime)?
        }
    };

    if let Some(path) = &args.save_scenario {
        save_scenario(&scenario, path)?;
    }

    let rejected: Vec<String> = driver.take_rejected().iter().map(ToString::to_string).collect();

    if json {
        let info = serde_json::json!({
            "engine": scenario.engine,
            "width": scenario.width,
            "height": scenario.height,
            "seed": scenario.seed,
            "ticks": driver.ticks(),
            "steps": driver.steps(),
            "events": scenario.events.len(),
            "rejected": rejected,
            "output": args.output.as_ref().map(|p| p.display().to_string()),
            "state": engine.state(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        eprintln!(
            "ran {} ({}x{}, {} ticks, seed {})",
            scenario.engine,
            scenario.width,
            scenario.height,
            driver.ticks(),
            scenario.seed
        );
        for reason in &rejected {
            eprintln!("ignored event: {reason}");
        }
        if let Some(path) = &args.output {
            eprintln!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn schema_command(name: &str, json: bool) -> Result<(), CliError> {
    let engine = EngineKind::from_name(name, DEFAULT_WIDTH, DEFAULT_HEIGHT, 0, &Value::Null)?;
    let schema = engine.param_schema();
    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }
    println!("{name}:");
    if let Value::Object(entries) = &schema {
        for (param, spec) in entries {
            let kind = spec["type"].as_str().unwrap_or("?");
            let range = match (spec.get("min"), spec.get("max")) {
                (Some(min), Some(max)) => format!(" [{min}, {max}]"),
                _ => String::new(),
            };
            let default = spec.get("default").map(Value::to_string).unwrap_or_default();
            let description = spec["description"].as_str().unwrap_or("");
            println!("  {param:<20} {kind:<8} default {default}{range}  {description}");
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let engines = EngineKind::list_engines();
            if cli.json {
                let info = serde_json::json!({ "engines": engines });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Engines:");
                for name in engines {
                    println!("  {name}");
                }
            }
        }
        Command::Schema { engine } => schema_command(&engine, cli.json)?,
        Command::Run(args) => run_command(args, cli.json)?,
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    fn args_for(engine: &str) -> RunArgs {
        RunArgs {
            engine: Some(engine.into()),
            ..RunArgs::default()
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_parses_overrides() {
        let cli = Cli::try_parse_from([
            "physlets", "--json", "run", "gravity", "-W", "320", "--ticks", "5", "--params",
            r#"{"orbital_mode":true}"#,
        ])
        .unwrap();
        assert!(cli.json);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.engine.as_deref(), Some("gravity"));
        assert_eq!(args.width, Some(320));
        assert_eq!(args.ticks, Some(5));
    }

    // ---- Scenario resolution ----

    #[test]
    fn resolve_without_scenario_uses_defaults() {
        let s = resolve_scenario(&args_for("pendulum")).unwrap();
        assert_eq!(s.engine, "pendulum");
        assert_eq!((s.width, s.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(s.ticks, DEFAULT_TICKS);
        assert_eq!(s.params, json!({}));
    }

    #[test]
    fn resolve_requires_engine_or_scenario() {
        let err = resolve_scenario(&RunArgs::default()).unwrap_err();
        assert!(matches!(err, CliError::MissingEngine));
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn resolve_rejects_non_object_params() {
        let mut args = args_for("momentum");
        args.params = Some("[1, 2]".into());
        assert!(matches!(resolve_scenario(&args), Err(CliError::Params(_))));
        args.params = Some("{not json".into());
        assert!(matches!(resolve_scenario(&args), Err(CliError::Params(_))));
    }

    #[test]
    fn resolve_rejects_zero_width() {
        let mut args = args_for("momentum");
        args.width = Some(0);
        assert_eq!(resolve_scenario(&args).unwrap_err().exit_code(), 10);
    }

    #[test]
    fn flags_override_scenario_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        let file = json!({
            "engine": "gravity",
            "width": 1200,
            "height": 800,
            "seed": 7,
            "ticks": 30,
            "params": {"time_scale": 1.5, "trail_length": 20},
            "events": [{"tick": 0, "event": {"kind": "key_press", "key": "space"}}]
        });
        std::fs::write(&path, file.to_string()).unwrap();

        let mut args = RunArgs {
            scenario: Some(path),
            ..RunArgs::default()
        };
        args.seed = Some(9);
        args.params = Some(r#"{"trail_length": 5}"#.into());
        let s = resolve_scenario(&args).unwrap();
        assert_eq!(s.engine, "gravity");
        assert_eq!(s.width, 1200);
        assert_eq!(s.seed, 9);
        assert_eq!(s.ticks, 30);
        assert_eq!(s.params, json!({"time_scale": 1.5, "trail_length": 5}));
        assert_eq!(s.events.len(), 1);
    }

    #[test]
    fn missing_scenario_file_names_the_path() {
        let args = RunArgs {
            scenario: Some(PathBuf::from("/definitely/not/here.json")),
            ..RunArgs::default()
        };
        let err = resolve_scenario(&args).unwrap_err();
        assert_eq!(err.exit_code(), 14);
        let CliError::Scenario { path, source } = &err else {
            panic!("expected a scenario error, got {err:?}");
        };
        assert_eq!(path, Path::new("/definitely/not/here.json"));
        assert!(matches!(source, EngineError::Io(_)));
    }

    #[test]
    fn malformed_scenario_file_is_a_scenario_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"engine": "gravity", "width": 0, "height": 10}"#).unwrap();
        let args = RunArgs {
            scenario: Some(path.clone()),
            ..RunArgs::default()
        };
        let err = resolve_scenario(&args).unwrap_err();
        assert_eq!(err.exit_code(), 14);
        assert!(err.to_string().contains("broken.json"), "{err}");
    }

    #[test]
    fn merge_params_replaces_non_object_base() {
        let mut base = Value::Null;
        merge_params(&mut base, json!({"gravity": 200.0})).unwrap();
        assert_eq!(base, json!({"gravity": 200.0}));
    }

    // ---- Running ----

    #[test]
    fn drive_applies_scripted_events() {
        let mut args = args_for("gravity");
        args.ticks = Some(3);
        let mut scenario = resolve_scenario(&args).unwrap();
        scenario.events.push(physlets_core::ScriptedEvent {
            tick: 1,
            event: physlets_core::InputEvent::KeyPress {
                key: physlets_core::Key::Space,
            },
        });
        let mut engine = EngineKind::from_name("gravity", 800, 600, 42, &json!({})).unwrap();
        let mut renderer = RasterRenderer::new();
        let driver = drive(&mut engine, &mut renderer, &scenario, false).unwrap();
        assert_eq!(driver.ticks(), 3);
        assert_eq!(renderer.frames(), 3);
        assert_eq!(engine.state()["particles"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn run_command_writes_png_and_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("out.png");
        let saved = dir.path().join("replay.json");
        let mut args = args_for("double-pendulum");
        args.ticks = Some(10);
        args.output = Some(png.clone());
        args.save_scenario = Some(saved.clone());
        run_command(args, true).unwrap();
        assert!(png.exists());
        let replay = Scenario::load(&saved).unwrap();
        assert_eq!(replay.engine, "double-pendulum");
        assert_eq!(replay.ticks, 10);
    }

    #[test]
    fn zero_tick_run_still_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("still.png");
        let mut args = args_for("momentum");
        args.ticks = Some(0);
        args.output = Some(png.clone());
        run_command(args, false).unwrap();
        assert!(png.exists());
    }

    #[test]
    fn unwritable_snapshot_path_is_a_snapshot_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args_for("pendulum");
        args.ticks = Some(2);
        args.output = Some(dir.path().join("missing-dir").join("frame.png"));
        let err = run_command(args, true).unwrap_err();
        assert!(matches!(err, CliError::Snapshot { .. }), "{err:?}");
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn unwritable_save_path_is_a_save_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args_for("pendulum");
        args.ticks = Some(1);
        args.save_scenario = Some(dir.path().join("missing-dir").join("replay.json"));
        let err = run_command(args, true).unwrap_err();
        assert!(matches!(err, CliError::SaveScenario { .. }), "{err:?}");
        assert_eq!(err.exit_code(), 11);
    }

    /// Counts steps and refuses every key press.
    struct KeyRefuser {
        steps: u64,
    }

    impl Engine for KeyRefuser {
        fn step(&mut self) -> Result<(), EngineError> {
            self.steps += 1;
            Ok(())
        }
        fn scene(&self) -> Scene {
            Scene::new(4, 4)
        }
        fn state(&self) -> Value {
            json!({"steps": self.steps})
        }
        fn params(&self) -> Value {
            json!({})
        }
        fn param_schema(&self) -> Value {
            json!({})
        }
        fn set_param(&mut self, name: &str, _: &Value) -> Result<(), EngineError> {
            Err(EngineError::ParamNotFound(name.to_owned()))
        }
        fn handle_input(&mut self, event: &physlets_core::InputEvent) -> Result<(), EngineError> {
            match event {
                physlets_core::InputEvent::KeyPress { .. } => {
                    Err(EngineError::InvalidInput("keys are not bound".into()))
                }
                _ => Ok(()),
            }
        }
        fn reset(&mut self) {
            self.steps = 0;
        }
    }

    #[test]
    fn drive_keeps_going_past_rejected_events() {
        let mut scenario = Scenario::new("refuser", 4, 4, 0);
        scenario.ticks = 5;
        for tick in [1, 3] {
            scenario.events.push(physlets_core::ScriptedEvent {
                tick,
                event: physlets_core::InputEvent::KeyPress {
                    key: physlets_core::Key::Char('#'),
                },
            });
        }
        let mut engine = KeyRefuser { steps: 0 };
        let mut discard = |_: &Scene| -> Result<(), EngineError> { Ok(()) };
        let mut driver = drive(&mut engine, &mut discard, &scenario, false).unwrap();
        assert_eq!(engine.steps, 5);
        let rejected = driver.take_rejected();
        assert_eq!(rejected.len(), 2);
        assert!(rejected[0].to_string().contains("keys are not bound"));
    }

    #[test]
    fn schema_command_rejects_unknown_engine() {
        let err = schema_command("orrery", false).unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }
}
