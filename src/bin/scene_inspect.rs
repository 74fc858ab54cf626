//! Scene Inspect Binary
//!
//! Loads one or more scene description files into a single editor session
//! (later files are merged the way an interactive import would be) and prints
//! a JSON summary: per-structure information, bounds, fingerprint and any
//! invariant violations.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `SCENE_CONFIG`: path to an editor config JSON file (default: built-in defaults)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! LOG_FORMAT=pretty cargo run --bin scene_inspect -- ligand.json pocket.json
//! ```

use std::process::ExitCode;

use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pose_scene_kernel::{
    scene_fingerprint_hex, EditorConfig, Limits, SceneEditor, StructureInfo, SCENE_FORMAT_VERSION,
};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "scene_inspect=info,pose_scene_kernel=info".into());

    // Logs go to stderr so stdout carries only the summary.
    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config() -> Result<EditorConfig, Box<dyn std::error::Error>> {
    match std::env::var("SCENE_CONFIG") {
        Ok(path) if !path.is_empty() => {
            let text = std::fs::read_to_string(&path)?;
            let config = EditorConfig::from_json_str(&text)?;
            info!(path = %path, params_hash = %config.params_hash(), "Editor config loaded");
            Ok(config)
        }
        _ => Ok(EditorConfig::default()),
    }
}

#[derive(Serialize)]
struct Summary {
    format_version: &'static str,
    config_hash: String,
    fingerprint: String,
    bounds: Option<Limits>,
    history_steps: usize,
    structures: Vec<StructureInfo>,
    violations: Vec<String>,
}

fn run(paths: &[String]) -> Result<Summary, Box<dyn std::error::Error>> {
    let config = load_config()?;
    let mut editor = SceneEditor::new(config);

    for (i, path) in paths.iter().enumerate() {
        let text = std::fs::read_to_string(path)?;
        let plan = if i == 0 {
            editor.load(&pose_scene_kernel::SceneDescription::from_json_str(&text)?)?
        } else {
            editor.import_json(&text)?
        };
        info!(
            path = %path,
            structures = plan.fragment.structures.len(),
            dx = plan.offset.x,
            dy = plan.offset.y,
            "Scene file loaded"
        );
    }

    let scene = editor.scene();
    Ok(Summary {
        format_version: SCENE_FORMAT_VERSION,
        config_hash: editor.config().params_hash(),
        fingerprint: scene_fingerprint_hex(scene),
        bounds: scene.limits(),
        history_steps: editor.history().len(),
        structures: scene.additional_information(false),
        violations: scene.validate(),
    })
}

fn main() -> ExitCode {
    init_tracing();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        error!("Usage: scene_inspect <scene.json> [more.json ...]");
        return ExitCode::from(2);
    }

    match run(&paths).and_then(|summary| Ok(serde_json::to_string_pretty(&summary)?)) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Failed to inspect scene");
            ExitCode::FAILURE
        }
    }
}
