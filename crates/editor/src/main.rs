use std::path::PathBuf;
use std::process::ExitCode;

use molscene_editor_lib::command::execute_json_batch;
use molscene_editor_lib::harness::Editor;
use molscene_editor_lib::state::scene::SceneState;
use molscene_editor_lib::state::settings::EditorConfig;

/// Command-line options
#[derive(Default)]
struct Args {
    scene: Option<PathBuf>,
    commands: Option<PathBuf>,
    output: Option<PathBuf>,
    save_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "molscene_editor=info,molscene_editor_lib=info".into()),
        )
        .init();

    match run(parse_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--scene" => args.scene = iter.next().map(PathBuf::from),
            "--commands" => args.commands = iter.next().map(PathBuf::from),
            "--output" => args.output = iter.next().map(PathBuf::from),
            "--save-config" => args.save_config = true,
            other => tracing::warn!("Ignoring unknown argument {other}"),
        }
    }
    args
}

fn run(args: Args) -> Result<(), String> {
    let mut editor = Editor::with_config(EditorConfig::load());

    if let Some(path) = &args.scene {
        let scene = SceneState::read_scene_file(path)?;
        editor.load_scene(scene)?;
        tracing::info!("Loaded scene from {}", path.display());
    }

    if let Some(path) = &args.commands {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let responses = execute_json_batch(&mut editor, &json)?;
        let out = serde_json::to_string_pretty(&responses)
            .map_err(|e| format!("Serialization failed: {e}"))?;
        println!("{out}");
    }

    if let Some(path) = &args.output {
        editor.scene.write_scene_file(path)?;
        tracing::info!("Saved scene to {}", path.display());
    }

    if args.save_config {
        editor.config().save();
    }
    Ok(())
}
