use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Utc;
use studio_core::{update, AppState, Msg, SessionContext};
use studio_engine::EngineHandle;
use studio_logging::studio_info;

use super::cli::{Cli, Command};
use super::config::StudioConfig;
use super::effects::EffectRunner;
use super::persistence;
use super::preview::DirectoryPreview;
use super::render::TerminalRenderer;

/// Upper bound on how long the loop waits for engine events before ticking.
const TICK_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(cli: Cli, config: StudioConfig) -> anyhow::Result<()> {
    let output_dir = config.output_dir.clone();
    let context = if cli.new {
        SessionContext::default()
    } else {
        persistence::load_session_context(&output_dir)
    };
    studio_info!(
        "Starting with session={:?} base_artifact={:?}",
        context.session_id,
        context.base_artifact_id
    );

    let mut state = AppState::with_emit_interval(config.emit_interval()).with_context(context);
    let engine = EngineHandle::new(config.client_settings())?;
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let preview = DirectoryPreview::new(output_dir.clone());
    preview.bootstrap(msg_tx);

    let mut runner = EffectRunner::new(engine, preview, output_dir.clone());
    let mut renderer = TerminalRenderer::default();
    let mut stdout = io::stdout().lock();

    let mut inbox = vec![
        Msg::DatasetSelected {
            dataset_id: config.dataset_id.clone(),
        },
        initial_msg(cli.command),
    ];

    loop {
        inbox.extend(runner.drain());
        inbox.extend(msg_rx.try_iter());
        if inbox.is_empty() {
            inbox.extend(runner.wait(TICK_INTERVAL));
        }
        inbox.push(Msg::Tick { now: Instant::now() });

        for msg in inbox.drain(..) {
            let (next, effects) = update(state, msg);
            state = next;
            runner.enqueue(effects);
        }

        if state.consume_dirty() {
            renderer.render(&state.view(), &mut stdout)?;
        }
        if is_done(&state, runner.preview().has_failed()) {
            break;
        }
    }

    renderer.finish(&state.view(), &output_dir, &mut stdout)?;
    Ok(())
}

fn initial_msg(command: Command) -> Msg {
    match command {
        Command::Chat { prompt } => Msg::PromptSubmitted {
            content: prompt.join(" "),
            at: Utc::now(),
        },
        Command::Open { session_id } => Msg::OpenSession { session_id },
        Command::Artifact { artifact_id } => Msg::OpenArtifact { artifact_id },
    }
}

/// Nothing in flight and the preview shows the latest bundle, or never will.
fn is_done(state: &AppState, preview_failed: bool) -> bool {
    !state.is_streaming() && !state.is_loading() && (preview_failed || state.is_preview_settled())
}
