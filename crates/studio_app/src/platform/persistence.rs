use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use studio_core::SessionContext;
use studio_engine::{ensure_output_dir, AtomicFileWriter};
use studio_logging::{studio_error, studio_info, studio_warn};

const STATE_FILENAME: &str = ".studio_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedSession {
    session_id: Option<String>,
    base_artifact_id: Option<String>,
}

pub(crate) fn load_session_context(output_dir: &Path) -> SessionContext {
    let path = output_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return SessionContext::default();
        }
        Err(err) => {
            studio_warn!("Failed to read persisted session from {:?}: {}", path, err);
            return SessionContext::default();
        }
    };

    let state: PersistedSession = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            studio_warn!("Failed to parse persisted session from {:?}: {}", path, err);
            return SessionContext::default();
        }
    };

    studio_info!("Loaded persisted session context from {:?}", path);
    SessionContext::new(state.session_id, state.base_artifact_id)
}

pub(crate) fn save_session_context(output_dir: &Path, context: &SessionContext) {
    if let Err(err) = ensure_output_dir(output_dir) {
        studio_error!("Failed to ensure output dir {:?}: {}", output_dir, err);
        return;
    }

    let state = PersistedSession {
        session_id: context.session_id.clone(),
        base_artifact_id: context.base_artifact_id.clone(),
    };
    let content = match ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new()) {
        Ok(text) => text,
        Err(err) => {
            studio_error!("Failed to serialize session context: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(output_dir));
    if let Err(err) = writer.write(STATE_FILENAME, &content) {
        studio_error!(
            "Failed to write session context to {:?}: {}",
            output_dir,
            err
        );
    }
}
