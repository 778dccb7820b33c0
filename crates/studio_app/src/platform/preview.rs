//! Directory-backed preview surface.
//!
//! The output directory plays the role of the sandbox: it is bootstrapped
//! once on a background thread, and each presented bundle replaces the files
//! written by the previous one.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use studio_core::{FileBundle, Msg};
use studio_engine::{ensure_output_dir, write_bundle, AtomicFileWriter, PersistError};
use studio_logging::{studio_error, studio_info, studio_warn};

const SCAFFOLD_FILENAME: &str = "index.html";
const SCAFFOLD: &str = "<!doctype html>\n<html>\n  <head><meta charset=\"utf-8\"><title>Preview</title></head>\n  <body><div id=\"root\"></div></body>\n</html>\n";

pub struct DirectoryPreview {
    dir: PathBuf,
    written: BTreeSet<String>,
    failed: Arc<AtomicBool>,
}

impl DirectoryPreview {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            written: BTreeSet::new(),
            failed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Prepare the directory in the background, then post [`Msg::SandboxReady`].
    pub fn bootstrap(&self, msg_tx: mpsc::Sender<Msg>) {
        let dir = self.dir.clone();
        let failed = self.failed.clone();
        thread::spawn(move || match prepare(&dir) {
            Ok(()) => {
                studio_info!("Preview directory ready at {:?}", dir);
                let _ = msg_tx.send(Msg::SandboxReady);
            }
            Err(err) => {
                studio_error!("Preview bootstrap failed for {:?}: {}", dir, err);
                failed.store(true, Ordering::SeqCst);
            }
        });
    }

    /// The preview can never become ready.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Replace the presented bundle with `bundle`.
    pub fn show(&mut self, bundle: &FileBundle) {
        match write_bundle(&self.dir, bundle.iter()) {
            Ok(paths) => studio_info!("Preview updated: {} files", paths.len()),
            Err(err) => {
                studio_error!("Failed to write preview bundle: {}", err);
                return;
            }
        }

        let current: BTreeSet<String> = bundle.paths().map(str::to_string).collect();
        for stale in self.written.difference(&current) {
            let target = self.dir.join(stale.trim_start_matches('/'));
            if let Err(err) = fs::remove_file(&target) {
                studio_warn!("Failed to remove stale preview file {:?}: {}", target, err);
            }
        }
        self.written = current;
    }
}

fn prepare(dir: &Path) -> Result<(), PersistError> {
    ensure_output_dir(dir)?;
    if !dir.join(SCAFFOLD_FILENAME).exists() {
        AtomicFileWriter::new(dir.to_path_buf()).write(SCAFFOLD_FILENAME, SCAFFOLD)?;
    }
    Ok(())
}
