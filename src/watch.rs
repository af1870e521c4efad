//! Watch mode: re-convert inputs whenever they change on disk.
//!
//! Each input's parent directory is watched non-recursively rather than the
//! file itself, so editors that save by writing a new file and renaming it
//! over the old one keep triggering events. Events are filtered down to the
//! watched inputs and deduplicated on `(canonical path, mtime)`: a burst of
//! notifications for one save converts once.

use crate::config::ConversionConfig;
use crate::convert::convert_to_file_with;
use crate::error::Md2PdfError;
use crate::output::output_path;
use crate::pipeline::print::{ChromePrinter, Printer};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Last processed modification time per watched input.
#[derive(Debug, Default)]
pub struct WatchState {
    processed: HashMap<PathBuf, SystemTime>,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `(path, mtime)` and return whether it is new.
    ///
    /// Returns `false` when the pair equals the last one recorded for `path`.
    pub fn observe(&mut self, path: &Path, mtime: SystemTime) -> bool {
        match self.processed.get(path) {
            Some(last) if *last == mtime => false,
            _ => {
                self.processed.insert(path.to_path_buf(), mtime);
                true
            }
        }
    }
}

/// Long-running watcher over a fixed set of Markdown files.
pub struct WatchLoop<P = ChromePrinter> {
    targets: Vec<PathBuf>,
    config: ConversionConfig,
    printer: P,
    state: WatchState,
    events: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
    // Dropping the watcher stops event delivery.
    _watcher: RecommendedWatcher,
}

impl WatchLoop<ChromePrinter> {
    /// Start watching `paths`, converting with headless Chrome.
    pub fn new<I>(paths: I, config: ConversionConfig) -> Result<Self, Md2PdfError>
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let printer = ChromePrinter::from_config(&config);
        Self::with_printer(paths, config, printer)
    }
}

impl<P: Printer> WatchLoop<P> {
    /// Start watching `paths` with a caller-supplied [`Printer`].
    ///
    /// Events start buffering immediately, before [`run`](Self::run) is
    /// called.
    pub fn with_printer<I>(paths: I, config: ConversionConfig, printer: P) -> Result<Self, Md2PdfError>
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let mut targets = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let canonical = path.canonicalize().map_err(|e| Md2PdfError::Watch {
                path: path.to_path_buf(),
                source: notify::Error::io(e),
            })?;
            if !targets.contains(&canonical) {
                targets.push(canonical);
            }
        }

        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .map_err(|source| Md2PdfError::Watch {
            path: PathBuf::new(),
            source,
        })?;

        let roots: BTreeSet<&Path> = targets.iter().filter_map(|t| t.parent()).collect();
        for root in roots {
            watcher
                .watch(root, RecursiveMode::NonRecursive)
                .map_err(|source| Md2PdfError::Watch {
                    path: root.to_path_buf(),
                    source,
                })?;
            debug!("Watching {}", root.display());
        }

        Ok(Self {
            targets,
            config,
            printer,
            state: WatchState::new(),
            events,
            _watcher: watcher,
        })
    }

    /// Canonical paths being watched, in input order.
    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    /// Process events until the process terminates.
    pub async fn run(&mut self) -> Result<(), Md2PdfError> {
        self.run_until(std::future::pending()).await
    }

    /// Process events until `shutdown` completes.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), Md2PdfError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Watch loop stopped");
                    return Ok(());
                }
                event = self.events.recv() => match event {
                    Some(Ok(event)) => {
                        self.handle_event(&event).await;
                    }
                    Some(Err(e)) => warn!("Watch error: {}", e),
                    None => {
                        return Err(Md2PdfError::Internal("file watcher stopped unexpectedly".into()));
                    }
                },
            }
        }
    }

    /// Convert every watched input named by `event` whose mtime changed.
    /// Returns the number of conversions attempted.
    pub async fn handle_event(&mut self, event: &notify::Event) -> usize {
        if matches!(event.kind, EventKind::Access(_)) {
            return 0;
        }

        let mut hits: Vec<PathBuf> = Vec::new();
        for path in &event.paths {
            let real = path.canonicalize().unwrap_or_else(|_| path.clone());
            if self.targets.contains(&real) && !hits.contains(&real) {
                hits.push(real);
            }
        }

        let mut converted = 0;
        for target in hits {
            let mtime = match std::fs::metadata(&target).and_then(|m| m.modified()) {
                Ok(mtime) => mtime,
                Err(e) => {
                    debug!("Skipping {}: {}", target.display(), e);
                    continue;
                }
            };
            if !self.state.observe(&target, mtime) {
                debug!("Unchanged since last conversion: {}", target.display());
                continue;
            }

            let output = output_path(&target);
            info!("Change detected: {}", target.display());
            match convert_to_file_with(&target, &output, &self.config, &self.printer).await {
                Ok(_) => info!("Regenerated {}", output.display()),
                Err(e) => warn!("Conversion of {} failed: {}", target.display(), e),
            }
            converted += 1;
        }
        converted
    }
}
