//! Selection lifecycle: `Idle → Loading → Rendering → Rendered`.
//!
//! Every file selection starts a new generation. A decode that finishes for an
//! older generation is stale and is dropped, so re-selecting while a previous
//! image is still decoding cancels it and restarts with the new file.

use std::path::{Path, PathBuf};

use crate::loader::Viewport;

/// Where the current selection stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading { generation: u64, path: PathBuf },
    Rendering { generation: u64, path: PathBuf },
    Rendered { path: PathBuf, viewport: Viewport },
    Failed { path: PathBuf, reason: String },
}

/// A request to decode `path` on behalf of selection `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct Session {
    state: SessionState,
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Starts loading `path` from any state, superseding an in-flight load.
    pub fn select(&mut self, path: PathBuf) -> LoadTicket {
        if let SessionState::Loading { generation, path } = &self.state {
            tracing::debug!(
                generation,
                path = %path.display(),
                "superseding in-flight image load"
            );
        }
        self.generation += 1;
        self.state = SessionState::Loading {
            generation: self.generation,
            path: path.clone(),
        };
        LoadTicket {
            generation: self.generation,
            path,
        }
    }

    /// Accepts a finished decode. Returns `false` if it belongs to a
    /// superseded selection, leaving the state untouched.
    pub fn accept_decoded(&mut self, generation: u64) -> bool {
        match &self.state {
            SessionState::Loading {
                generation: current,
                path,
            } if *current == generation => {
                self.state = SessionState::Rendering {
                    generation,
                    path: path.clone(),
                };
                true
            }
            _ => false,
        }
    }

    /// Accepts a failed decode. Returns `false` for stale generations.
    pub fn accept_failure(&mut self, generation: u64, reason: impl Into<String>) -> bool {
        match &self.state {
            SessionState::Loading {
                generation: current,
                path,
            } if *current == generation => {
                self.state = SessionState::Failed {
                    path: path.clone(),
                    reason: reason.into(),
                };
                true
            }
            _ => false,
        }
    }

    /// Completes the render started by [`Session::accept_decoded`].
    pub fn finish_render(&mut self, viewport: Viewport) {
        if let SessionState::Rendering { path, .. } = &self.state {
            self.state = SessionState::Rendered {
                path: path.clone(),
                viewport,
            };
        }
    }

    /// Marks the in-progress render as failed.
    pub fn fail_render(&mut self, reason: impl Into<String>) {
        if let SessionState::Rendering { path, .. } = &self.state {
            self.state = SessionState::Failed {
                path: path.clone(),
                reason: reason.into(),
            };
        }
    }

    /// Short status line for the window title.
    pub fn describe(&self) -> String {
        match &self.state {
            SessionState::Idle => "press O or drop an image".to_string(),
            SessionState::Loading { path, .. } => format!("loading {}", file_name(path)),
            SessionState::Rendering { path, .. } => format!("rendering {}", file_name(path)),
            SessionState::Rendered { path, viewport } => {
                format!("{} ({viewport})", file_name(path))
            }
            SessionState::Failed { path, .. } => format!("{} (failed)", file_name(path)),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
