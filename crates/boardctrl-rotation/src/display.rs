//! Display sinks: where slides are put on screen
//!
//! A [`DisplaySink`] opens exactly one [`DisplaySurface`] per rotation session. The
//! session keeps the surface and retargets it for every transition; it never asks the
//! sink for a second surface.

use crate::config::{DisplayConfig, SinkKind};
use crate::{Result, RotationError};
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Result type alias for display operations
pub type DisplayResult<T> = std::result::Result<T, DisplayError>;

/// Errors reported by display sinks and surfaces
#[derive(Error, Debug)]
pub enum DisplayError {
    /// The sink refused to open a surface
    #[error("Display surface blocked: {reason}")]
    Blocked {
        /// Why the surface could not be opened
        reason: String,
    },

    /// The surface was closed from outside the engine
    #[error("Display surface was closed")]
    Closed,

    /// The surface could not show a URL
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// Target that failed
        url: String,
        /// Failure description
        message: String,
    },

    /// I/O error while driving the surface
    #[error("Display I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DisplayError {
    /// Create a blocked error
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self::Blocked {
            reason: reason.into(),
        }
    }

    /// Create a navigation error
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Something that can open a display surface
#[async_trait]
pub trait DisplaySink: Send + Sync + fmt::Debug {
    /// Open a new surface showing `url`
    async fn open(&self, url: &str) -> DisplayResult<Box<dyn DisplaySurface>>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// A single addressable output, reused for every transition of a session
#[async_trait]
pub trait DisplaySurface: Send + fmt::Debug {
    /// Point the surface at a new URL
    async fn retarget(&mut self, url: &str) -> DisplayResult<()>;

    /// URL currently on screen
    fn current(&self) -> &str;
}

/// Headless sink that only logs navigations
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[derive(Debug)]
struct TracingSurface {
    current: String,
}

#[async_trait]
impl DisplaySink for TracingSink {
    async fn open(&self, url: &str) -> DisplayResult<Box<dyn DisplaySurface>> {
        info!(url, "Display surface opened");
        Ok(Box::new(TracingSurface {
            current: url.to_string(),
        }))
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[async_trait]
impl DisplaySurface for TracingSurface {
    async fn retarget(&mut self, url: &str) -> DisplayResult<()> {
        info!(from = %self.current, to = url, "Display surface retargeted");
        url.clone_into(&mut self.current);
        Ok(())
    }

    fn current(&self) -> &str {
        &self.current
    }
}

/// Sink that publishes the current URL to a file
///
/// The file holds one line, the URL on screen. It is replaced atomically on every
/// transition so a kiosk browser polling it never reads a partial write.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug)]
struct FileSurface {
    path: PathBuf,
    current: String,
}

async fn publish(path: &Path, url: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map_or_else(|| "display".into(), |name| name.to_string_lossy());
    let staging = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&staging, format!("{url}\n")).await?;
    tokio::fs::rename(&staging, path).await
}

#[async_trait]
impl DisplaySink for FileSink {
    async fn open(&self, url: &str) -> DisplayResult<Box<dyn DisplaySurface>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let is_dir = tokio::fs::metadata(parent)
                .await
                .is_ok_and(|meta| meta.is_dir());
            if !is_dir {
                return Err(DisplayError::blocked(format!(
                    "directory {} does not exist",
                    parent.display()
                )));
            }
        }

        publish(&self.path, url).await?;
        info!(path = %self.path.display(), url, "Display file opened");

        Ok(Box::new(FileSurface {
            path: self.path.clone(),
            current: url.to_string(),
        }))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[async_trait]
impl DisplaySurface for FileSurface {
    async fn retarget(&mut self, url: &str) -> DisplayResult<()> {
        publish(&self.path, url)
            .await
            .map_err(|e| DisplayError::navigation(url, e.to_string()))?;

        debug!(path = %self.path.display(), url, "Display file updated");
        url.clone_into(&mut self.current);
        Ok(())
    }

    fn current(&self) -> &str {
        &self.current
    }
}

/// Build the sink selected by configuration
///
/// # Errors
///
/// Returns [`RotationError::Configuration`] if the file sink has no output file.
pub fn build_sink(config: &DisplayConfig) -> Result<Arc<dyn DisplaySink>> {
    match config.sink {
        SinkKind::Log => Ok(Arc::new(TracingSink)),
        SinkKind::File => {
            let path = config.output_file.clone().ok_or_else(|| {
                RotationError::configuration("display.output_file is required for the file sink")
            })?;
            Ok(Arc::new(FileSink::new(path)))
        }
    }
}
