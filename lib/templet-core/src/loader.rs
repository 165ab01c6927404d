//! Template loaders.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use templet_error::{generic_error, ErrorContext as _, GenericError};
use tracing::{debug, warn};

/// A source of named templates and media files.
///
/// Loaders are consulted in registration order by the [`Engine`][crate::engine::Engine]: the first loader whose
/// [`can_load`][Self::can_load] returns `true` provides the template.
pub trait TemplateLoader: Send + Sync {
    /// Returns `true` if this loader has a template called `name`.
    fn can_load(&self, name: &str) -> bool;

    /// Returns the source of the template called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template does not exist or cannot be read.
    fn load_by_name(&self, name: &str) -> Result<String, GenericError>;

    /// Locates a media file, returning the base URI it lives under and its name relative to that base.
    fn media_uri(&self, file_name: &str) -> Option<(String, String)>;
}

/// Serves templates held in memory.
///
/// Has no media files.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLoader {
    templates: HashMap<String, String>,
}

impl InMemoryLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the template called `name`.
    pub fn set_template<N, S>(&mut self, name: N, source: S)
    where
        N: Into<String>,
        S: Into<String>,
    {
        self.templates.insert(name.into(), source.into());
    }
}

impl TemplateLoader for InMemoryLoader {
    fn can_load(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    fn load_by_name(&self, name: &str) -> Result<String, GenericError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| generic_error!("Couldn't load template '{}'. Template does not exist.", name))
    }

    fn media_uri(&self, _file_name: &str) -> Option<(String, String)> {
        None
    }
}

/// Serves templates and media files from directories on disk.
///
/// Each directory is searched in order, under an optional theme subdirectory. Names that resolve to a path outside of
/// the directory they were looked up in, such as `../secret`, are refused.
#[derive(Clone, Debug, Default)]
pub struct FileSystemLoader {
    dirs: Vec<PathBuf>,
    theme: String,
}

impl FileSystemLoader {
    /// Creates a loader searching `dirs` in order.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
            theme: String::new(),
        }
    }

    /// Sets the theme subdirectory searched inside each directory.
    pub fn with_theme<S: Into<String>>(mut self, theme: S) -> Self {
        self.theme = theme.into();
        self
    }

    /// Returns the directories searched, in order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Returns the theme subdirectory.
    pub fn theme(&self) -> &str {
        &self.theme
    }

    // Returns the canonical path of the first existing file called `name`, with the canonical directory it was found
    // in.
    fn locate(&self, name: &str) -> Option<(PathBuf, PathBuf)> {
        self.dirs.iter().find_map(|dir| {
            let candidate = dir.join(&self.theme).join(name);
            if !candidate.is_file() {
                return None;
            }
            let root = fs::canonicalize(dir).ok()?;
            let path = fs::canonicalize(&candidate).ok()?;
            if path.starts_with(&root) {
                Some((path, root))
            } else {
                warn!(name, dir = %dir.display(), "Refusing to load a file outside of its directory.");
                None
            }
        })
    }
}

impl TemplateLoader for FileSystemLoader {
    fn can_load(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }

    fn load_by_name(&self, name: &str) -> Result<String, GenericError> {
        let (path, _) = self
            .locate(name)
            .ok_or_else(|| generic_error!("Couldn't find template '{}' in any template directory.", name))?;
        debug!(path = %path.display(), "Reading template file.");
        fs::read_to_string(&path).with_error_context(|| format!("Failed to read template file '{}'.", path.display()))
    }

    fn media_uri(&self, file_name: &str) -> Option<(String, String)> {
        let (path, _) = self.locate(file_name)?;
        let full = path.to_string_lossy();
        let relative = Path::new(file_name).to_string_lossy();
        let base = full.strip_suffix(relative.as_ref())?;
        Some((base.to_string(), file_name.to_string()))
    }
}
