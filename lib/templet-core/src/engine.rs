//! The engine: library registry, template loaders and compilation entry points.

use std::{collections::HashMap, fmt, path::PathBuf, sync::Arc};

use serde::Deserialize;
use templet_config::GenericConfiguration;
use templet_error::GenericError;
use tracing::debug;

use crate::{
    error::TemplateError,
    lexer::{tokenize, tokenize_smart_trim, Token},
    library::TagLibrary,
    loader::{FileSystemLoader, TemplateLoader},
    template::{MutableTemplate, Template},
};

/// Engine configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfiguration {
    /// Libraries loaded into every template before parsing starts.
    ///
    /// Defaults to `default_tags` and `default_filters`.
    pub default_libraries: Vec<String>,

    /// Whether lines holding only a block or comment tag are removed from the output.
    ///
    /// Defaults to `false`.
    pub smart_trim: bool,

    /// Directories searched, in order, for templates loaded by name.
    ///
    /// Defaults to none.
    pub template_dirs: Vec<PathBuf>,

    /// Directories searched, in order, for media files.
    ///
    /// Defaults to none.
    pub media_dirs: Vec<PathBuf>,
}

impl EngineConfiguration {
    /// Reads the engine configuration from the root of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a field has the wrong type.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, GenericError> {
        Ok(config.as_typed()?)
    }
}

impl Default for EngineConfiguration {
    fn default() -> Self {
        Self {
            default_libraries: vec!["default_tags".into(), "default_filters".into()],
            smart_trim: false,
            template_dirs: Vec::new(),
            media_dirs: Vec::new(),
        }
    }
}

/// Compiles templates.
///
/// The engine owns the registry of tag libraries, the names of the libraries every template starts with, and the
/// loaders used to find templates and media files by name. It is configured up front and then only read, so one engine
/// can compile templates from many threads.
#[derive(Default)]
pub struct Engine {
    libraries: HashMap<String, Arc<dyn TagLibrary>>,
    default_libraries: Vec<String>,
    loaders: Vec<Arc<dyn TemplateLoader>>,
    smart_trim: bool,
}

impl Engine {
    /// Creates an engine with no libraries, no default libraries and no loaders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine from `config`.
    ///
    /// Template and media directories become file system loaders, template directories first. Libraries still have
    /// to be registered.
    pub fn from_configuration(config: &EngineConfiguration) -> Self {
        let mut engine = Self::new();
        engine.set_default_libraries(&config.default_libraries);
        engine.set_smart_trim(config.smart_trim);
        for dirs in [&config.template_dirs, &config.media_dirs] {
            if !dirs.is_empty() {
                engine.add_loader(Arc::new(FileSystemLoader::new(dirs.iter().cloned())));
            }
        }
        debug!(
            default_libraries = ?config.default_libraries,
            smart_trim = config.smart_trim,
            loaders = engine.loaders.len(),
            "Created template engine."
        );
        engine
    }

    /// Registers `library` under `name`, replacing any library already registered under it.
    pub fn register_library<N: Into<String>>(&mut self, name: N, library: Arc<dyn TagLibrary>) {
        self.libraries.insert(name.into(), library);
    }

    /// Returns the library registered under `name`.
    pub fn library(&self, name: &str) -> Option<Arc<dyn TagLibrary>> {
        self.libraries.get(name).cloned()
    }

    /// Returns the names of the libraries loaded into every template, in load order.
    pub fn default_libraries(&self) -> &[String] {
        &self.default_libraries
    }

    /// Replaces the default libraries.
    pub fn set_default_libraries<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.default_libraries = names.into_iter().map(|name| name.as_ref().to_string()).collect();
    }

    /// Appends a default library, unless it is already one.
    pub fn add_default_library<S: Into<String>>(&mut self, name: S) {
        let name = name.into();
        if !self.default_libraries.contains(&name) {
            self.default_libraries.push(name);
        }
    }

    /// Appends a template loader.
    pub fn add_loader(&mut self, loader: Arc<dyn TemplateLoader>) {
        self.loaders.push(loader);
    }

    /// Returns the template loaders, in the order they are consulted.
    pub fn loaders(&self) -> &[Arc<dyn TemplateLoader>] {
        &self.loaders
    }

    /// Returns whether smart trimming is enabled.
    pub fn smart_trim(&self) -> bool {
        self.smart_trim
    }

    /// Sets whether lines holding only a block or comment tag are removed from the output.
    pub fn set_smart_trim(&mut self, smart_trim: bool) {
        self.smart_trim = smart_trim;
    }

    /// Splits `source` into tokens, honoring the smart trim setting.
    pub fn tokenize(&self, source: &str) -> Vec<Token> {
        if self.smart_trim {
            tokenize_smart_trim(source)
        } else {
            tokenize(source)
        }
    }

    /// Compiles `source` into a template.
    ///
    /// Compilation errors are stored on the template rather than returned; see [`Template::error`].
    pub fn new_template(&self, source: &str, name: &str) -> Template {
        Template::compile(self, source, name)
    }

    /// Compiles `source` into a template that folds static output into text as it is rendered.
    pub fn new_mutable_template(&self, source: &str, name: &str) -> MutableTemplate {
        MutableTemplate::compile(self, source, name)
    }

    /// Loads and compiles the template called `name` from the first loader that has it.
    ///
    /// # Errors
    ///
    /// Returns an error if no loader has the template or the loader fails to read it.
    pub fn load_by_name(&self, name: &str) -> Result<Template, GenericError> {
        for loader in &self.loaders {
            if loader.can_load(name) {
                let source = loader.load_by_name(name)?;
                return Ok(self.new_template(&source, name));
            }
        }
        Err(TemplateError::TemplateNotFound { name: name.to_string() }.into())
    }

    /// Locates a media file through the loaders, returning the base URI and the file name relative to it.
    pub fn media_uri(&self, file_name: &str) -> Option<(String, String)> {
        self.loaders.iter().find_map(|loader| loader.media_uri(file_name))
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut libraries = self.libraries.keys().collect::<Vec<_>>();
        libraries.sort();
        f.debug_struct("Engine")
            .field("libraries", &libraries)
            .field("default_libraries", &self.default_libraries)
            .field("loaders", &self.loaders.len())
            .field("smart_trim", &self.smart_trim)
            .finish()
    }
}
