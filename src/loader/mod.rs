//! Assembling settings and paths from a chain of optionally-present modules.
//!
//! There is no runtime import machinery here: the [`Registry`] *is* the
//! module-resolution mechanism. Collaborating modules register a
//! [`SettingsModule`] hook under a name, and the [`Factory`] runs a chain of
//! named modules and TOML files in order, mutating one shared
//! settings/paths pair.

mod error;

pub use error::LoaderError;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::dict::{from_toml_table, MorfDict, Table};
use crate::paths::Paths;
use crate::Error;

/// The module hook contract: mutate the shared settings and paths in place.
pub trait SettingsModule {
    fn make_settings(&self, settings: &MorfDict, paths: &mut Paths) -> Result<(), Error>;

    /// Where this module lives on disk, if anywhere. Feeds `module_root` and
    /// [`Registry::path_from_module`].
    fn file(&self) -> Option<&Path> {
        None
    }
}

/// Adapts a closure into a [`SettingsModule`], optionally carrying the
/// module's on-disk location.
pub struct FnModule<F> {
    hook: F,
    file: Option<PathBuf>,
}

impl<F> FnModule<F>
where
    F: Fn(&MorfDict, &mut Paths) -> Result<(), Error>,
{
    pub fn new(hook: F) -> Self {
        Self { hook, file: None }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }
}

impl<F> SettingsModule for FnModule<F>
where
    F: Fn(&MorfDict, &mut Paths) -> Result<(), Error>,
{
    fn make_settings(&self, settings: &MorfDict, paths: &mut Paths) -> Result<(), Error> {
        (self.hook)(settings, paths)
    }

    fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// Named settings modules, looked up by the factory. A required name missing
/// from the registry is the crate's module-not-found condition.
#[derive(Default)]
pub struct Registry {
    modules: IndexMap<String, Box<dyn SettingsModule>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, module: impl SettingsModule + 'static) {
        self.modules.insert(name.into(), Box::new(module));
    }

    /// Registers a bare closure hook with no on-disk location.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&MorfDict, &mut Paths) -> Result<(), Error> + 'static,
    {
        self.register(name, FnModule::new(hook));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Resolves a `"module:relative/segment"` locator against a registered
    /// module's location: with no relative part, the module's own file path;
    /// otherwise the file's containing directory joined with the remaining
    /// colon-separated segments.
    pub fn path_from_module(&self, locator: &str) -> Result<String, LoaderError> {
        let mut parts = locator.split(':');
        let name = parts.next().unwrap_or(locator);
        let module = self
            .modules
            .get(name)
            .ok_or_else(|| LoaderError::ModuleNotFound(name.to_string()))?;
        let file = module
            .file()
            .ok_or_else(|| LoaderError::ModuleFileUnknown(name.to_string()))?;

        let relative: Vec<&str> = parts.collect();
        if relative.is_empty() {
            return Ok(file.to_string_lossy().into_owned());
        }
        let mut path = file.parent().unwrap_or(Path::new("")).to_path_buf();
        for segment in relative {
            path.push(segment);
        }
        Ok(path.to_string_lossy().into_owned())
    }
}

enum Step {
    Module { name: String, required: bool },
    File { path: PathBuf, required: bool },
}

/// Builds the final settings/paths pair by running a chain of modules and
/// TOML files against a fresh interpolating container.
///
/// The chain always starts with initial defaults, a `module_root` path taken
/// from the main module's location, and the required `default` module; the
/// registered steps then run in order. Optional modules and files that are
/// absent are skipped silently; required ones terminate the build with the
/// original error.
///
/// ## Example
///
/// ```no_run
/// use morfdict::{Factory, Registry};
///
/// let mut registry = Registry::new();
/// registry.register_fn("default", |settings, _paths| {
///     settings.set("name", "app")?;
///     Ok(())
/// });
///
/// let (settings, paths) = Factory::new(registry, "default")
///     .with_file("settings.toml", false)
///     .with_module("local", false)
///     .build()?;
/// # let _ = (settings, paths);
/// # Ok::<(), morfdict::Error>(())
/// ```
#[must_use = "builders do nothing until .build() is called"]
pub struct Factory {
    registry: Registry,
    main: String,
    defaults: Table,
    steps: Vec<Step>,
}

impl Factory {
    /// Creates a factory over a registry; `main` names the module whose file
    /// location seeds the `module_root` path.
    pub fn new(registry: Registry, main: impl Into<String>) -> Self {
        Self {
            registry,
            main: main.into(),
            defaults: Table::new(),
            steps: Vec::new(),
        }
    }

    /// Initial settings data, applied before any module runs.
    pub fn with_defaults(mut self, defaults: Table) -> Self {
        self.defaults = defaults;
        self
    }

    /// Adds a settings module to the chain. A required module missing from
    /// the registry fails the build; an optional one is skipped.
    pub fn with_module(mut self, name: impl Into<String>, required: bool) -> Self {
        self.steps.push(Step::Module {
            name: name.into(),
            required,
        });
        self
    }

    /// Adds a TOML file to the chain; its table deep-merges into the
    /// settings. A required file that does not exist fails the build; an
    /// optional one is skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.steps.push(Step::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Runs the chain and returns the assembled settings and paths.
    pub fn build(self) -> Result<(MorfDict, Paths), Error> {
        let Factory {
            registry,
            main,
            defaults,
            steps,
        } = self;

        let settings = MorfDict::interpolating();
        settings.extend(defaults)?;
        let mut paths = Paths::new();

        let main = registry
            .modules
            .get(&main)
            .ok_or_else(|| LoaderError::ModuleNotFound(main.clone()))?;
        if let Some(file) = main.file() {
            let dir = file.parent().unwrap_or(Path::new(""));
            paths.set("module_root", dir.to_string_lossy().into_owned(), None, false);
        }

        run_module(&registry, "default", true, &settings, &mut paths)?;

        for step in &steps {
            match step {
                Step::Module { name, required } => {
                    run_module(&registry, name, *required, &settings, &mut paths)?;
                }
                Step::File { path, required } => {
                    if let Some(table) = load_settings_file(path, *required)? {
                        debug!(path = %path.display(), "merging settings file");
                        let overlay = MorfDict::interpolating();
                        overlay.extend(from_toml_table(table))?;
                        settings.merge(&overlay)?;
                    }
                }
            }
        }

        Ok((settings, paths))
    }
}

fn run_module(
    registry: &Registry,
    name: &str,
    required: bool,
    settings: &MorfDict,
    paths: &mut Paths,
) -> Result<(), Error> {
    match registry.modules.get(name) {
        Some(module) => {
            debug!(module = name, "running settings module");
            module.make_settings(settings, paths)
        }
        None if required => Err(LoaderError::ModuleNotFound(name.to_string()).into()),
        None => {
            debug!(module = name, "optional settings module not registered, skipping");
            Ok(())
        }
    }
}

/// Loads and parses a TOML settings file.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn load_settings_file(path: &Path, required: bool) -> Result<Option<toml::Table>, LoaderError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| LoaderError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(LoaderError::FileNotFound(path.to_path_buf()))
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(LoaderError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::{DictError, Value};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn registry_with_default() -> Registry {
        let mut registry = Registry::new();
        registry.register_fn("default", |settings, paths| {
            settings.set("host", "localhost")?;
            settings.set("url", "http://%(host)s/")?;
            paths.set("data", "data", None, true);
            Ok(())
        });
        registry
    }

    #[test]
    fn test_build_runs_default_module() {
        let (settings, paths) = Factory::new(registry_with_default(), "default")
            .build()
            .unwrap();
        assert_eq!(
            settings.get("url").unwrap().as_str(),
            Some("http://localhost/")
        );
        assert!(paths.contains("data"));
    }

    #[test]
    fn test_missing_default_module_fails() {
        let mut registry = Registry::new();
        registry.register_fn("main", |_, _| Ok(()));
        let err = Factory::new(registry, "main").build().unwrap_err();
        assert!(matches!(
            err,
            Error::Loader(LoaderError::ModuleNotFound(name)) if name == "default"
        ));
    }

    #[test]
    fn test_missing_main_module_fails() {
        let err = Factory::new(Registry::new(), "app").build().unwrap_err();
        assert!(matches!(
            err,
            Error::Loader(LoaderError::ModuleNotFound(name)) if name == "app"
        ));
    }

    #[test]
    fn test_optional_module_skipped() {
        let result = Factory::new(registry_with_default(), "default")
            .with_module("local", false)
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_required_module_missing_fails() {
        let err = Factory::new(registry_with_default(), "default")
            .with_module("local", true)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Loader(LoaderError::ModuleNotFound(name)) if name == "local"
        ));
    }

    #[test]
    fn test_present_optional_module_error_propagates() {
        let mut registry = registry_with_default();
        registry.register_fn("local", |settings, _| {
            settings.get("no_such_key")?;
            Ok(())
        });
        let err = Factory::new(registry, "default")
            .with_module("local", false)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Dict(DictError::KeyNotFound(key)) if key == "no_such_key"
        ));
    }

    #[test]
    fn test_modules_run_in_registration_order() {
        let mut registry = registry_with_default();
        registry.register_fn("local", |settings, _| {
            settings.set("host", "local-override")?;
            Ok(())
        });
        let (settings, _) = Factory::new(registry, "default")
            .with_module("local", false)
            .build()
            .unwrap();
        assert_eq!(
            settings.get("url").unwrap().as_str(),
            Some("http://local-override/")
        );
    }

    #[test]
    fn test_with_defaults_applied_before_modules() {
        let mut registry = Registry::new();
        registry.register_fn("default", |settings, _| {
            settings.set("greeting", "hello %(name)s")?;
            Ok(())
        });
        let (settings, _) = Factory::new(registry, "default")
            .with_defaults(Table::from([("name".to_string(), Value::from("world"))]))
            .build()
            .unwrap();
        assert_eq!(
            settings.get("greeting").unwrap().as_str(),
            Some("hello world")
        );
    }

    #[test]
    fn test_with_file_merges_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "host = \"from-file\"").unwrap();

        let (settings, _) = Factory::new(registry_with_default(), "default")
            .with_file(file.path(), true)
            .build()
            .unwrap();
        assert_eq!(
            settings.get("url").unwrap().as_str(),
            Some("http://from-file/")
        );
    }

    #[test]
    fn test_with_file_required_missing() {
        let err = Factory::new(registry_with_default(), "default")
            .with_file("/nonexistent/settings.toml", true)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Loader(LoaderError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_with_file_optional_missing_skipped() {
        let result = Factory::new(registry_with_default(), "default")
            .with_file("/nonexistent/settings.toml", false)
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_with_file_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[").unwrap();

        let err = Factory::new(registry_with_default(), "default")
            .with_file(file.path(), true)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Loader(LoaderError::ParseError { .. })));
    }

    #[test]
    fn test_module_root_from_main_module_file() {
        let mut registry = registry_with_default();
        registry.register(
            "app",
            FnModule::new(|_: &MorfDict, _: &mut Paths| Ok(()))
                .with_file("/srv/app/settings/app.rs"),
        );
        let (_, paths) = Factory::new(registry, "app").build().unwrap();
        assert_eq!(paths.get("module_root").unwrap(), "/srv/app/settings");
    }

    #[test]
    fn test_path_from_module_without_relative_part() {
        let mut registry = Registry::new();
        registry.register(
            "app",
            FnModule::new(|_: &MorfDict, _: &mut Paths| Ok(())).with_file("/srv/app/mod.rs"),
        );
        assert_eq!(registry.path_from_module("app").unwrap(), "/srv/app/mod.rs");
    }

    #[test]
    fn test_path_from_module_with_relative_segments() {
        let mut registry = Registry::new();
        registry.register(
            "app",
            FnModule::new(|_: &MorfDict, _: &mut Paths| Ok(())).with_file("/srv/app/mod.rs"),
        );
        let sep = std::path::MAIN_SEPARATOR;
        assert_eq!(
            registry.path_from_module("app:assets:templates").unwrap(),
            format!("/srv/app{sep}assets{sep}templates")
        );
    }

    #[test]
    fn test_path_from_module_unknown_module() {
        let registry = Registry::new();
        assert!(matches!(
            registry.path_from_module("ghost:x"),
            Err(LoaderError::ModuleNotFound(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_path_from_module_without_location() {
        let mut registry = Registry::new();
        registry.register_fn("app", |_, _| Ok(()));
        assert!(matches!(
            registry.path_from_module("app"),
            Err(LoaderError::ModuleFileUnknown(name)) if name == "app"
        ));
    }
}
