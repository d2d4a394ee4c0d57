use super::command::CommandScriptHook;
use dnsroute_application::ports::{ScriptCatalog, ScriptHook};
use dnsroute_domain::DomainError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

/// Resolves rule `script` references.
///
/// Named in-process hooks take precedence; any other reference is an
/// executable path, relative ones resolved against the base directory.
/// Command hooks are built once per reference and cached.
pub struct ScriptRegistry {
    base_dir: Option<PathBuf>,
    timeout: Duration,
    named: HashMap<String, Arc<dyn ScriptHook>>,
    commands: RwLock<HashMap<String, Arc<dyn ScriptHook>>>,
}

impl ScriptRegistry {
    pub fn new(base_dir: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            base_dir,
            timeout,
            named: HashMap::new(),
            commands: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_hook(mut self, name: impl Into<String>, hook: Arc<dyn ScriptHook>) -> Self {
        self.named.insert(name.into(), hook);
        self
    }

    pub fn cached(&self) -> usize {
        self.commands.read().map(|c| c.len()).unwrap_or(0)
    }

    fn resolve_path(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ScriptCatalog for ScriptRegistry {
    fn lookup(&self, reference: &str) -> Result<Arc<dyn ScriptHook>, DomainError> {
        if let Some(hook) = self.named.get(reference) {
            return Ok(Arc::clone(hook));
        }

        if let Some(hook) = self
            .commands
            .read()
            .ok()
            .and_then(|commands| commands.get(reference).cloned())
        {
            return Ok(hook);
        }

        let path = self.resolve_path(reference);
        if !path.is_file() {
            return Err(DomainError::ScriptNotFound(path.display().to_string()));
        }

        debug!(reference, path = %path.display(), "Loaded command script");
        let hook: Arc<dyn ScriptHook> = Arc::new(CommandScriptHook::new(path, self.timeout));
        if let Ok(mut commands) = self.commands.write() {
            commands.insert(reference.to_string(), Arc::clone(&hook));
        }
        Ok(hook)
    }
}
