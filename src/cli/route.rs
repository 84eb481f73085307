//! CLI route: single route table and run context. Dispatches to the routing library and
//! presentation.

use crate::cli::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_breadcrumb_json, format_breadcrumb_text, format_config_toml, format_route_json,
    format_rows_json, format_rows_table,
};
use crate::config::{ConfigLoader, RouterConfig};
use crate::error::{RouteError, StorageError};
use crate::listing::ListQuery;
use crate::roster::delete_element;
use crate::router::{Request, Router, RoutingSettings};
use crate::store::{Row, SledStorage};
use crate::structure::StructureRegistry;
use crate::types::{Context, ElementId, ParentPointer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace, configuration, registry and store.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: RouterConfig,
    registry: StructureRegistry,
    storage: SledStorage,
    settings: RoutingSettings,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, RouteError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            RouteError::ConfigLoad(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;

        let registry = StructureRegistry::from_config(&config)?;
        let store_path = resolve_store_path(&workspace_root, &config.storage.store_path);
        std::fs::create_dir_all(&store_path).map_err(StorageError::IoError)?;
        let storage = SledStorage::new(&store_path)?;
        debug!(store = %store_path.display(), "Opened content store");

        let settings = RoutingSettings::from_config(&config);
        Ok(Self {
            workspace_root,
            config,
            registry,
            storage,
            settings,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn registry(&self) -> &StructureRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &SledStorage {
        &self.storage
    }

    fn router(&self) -> Router<'_> {
        Router::new(&self.registry, &self.storage).with_settings(self.settings.clone())
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, RouteError> {
        info!(command = command_name(command), "Executing command");
        match command {
            Commands::Route {
                path,
                admin,
                query,
                page_param,
            } => self.route(path, context(*admin), query, page_param),
            Commands::Breadcrumb {
                structure,
                id,
                format,
            } => self.breadcrumb(structure, *id, format),
            Commands::List {
                structure,
                parent,
                page,
                admin,
                format,
            } => self.list(structure, parent, *page, context(*admin), format),
            Commands::Delete { structure, id } => self.delete(structure, *id),
            Commands::Import { file } => self.import(file),
            Commands::Config => format_config_toml(&self.config),
        }
    }

    fn route(
        &self,
        path: &str,
        context: Context,
        query: &[String],
        page_param: &str,
    ) -> Result<String, RouteError> {
        let mut request = Request::new(path).with_context(context);
        for pair in query {
            let (key, value) = pair.split_once('=').unwrap_or((pair.as_str(), ""));
            request = request.with_query(key, value);
        }

        let router = self.router();
        let mut dispatch = router.route(&request)?;
        let pager = match dispatch.model.as_mut() {
            Some(model) if !model.is_not_found() => router.pager(model, &request, page_param)?,
            _ => None,
        };
        if let Some(model) = &dispatch.model {
            dispatch.not_found = model.is_not_found();
        }
        format_route_json(&dispatch.summary(router.settings()), pager.as_ref())
    }

    fn breadcrumb(&self, structure: &str, id: ElementId, format: &str) -> Result<String, RouteError> {
        let model = self.router().locate(structure, id, Context::Admin)?;
        let crumbs = model
            .path()
            .breadcrumbs(&self.settings.start_url, &self.settings.url_suffix);
        match format {
            "json" => format_breadcrumb_json(&crumbs),
            _ => Ok(format_breadcrumb_text(&crumbs)),
        }
    }

    fn list(
        &self,
        structure: &str,
        parent: &str,
        page: Option<u32>,
        context: Context,
        format: &str,
    ) -> Result<String, RouteError> {
        let descriptor = self.registry.by_name(structure)?;
        let pointer: ParentPointer = parent.parse()?;
        let query = ListQuery::new(&self.storage, descriptor, context);
        let rows = query.list(Some(pointer), None, page)?;
        let total = query.count(Some(pointer), None)?;
        match format {
            "json" => format_rows_json(&rows, total),
            _ => Ok(format_rows_table(&rows, total)),
        }
    }

    fn delete(&self, structure: &str, id: ElementId) -> Result<String, RouteError> {
        let model = self.router().locate(structure, id, Context::Admin)?;
        let deleted = delete_element(&self.storage, &model)?;
        self.storage.flush()?;
        Ok(if deleted {
            format!("Deleted {} {}", structure, id)
        } else {
            format!("{} {} was already deleted", structure, id)
        })
    }

    fn import(&self, file: &Path) -> Result<String, RouteError> {
        let text = std::fs::read_to_string(file).map_err(StorageError::IoError)?;
        let document: BTreeMap<String, Vec<Value>> = serde_json::from_str(&text)
            .map_err(|e| StorageError::Backend(format!("Invalid import file: {}", e)))?;

        let mut imported = 0usize;
        for (name, rows) in &document {
            let table = match self.registry.by_name(name) {
                Ok(descriptor) => descriptor.table.clone(),
                Err(_) => name.clone(),
            };
            for value in rows {
                let row: Row = value.as_object().cloned().ok_or_else(|| {
                    StorageError::MalformedRow {
                        table: table.clone(),
                        reason: "import rows must be JSON objects".to_string(),
                    }
                })?;
                self.storage.insert(&table, row)?;
                imported += 1;
            }
            debug!(table = %table, rows = rows.len(), "Imported table");
        }
        self.storage.flush()?;
        Ok(format!(
            "Imported {} rows into {} tables",
            imported,
            document.len()
        ))
    }
}

fn context(admin: bool) -> Context {
    if admin {
        Context::Admin
    } else {
        Context::Site
    }
}

fn resolve_store_path(workspace_root: &Path, store_path: &Path) -> PathBuf {
    if store_path.is_absolute() {
        store_path.to_path_buf()
    } else {
        workspace_root.join(store_path)
    }
}
