//! Request routing
//!
//! [`Router::route`] runs one request through the whole pipeline: pre-dispatch hooks, forward
//! resolution of the url, post-dispatch hooks, template materialization, retyping of the
//! leaf model and finally controller selection. Not-found is carried on the model, so a
//! 404 still leaves a model, a partial path and a controller to render it with.

use crate::config::RouterConfig;
use crate::dispatch::ModelDispatcher;
use crate::error::{ConfigurationError, RouteError};
use crate::listing::{Pager, DEFAULT_PAGER_WINDOW};
use crate::model::ContentModel;
use crate::store::{Row, Storage};
use crate::structure::StructureRegistry;
use crate::template::{TemplateMaterializer, DEFAULT_MAX_TEMPLATE_DEPTH};
use crate::tree::ancestry::DEFAULT_MAX_ANCESTRY_DEPTH;
use crate::tree::path::ROOT_URL;
use crate::tree::{AncestryResolver, Breadcrumb, Path, PathResolver};
use crate::types::{Context, ElementId, StructureId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Explicit module/controller target of an AJAX request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AjaxTarget {
    pub module: String,
    pub controller: String,
}

/// One incoming request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Raw request path, possibly with query string and fragment
    pub path: String,
    pub context: Context,
    pub ajax: Option<AjaxTarget>,
    pub query: BTreeMap<String, String>,
}

impl Request {
    /// Site request for `path`; query parameters in the path are parsed into `query`
    pub fn new(path: &str) -> Self {
        let query = path
            .split_once('?')
            .map(|(_, rest)| rest.split('#').next().unwrap_or_default())
            .map(parse_query)
            .unwrap_or_default();
        Self {
            path: path.to_string(),
            context: Context::Site,
            ajax: None,
            query,
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_ajax(mut self, module: &str, controller: &str) -> Self {
        self.ajax = Some(AjaxTarget {
            module: module.to_string(),
            controller: controller.to_string(),
        });
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    /// Query string of every parameter except `param`, in key order
    pub fn query_without(&self, param: &str) -> String {
        self.query
            .iter()
            .filter(|(key, _)| key.as_str() != param)
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Page requested through `param`; missing, zero or unparsable values mean page 1
    pub fn page_number(&self, param: &str) -> u32 {
        self.query
            .get(param)
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1)
    }
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Handler selected for a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ControllerName {
    /// Controller of a structure in the given context
    Structure { structure: String, context: Context },
    /// AJAX controller named by the request
    Ajax { module: String, controller: String },
    /// Controller set verbatim by a dispatch hook
    Named { name: String },
}

impl fmt::Display for ControllerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerName::Structure { structure, context } => {
                write!(f, "{}::{}", structure, context)
            }
            ControllerName::Ajax { module, controller } => {
                write!(f, "{}_{}::ajax", module, controller)
            }
            ControllerName::Named { name } => write!(f, "{}", name),
        }
    }
}

/// In-progress routing state handed to dispatch hooks
#[derive(Debug)]
pub struct RouterState {
    pub request: Request,
    /// Model resolved so far; a pre-dispatch hook that sets it skips url resolution
    pub model: Option<ContentModel>,
    /// Controller forced by a hook; skips controller selection
    pub controller: Option<ControllerName>,
}

impl RouterState {
    fn new(request: Request) -> Self {
        Self {
            request,
            model: None,
            controller: None,
        }
    }
}

/// Extension point invoked around url resolution
pub trait DispatchHook: Send + Sync {
    fn name(&self) -> &str;

    fn pre_dispatch(&self, _state: &mut RouterState) -> Result<(), RouteError> {
        Ok(())
    }

    fn post_dispatch(&self, _state: &mut RouterState) -> Result<(), RouteError> {
        Ok(())
    }
}

/// Ordered set of dispatch hooks
#[derive(Default, Clone)]
pub struct HookBroker {
    hooks: Vec<Arc<dyn DispatchHook>>,
}

impl HookBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn DispatchHook>) {
        debug!(hook = hook.name(), "Registered dispatch hook");
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    fn pre_dispatch(&self, state: &mut RouterState) -> Result<(), RouteError> {
        for hook in &self.hooks {
            hook.pre_dispatch(state)?;
        }
        Ok(())
    }

    fn post_dispatch(&self, state: &mut RouterState) -> Result<(), RouteError> {
        for hook in &self.hooks {
            hook.post_dispatch(state)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HookBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("HookBroker").field("hooks", &names).finish()
    }
}

/// Url layout and recursion bounds used by the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingSettings {
    pub start_url: String,
    pub url_suffix: String,
    pub max_template_depth: usize,
    pub max_ancestry_depth: usize,
    pub pager_window: u32,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            url_suffix: String::new(),
            max_template_depth: DEFAULT_MAX_TEMPLATE_DEPTH,
            max_ancestry_depth: DEFAULT_MAX_ANCESTRY_DEPTH,
            pager_window: DEFAULT_PAGER_WINDOW,
        }
    }
}

impl RoutingSettings {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            start_url: config.site.start_url.clone(),
            url_suffix: config.site.url_suffix.clone(),
            max_template_depth: config.limits.max_template_depth,
            max_ancestry_depth: config.limits.max_ancestry_depth,
            pager_window: config.limits.pager_window,
        }
    }
}

/// Request path split into segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub segments: Vec<String>,
    /// Suffix, trailing slash or mount prefix was wrong; the request is a 404 even if its
    /// segments resolve
    pub malformed: bool,
}

/// Result of routing one request
#[derive(Debug, Clone)]
pub struct Dispatch {
    /// Resolved model; `None` only for AJAX requests
    pub model: Option<ContentModel>,
    pub controller: ControllerName,
    pub not_found: bool,
}

/// Serializable view of a [`Dispatch`]
#[derive(Debug, Clone, Serialize)]
pub struct DispatchSummary {
    pub controller: String,
    pub model: Option<String>,
    pub not_found: bool,
    pub parent_pointer: Option<String>,
    pub path: Vec<PathEntry>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub page_data: Option<Row>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathEntry {
    pub structure_id: StructureId,
    pub id: ElementId,
    pub url: String,
}

impl Dispatch {
    pub fn summary(&self, settings: &RoutingSettings) -> DispatchSummary {
        let model = self.model.as_ref();
        let path = model.map(|m| m.path());
        DispatchSummary {
            controller: self.controller.to_string(),
            model: model.map(|m| m.model_type().to_string()),
            not_found: self.not_found,
            parent_pointer: model
                .and_then(|m| m.parent_pointer())
                .map(|p| p.to_string()),
            path: path
                .map(|p| {
                    p.nodes()
                        .iter()
                        .map(|n| PathEntry {
                            structure_id: n.structure_id,
                            id: n.id,
                            url: n.url.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            breadcrumbs: path
                .map(|p| p.breadcrumbs(&settings.start_url, &settings.url_suffix))
                .unwrap_or_default(),
            page_data: model.and_then(|m| m.page_data().cloned()),
        }
    }
}

/// Per-request orchestrator over a shared registry and storage
pub struct Router<'a> {
    registry: &'a StructureRegistry,
    storage: &'a dyn Storage,
    settings: RoutingSettings,
    hooks: HookBroker,
}

impl<'a> Router<'a> {
    pub fn new(registry: &'a StructureRegistry, storage: &'a dyn Storage) -> Self {
        Self {
            registry,
            storage,
            settings: RoutingSettings::default(),
            hooks: HookBroker::new(),
        }
    }

    pub fn with_settings(mut self, settings: RoutingSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_hooks(mut self, hooks: HookBroker) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn settings(&self) -> &RoutingSettings {
        &self.settings
    }

    /// Route one request to a model and controller
    pub fn route(&self, request: &Request) -> Result<Dispatch, RouteError> {
        if let Some(ajax) = &request.ajax {
            debug!(module = %ajax.module, controller = %ajax.controller, "AJAX request");
            return Ok(Dispatch {
                model: None,
                controller: ControllerName::Ajax {
                    module: ajax.module.clone(),
                    controller: ajax.controller.clone(),
                },
                not_found: false,
            });
        }

        let mut state = RouterState::new(request.clone());
        self.hooks.pre_dispatch(&mut state)?;
        if state.model.is_none() {
            state.model = Some(self.route_by_url(request)?);
        }
        self.hooks.post_dispatch(&mut state)?;

        let mut model = state.model.take().ok_or_else(|| {
            ConfigurationError::Invalid("a dispatch hook removed the resolved model".to_string())
        })?;
        // Expanded while the model is still typed by the table that holds its row; the
        // expanded row travels with the state into the retyped model.
        TemplateMaterializer::new(self.registry, self.storage)
            .with_max_depth(self.settings.max_template_depth)
            .init_page_data(&mut model)?;
        let mut model = ModelDispatcher::new(self.registry).dispatch(model)?;

        let controller = match state.controller.take() {
            Some(controller) => controller,
            None => self.controller_name(&mut model)?,
        };
        let not_found = model.is_not_found();
        if not_found {
            warn!(path = %request.path, controller = %controller, "Request not found");
        } else {
            info!(path = %request.path, controller = %controller, "Request routed");
        }
        Ok(Dispatch {
            model: Some(model),
            controller,
            not_found,
        })
    }

    /// Strip query, fragment and mount prefix, check suffix and trailing slash, and split
    pub fn parse_url(&self, raw: &str) -> ParsedUrl {
        let url = raw.split(['?', '#']).next().unwrap_or_default();
        let url = url.trim_start_matches('/');
        let mut malformed = false;

        let prefix = self.settings.start_url.trim_matches('/');
        let url = if prefix.is_empty() {
            url
        } else {
            match url.strip_prefix(prefix) {
                Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
                _ => {
                    malformed = true;
                    url
                }
            }
        };
        let mut url = url.trim_start_matches('/');
        if url.is_empty() {
            return ParsedUrl {
                segments: Vec::new(),
                malformed,
            };
        }

        let suffix = self.settings.url_suffix.as_str();
        if !suffix.is_empty() {
            match url.strip_suffix(suffix) {
                Some(stripped) => url = stripped,
                None => malformed = true,
            }
        }
        if url.ends_with('/') {
            url = url.trim_end_matches('/');
            malformed = true;
        }

        ParsedUrl {
            segments: url.split('/').map(str::to_string).collect(),
            malformed,
        }
    }

    /// Resolve the request path to a model; a malformed url marks it not found
    pub fn route_by_url(&self, request: &Request) -> Result<ContentModel, RouteError> {
        let parsed = self.parse_url(&request.path);
        let mut model = PathResolver::new(self.registry, self.storage)
            .resolve(request.context, &parsed.segments)?;
        if parsed.malformed && !model.is_not_found() {
            debug!(path = %request.path, "Url resolved but is malformed");
            model.mark_not_found();
        }
        Ok(model)
    }

    /// Controller serving the model's path leaf.
    ///
    /// The root url is served by the home structure; a leaf that declares no structure is
    /// served by the structure its parent declares. A model without a path falls back to the
    /// root node and is flagged not found.
    pub fn controller_name(&self, model: &mut ContentModel) -> Result<ControllerName, RouteError> {
        if model.path().is_empty() {
            if !model.is_not_found() {
                error!(model = %model.model_type(), "Could not build a path for the model");
                model.mark_not_found();
            }
            let root = Path::from_nodes(vec![self.registry.root_node()]);
            model.set_path(root, self.registry)?;
        }

        let path = model.path();
        let leaf = path
            .leaf()
            .ok_or_else(|| ConfigurationError::Invalid("empty path".to_string()))?;
        let structure = if leaf.url == ROOT_URL {
            self.registry.home_name().to_string()
        } else if let Some(declared) = &leaf.declared_structure {
            declared.clone()
        } else {
            path.second_to_last()
                .and_then(|prev| prev.declared_structure.clone())
                .ok_or_else(|| {
                    ConfigurationError::Invalid(format!(
                        "neither element {} nor its parent declares a structure",
                        leaf.id
                    ))
                })?
        };
        Ok(ControllerName::Structure {
            structure,
            context: model.context(),
        })
    }

    /// Element `id` of `structure` with its ancestry rebuilt from stored parent pointers
    pub fn locate(
        &self,
        structure: &str,
        id: ElementId,
        context: Context,
    ) -> Result<ContentModel, RouteError> {
        AncestryResolver::new(self.registry, self.storage)
            .with_max_depth(self.settings.max_ancestry_depth)
            .locate(structure, id, context)
    }

    /// Pager of the model's listing for the page named by `param` in the request
    pub fn pager(
        &self,
        model: &mut ContentModel,
        request: &Request,
        param: &str,
    ) -> Result<Option<Pager>, RouteError> {
        Ok(model.pager(
            self.storage,
            request.page_number(param),
            &request.query_without(param),
            param,
            self.settings.pager_window,
        )?)
    }
}
