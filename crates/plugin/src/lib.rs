#![deny(clippy::unwrap_used, clippy::dbg_macro)]
//! Plugin api of hellogate: the [`Plugin`] trait, the [`PluginRepository`] holding
//! plugin kinds and configured instances, and the built-in [`plugins`].
use std::{
    any::Any,
    borrow::Cow,
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

pub use hellogate_kernel::{BoxError, BoxResult, HgBody, HgRequest, HgResponse};
pub use hellogate_model;
pub use hellogate_model::{plugin_meta, PluginAttributes, PluginConfig, PluginInstanceId, PluginInstanceName, PluginMetaData};
#[cfg(feature = "schema")]
pub use schemars;
pub use serde_json;
pub use serde_json::Value as JsonValue;

use instance::{PluginInstance, PluginInstanceSnapshot};
use layer::{BoxAccessFn, PluginFunction};
use serde::{Deserialize, Serialize};

pub mod exchange;
pub mod instance;
pub mod layer;
pub mod plugins;
pub mod test_env;

pub use exchange::{Exchange, ResponseHeaderWriter};
pub use layer::{AccessChain, AccessService};

/// A kind of plugin the gateway can run on the access phase.
///
/// One value is built per configured instance by [`create`](Plugin::create), then shared
/// by all requests, so [`access`](Plugin::access) takes `&self` and must not block.
///
/// ```rust
/// # use hellogate_plugin::{BoxError, Exchange, Plugin, PluginConfig, ResponseHeaderWriter};
/// /// Copies the request id back onto the response.
/// struct RequestIdEcho;
///
/// impl Plugin for RequestIdEcho {
///     const CODE: &'static str = "request-id-echo";
///     const VERSION: &'static str = "0.1";
///     const PRIORITY: i32 = 10;
///
///     fn create(_: PluginConfig) -> Result<Self, BoxError> {
///         Ok(RequestIdEcho)
///     }
///
///     fn access(&self, exchange: &mut dyn Exchange) {
///         let id = exchange.request_headers().get("x-request-id").and_then(|v| v.to_str().ok()).map(str::to_owned);
///         if let Some(id) = id {
///             exchange.set_header("x-request-id", &id);
///         }
///     }
/// }
/// ```
pub trait Plugin: Any + Sized + Send + Sync {
    /// Unique within a repository, kebab-case by convention.
    const CODE: &'static str;
    const VERSION: &'static str;
    /// Higher runs first.
    const PRIORITY: i32;

    fn create(config: PluginConfig) -> Result<Self, BoxError>;

    fn access(&self, exchange: &mut dyn Exchange);

    fn create_by_spec(spec: JsonValue, name: PluginInstanceName) -> Result<Self, BoxError> {
        Self::create(PluginConfig::new(PluginInstanceId::new(Self::CODE, name), spec))
    }

    fn meta() -> PluginMetaData {
        PluginMetaData::default()
    }

    fn register(repo: &PluginRepository) {
        repo.register_descriptor(PluginDescriptor::from_trait::<Self>())
    }

    /// Json schema of the plugin spec, if the plugin publishes one.
    #[cfg(feature = "schema")]
    fn schema_opt() -> Option<schemars::schema::RootSchema> {
        None
    }
}

/// A registered kind of plugin: how to order it, and how to build its access function from a config.
pub struct PluginDescriptor {
    pub code: Cow<'static, str>,
    pub version: Cow<'static, str>,
    pub priority: i32,
    pub meta: PluginMetaData,
    #[cfg(feature = "schema")]
    pub schema: Option<schemars::schema::RootSchema>,
    pub make_af: Box<MakeAfMethod>,
}

pub type MakeAfMethod = dyn Fn(PluginConfig) -> Result<BoxAccessFn, BoxError> + Send + Sync + 'static;

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("PluginDescriptor");
        out.field("code", &self.code).field("version", &self.version).field("priority", &self.priority);
        #[cfg(feature = "schema")]
        out.field("has_schema", &self.schema.is_some());
        out.finish_non_exhaustive()
    }
}

/// A descriptor as printed by `hellogate --dump`.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct PluginInfo {
    pub code: Cow<'static, str>,
    pub version: Cow<'static, str>,
    pub priority: i32,
    pub meta: PluginMetaData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<JsonValue>,
}

impl PluginDescriptor {
    /// A descriptor for a plugin kind that doesn't implement [`Plugin`].
    pub fn new<F>(code: impl Into<Cow<'static, str>>, version: impl Into<Cow<'static, str>>, priority: i32, make_af: F) -> Self
    where
        F: Fn(PluginConfig) -> Result<BoxAccessFn, BoxError> + Send + Sync + 'static,
    {
        Self {
            code: code.into(),
            version: version.into(),
            priority,
            meta: PluginMetaData::default(),
            #[cfg(feature = "schema")]
            schema: None,
            make_af: Box::new(make_af),
        }
    }

    pub fn from_trait<P: Plugin>() -> Self {
        #[cfg_attr(not(feature = "schema"), allow(unused_mut))]
        let mut descriptor = Self::new(P::CODE, P::VERSION, P::PRIORITY, |config| {
            let plugin = P::create(config)?;
            Ok(Box::new(move |exchange: &mut dyn Exchange| plugin.access(exchange)) as BoxAccessFn)
        })
        .with_meta(P::meta());
        #[cfg(feature = "schema")]
        {
            descriptor.schema = P::schema_opt();
        }
        descriptor
    }

    #[must_use]
    pub fn with_meta(mut self, meta: PluginMetaData) -> Self {
        self.meta = meta;
        self
    }

    pub fn attr(&self) -> PluginAttributes {
        let PluginInfo { code, version, priority, meta, .. } = self.info();
        PluginAttributes { meta, code, version, priority }
    }

    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            code: self.code.clone(),
            version: self.version.clone(),
            priority: self.priority,
            meta: self.meta.clone(),
            schema: self.schema_json(),
        }
    }

    #[cfg(feature = "schema")]
    fn schema_json(&self) -> Option<JsonValue> {
        self.schema.as_ref().and_then(|schema| serde_json::to_value(schema).ok())
    }

    #[cfg(not(feature = "schema"))]
    fn schema_json(&self) -> Option<JsonValue> {
        None
    }

    pub(crate) fn make_af(&self, config: PluginConfig) -> Result<BoxAccessFn, BoxError> {
        (self.make_af)(config)
    }
}

/// Plugin kinds by code, and the configured instances built from them.
///
/// Hosts own a repository and pass it around. Clones share the same content.
#[derive(Default, Clone)]
pub struct PluginRepository {
    plugins: Arc<RwLock<HashMap<String, PluginDescriptor>>>,
    instances: Arc<RwLock<HashMap<PluginInstanceId, PluginInstance>>>,
}

impl fmt::Debug for PluginRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRepository")
            .field("plugins", &self.plugins().keys().collect::<Vec<_>>())
            .field("instances", &self.instances().keys().collect::<Vec<_>>())
            .finish()
    }
}

fn missing_instance(id: &PluginInstanceId) -> BoxError {
    format!("[Hg.Plugin] missing instance {id}").into()
}

impl PluginRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository where every built-in plugin is registered.
    pub fn with_prelude() -> Self {
        let repo = Self::new();
        repo.register_prelude();
        repo
    }

    /// Register the built-in plugins enabled by cargo features.
    pub fn register_prelude(&self) {
        #[cfg(feature = "hello-world")]
        self.register::<plugins::hello_world::HelloWorldPlugin>();
    }

    pub fn register<P: Plugin>(&self) {
        P::register(self)
    }

    /// Replaces any descriptor with the same code.
    pub fn register_descriptor(&self, descriptor: impl Into<PluginDescriptor>) {
        let descriptor: PluginDescriptor = descriptor.into();
        tracing::debug!(code = %descriptor.code, version = %descriptor.version, priority = descriptor.priority, "[Hg.Plugin] register plugin");
        self.plugins_mut().insert(descriptor.code.to_string(), descriptor);
    }

    /// Create an instance, or rebuild the function of an existing one.
    ///
    /// A rebuilt function replaces the old one in every chain that already runs it.
    /// On error nothing changes.
    ///
    /// # Errors
    /// The code is not registered, or the plugin rejects the config.
    pub fn create_or_update_instance(&self, config: PluginConfig) -> Result<(), BoxError> {
        let plugins = self.plugins();
        let descriptor = plugins.get(config.code()).ok_or_else(|| format!("[Hg.Plugin] unregistered plugin type {}", config.code()))?;
        let function = descriptor.make_af(config.clone())?;
        let mut instances = self.instances_mut();
        match instances.get_mut(&config.id) {
            Some(instance) => {
                instance.plugin_function.swap(function);
                instance.priority = descriptor.priority;
                tracing::debug!(id = %config.id, "[Hg.Plugin] instance updated");
                instance.config = config;
            }
            None => {
                tracing::debug!(id = %config.id, "[Hg.Plugin] instance created");
                let id = config.id.clone();
                instances.insert(
                    id,
                    PluginInstance {
                        priority: descriptor.priority,
                        config,
                        plugin_function: PluginFunction::new(function),
                    },
                );
            }
        }
        Ok(())
    }

    /// Remove an instance and give back its config.
    ///
    /// # Errors
    /// No such instance.
    pub fn remove_instance(&self, id: &PluginInstanceId) -> Result<PluginConfig, BoxError> {
        let instance = self.instances_mut().remove(id).ok_or_else(|| missing_instance(id))?;
        tracing::debug!(%id, "[Hg.Plugin] instance removed");
        Ok(instance.config)
    }

    /// Chain the given instances, higher priority first.
    ///
    /// Equal priorities are ordered by plugin code, then keep the given order.
    ///
    /// # Errors
    /// Some instance doesn't exist.
    pub fn access_chain<'a>(&self, ids: impl IntoIterator<Item = &'a PluginInstanceId>) -> Result<AccessChain, BoxError> {
        let instances = self.instances();
        let mut entries = ids
            .into_iter()
            .map(|id| {
                let instance = instances.get(id).ok_or_else(|| missing_instance(id))?;
                Ok::<_, BoxError>((instance.priority, id.clone(), instance.plugin_function.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by(|(p_a, id_a, _), (p_b, id_b, _)| p_b.cmp(p_a).then_with(|| id_a.code.cmp(&id_b.code)));
        Ok(AccessChain::new(entries.into_iter().map(|(_, id, function)| (id, function))))
    }

    /// A chain of one instance.
    ///
    /// # Errors
    /// No such instance.
    pub fn make_layer(&self, id: &PluginInstanceId) -> Result<AccessChain, BoxError> {
        self.instances().get(id).map(PluginInstance::chain).ok_or_else(|| missing_instance(id))
    }

    pub fn instance_snapshot(&self, id: &PluginInstanceId) -> Option<PluginInstanceSnapshot> {
        self.instances().get(id).map(PluginInstance::snapshot)
    }

    pub fn plugin_list(&self) -> Vec<PluginAttributes> {
        self.plugins().values().map(PluginDescriptor::attr).collect()
    }

    /// Every registered plugin, higher priority first, then by code.
    pub fn dump(&self) -> Vec<PluginInfo> {
        let mut infos = self.plugins().values().map(PluginDescriptor::info).collect::<Vec<_>>();
        infos.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.code.cmp(&b.code)));
        infos
    }

    fn plugins(&self) -> RwLockReadGuard<'_, HashMap<String, PluginDescriptor>> {
        self.plugins.read().expect("plugin table poisoned")
    }

    fn plugins_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, PluginDescriptor>> {
        self.plugins.write().expect("plugin table poisoned")
    }

    fn instances(&self) -> RwLockReadGuard<'_, HashMap<PluginInstanceId, PluginInstance>> {
        self.instances.read().expect("instance table poisoned")
    }

    fn instances_mut(&self) -> RwLockWriteGuard<'_, HashMap<PluginInstanceId, PluginInstance>> {
        self.instances.write().expect("instance table poisoned")
    }
}
