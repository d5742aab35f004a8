use std::{borrow::Cow, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which instance of a plugin a config describes.
///
/// A plugin code has at most one `mono` instance and any number of `named` ones.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PluginInstanceName {
    #[default]
    Mono,
    Named {
        name: String,
    },
}

impl PluginInstanceName {
    pub fn mono() -> Self {
        Self::Mono
    }
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }
}

/// Plugin code plus instance name, unique within a repository.
///
/// Printed as `<code>` for the mono instance and `<code>@<name>` for a named one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct PluginInstanceId {
    pub code: Cow<'static, str>,
    #[serde(flatten)]
    pub name: PluginInstanceName,
}

impl PluginInstanceId {
    pub fn new(code: impl Into<Cow<'static, str>>, name: PluginInstanceName) -> Self {
        Self { code: code.into(), name }
    }
}

impl fmt::Display for PluginInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            PluginInstanceName::Mono => f.write_str(&self.code),
            PluginInstanceName::Named { name } => write!(f, "{}@{name}", self.code),
        }
    }
}

/// Operator supplied configuration of one plugin instance.
///
/// `spec` is handed to the plugin factory as is, a missing `spec` is `null`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    #[serde(flatten)]
    pub id: PluginInstanceId,
    #[serde(default)]
    pub spec: Value,
}

impl PluginConfig {
    pub fn new(id: PluginInstanceId, spec: Value) -> Self {
        Self { id, spec }
    }
    pub fn code(&self) -> &str {
        &self.id.code
    }
    pub fn name(&self) -> &PluginInstanceName {
        &self.id.name
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PluginMetaData {
    pub authors: Option<Cow<'static, str>>,
    pub description: Option<Cow<'static, str>>,
    pub version: Option<Cow<'static, str>>,
    pub homepage: Option<Cow<'static, str>>,
    pub repository: Option<Cow<'static, str>>,
}

impl PluginMetaData {
    /// Authors, description, version, homepage and repository of a package, empty ones stay unset.
    #[doc(hidden)]
    pub fn from_package_fields(fields: [&'static str; 5]) -> Self {
        let [authors, description, version, homepage, repository] = fields.map(|field| (!field.is_empty()).then_some(Cow::Borrowed(field)));
        Self {
            authors,
            description,
            version,
            homepage,
            repository,
        }
    }
}

/// Metadata of the calling package, with some fields overridden.
///
/// ```
/// let meta = hellogate_model::plugin_meta!(description = "says hello");
/// assert_eq!(meta.description.as_deref(), Some("says hello"));
/// ```
#[macro_export]
macro_rules! plugin_meta {
    ($($field:ident = $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut meta = $crate::PluginMetaData::from_package_fields([
            env!("CARGO_PKG_AUTHORS"),
            env!("CARGO_PKG_DESCRIPTION"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_HOMEPAGE"),
            env!("CARGO_PKG_REPOSITORY"),
        ]);
        $(meta.$field = Some($value.into());)*
        meta
    }};
}

/// What a host knows about a registered plugin: the descriptor without its factory.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PluginAttributes {
    pub meta: PluginMetaData,
    pub code: Cow<'static, str>,
    /// plugin version, declared by the plugin itself
    pub version: Cow<'static, str>,
    /// plugins with a higher priority run first
    pub priority: i32,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_id() {
        assert_eq!(PluginInstanceId::new("hello-world", PluginInstanceName::mono()).to_string(), "hello-world");
        assert_eq!(PluginInstanceId::new("hello-world", PluginInstanceName::named("greeting")).to_string(), "hello-world@greeting");
    }

    #[test]
    fn test_dec() {
        let cfg = PluginConfig::deserialize(json!({ "code": "hello-world", "kind": "mono" })).unwrap();
        assert_eq!(cfg.code(), "hello-world");
        assert_eq!(cfg.name(), &PluginInstanceName::Mono);
        assert!(cfg.spec.is_null());

        let cfg = PluginConfig::deserialize(json!({
            "code": "hello-world",
            "kind": "named",
            "name": "greeting",
            "spec": { "message": "test" }
        }))
        .unwrap();
        assert_eq!(cfg.name(), &PluginInstanceName::named("greeting"));
        assert_eq!(cfg.spec, json!({ "message": "test" }));

        assert!(PluginConfig::deserialize(json!({ "code": "hello-world", "kind": "anon", "uid": "0" })).is_err());
        assert!(PluginConfig::deserialize(json!({ "code": "hello-world", "kind": "named" })).is_err());
    }

    #[test]
    fn test_meta_macro() {
        let meta = crate::plugin_meta!(description = "says hello", version = "0.2");
        assert_eq!(meta.description.as_deref(), Some("says hello"));
        assert_eq!(meta.version.as_deref(), Some("0.2"));
        assert_eq!(meta.authors.as_deref(), Some(env!("CARGO_PKG_AUTHORS")));

        let empty = PluginMetaData::from_package_fields(["", "", "1.0", "", ""]);
        assert_eq!(empty, PluginMetaData { version: Some("1.0".into()), ..Default::default() });
    }
}
