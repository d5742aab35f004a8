use serde::{Deserialize, Serialize};

use crate::{exchange::ResponseHeaderWriter, BoxError, Exchange, Plugin, PluginConfig};

/// Response header written on every request.
pub const X_PLUGIN: &str = "x-plugin";
/// Header value used when no message is configured.
pub const DEFAULT_MESSAGE: &str = "hello";

/// A "hello world" plugin: on the access phase, sets the `x-plugin` response header
/// to the configured message, or to `hello` when the message is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct HelloWorldPlugin {
    /// Value of the `x-plugin` response header. Empty or missing means `hello`.
    #[serde(alias = "Message")]
    pub message: Option<String>,
}

impl HelloWorldPlugin {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()) }
    }

    /// The header value, never empty. The message is used verbatim, no trimming.
    pub fn resolved_message(&self) -> &str {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message,
            _ => DEFAULT_MESSAGE,
        }
    }

    pub fn apply<W: ResponseHeaderWriter + ?Sized>(&self, writer: &mut W) {
        writer.set_header(X_PLUGIN, self.resolved_message());
    }
}

impl Plugin for HelloWorldPlugin {
    const CODE: &'static str = "hello-world";
    const VERSION: &'static str = "0.2";
    const PRIORITY: i32 = 5000;

    fn meta() -> crate::PluginMetaData {
        crate::plugin_meta!(
            description = "Sets the x-plugin response header to a configured message or hello",
            version = Self::VERSION,
        )
    }

    fn access(&self, exchange: &mut dyn Exchange) {
        self.apply(exchange);
    }

    fn create(config: PluginConfig) -> Result<Self, BoxError> {
        if config.spec.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(config.spec)?)
    }

    #[cfg(feature = "schema")]
    fn schema_opt() -> Option<schemars::schema::RootSchema> {
        Some(schemars::schema_for!(HelloWorldPlugin))
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::PluginInstanceName;

    /// Records every header write, nothing else.
    #[derive(Debug, Default)]
    struct RecordingWriter {
        writes: Vec<(String, String)>,
    }

    impl ResponseHeaderWriter for RecordingWriter {
        fn set_header(&mut self, name: &str, value: &str) {
            self.writes.push((name.to_string(), value.to_string()));
        }
    }

    fn written(plugin: &HelloWorldPlugin) -> Vec<(String, String)> {
        let mut writer = RecordingWriter::default();
        plugin.apply(&mut writer);
        writer.writes
    }

    #[test]
    fn test_default_message() {
        assert_eq!(written(&HelloWorldPlugin::default()), vec![("x-plugin".to_string(), "hello".to_string())]);
        assert_eq!(written(&HelloWorldPlugin::new("")), vec![("x-plugin".to_string(), "hello".to_string())]);
    }

    #[test]
    fn test_configured_message_verbatim() {
        for message in ["test", "  ", "Hello, World", " padded ", "ünïcödé"] {
            assert_eq!(written(&HelloWorldPlugin::new(message)), vec![("x-plugin".to_string(), message.to_string())]);
        }
    }

    #[test]
    fn test_create() {
        let plugin = HelloWorldPlugin::create_by_spec(json!(null), PluginInstanceName::mono()).expect("null spec");
        assert_eq!(plugin.resolved_message(), "hello");
        let plugin = HelloWorldPlugin::create_by_spec(json!({}), PluginInstanceName::mono()).expect("empty spec");
        assert_eq!(plugin.resolved_message(), "hello");
        let plugin = HelloWorldPlugin::create_by_spec(json!({ "message": null }), PluginInstanceName::mono()).expect("null message");
        assert_eq!(plugin.resolved_message(), "hello");
        let plugin = HelloWorldPlugin::create_by_spec(json!({ "message": "test" }), PluginInstanceName::mono()).expect("message");
        assert_eq!(plugin.resolved_message(), "test");
        let plugin = HelloWorldPlugin::create_by_spec(json!({ "Message": "aliased", "unknown": 1 }), PluginInstanceName::mono()).expect("alias");
        assert_eq!(plugin.resolved_message(), "aliased");
        assert!(HelloWorldPlugin::create_by_spec(json!({ "message": 1 }), PluginInstanceName::mono()).is_err());
        assert!(HelloWorldPlugin::create_by_spec(json!("test"), PluginInstanceName::mono()).is_err());
    }
}
