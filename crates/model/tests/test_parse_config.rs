use hellogate_model::{Config, PluginInstanceName};

#[test]
fn test_parse_config() {
    let file = include_str!("test_parse_config/config.toml");
    let parse_result = toml::from_str::<Config>(file);
    let config = match parse_result {
        Ok(result) => {
            println!("{:#?}", result);
            result
        }
        Err(e) => {
            eprintln!("{}", e);
            if let Some(span) = e.span() {
                let bytes = file.as_bytes();
                let span_str = std::str::from_utf8(&bytes[span]).unwrap();
                eprintln!("{}", span_str);
            }
            panic!();
        }
    };
    assert_eq!(config.listen.port(), 18080);
    assert_eq!(config.plugins.len(), 2);
    assert_eq!(config.plugins[0].name(), &PluginInstanceName::Mono);
    assert!(config.plugins[0].spec.is_null());
    assert_eq!(config.plugins[1].name(), &PluginInstanceName::named("greeting"));
    assert_eq!(config.plugins[1].spec["message"], "test");
}

#[test]
fn test_default_config() {
    let config = toml::from_str::<Config>("").expect("empty config is valid");
    assert_eq!(config, Config::default());
    assert_eq!(config.listen, hellogate_model::constants::DEFAULT_LISTEN);
    assert_eq!(config.plugin_ids().count(), 0);
}
