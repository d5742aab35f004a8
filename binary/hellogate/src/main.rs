use std::path::Path;

use clap::Parser;
use hellogate_kernel::{listener::HgListen, service::echo::echo_service, BoxError, CancellationToken, SharedService};
use hellogate_model::Config;
use hellogate_plugin::PluginRepository;
use tower_layer::Layer;
mod args;

fn load_config(path: &Path) -> Result<Config, BoxError> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("fail to read config file {}: {e}", path.display()))?;
    let config = toml::from_str::<Config>(&text)?;
    Ok(config)
}

async fn serve(repo: PluginRepository, config: Config) -> Result<(), BoxError> {
    for plugin in &config.plugins {
        repo.create_or_update_instance(plugin.clone())?;
    }
    let chain = repo.access_chain(config.plugin_ids())?;
    tracing::info!(plugins = ?chain.ids().map(ToString::to_string).collect::<Vec<_>>(), "access chain ready");
    let service = SharedService::new(chain.layer(echo_service()));

    let cancel_token = CancellationToken::new();
    let listen = HgListen::new(config.listen, service, cancel_token.clone());
    let mut listen_task = tokio::spawn(listen.listen());
    tokio::select! {
        result = &mut listen_task => return result?,
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("received ctrl-c, shutting down");
            cancel_token.cancel();
        }
    }
    listen_task.await?
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let args = args::Args::parse();
    let repo = PluginRepository::with_prelude();
    if args.dump {
        println!("{}", serde_json::to_string_pretty(&repo.dump())?);
        return Ok(());
    }
    let Some(config_path) = args.config else {
        return Err("missing config file, use -c <config.toml>".into());
    };
    let config = load_config(&config_path)?;
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().thread_name(env!("CARGO_PKG_NAME")).build()?;
    rt.block_on(serve(repo, config))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_sample_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.listen.port(), 9080);
        assert_eq!(config.plugins.len(), 1);

        let repo = PluginRepository::with_prelude();
        for plugin in &config.plugins {
            repo.create_or_update_instance(plugin.clone()).unwrap();
        }
        let chain = repo.access_chain(config.plugin_ids()).unwrap();
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_missing_config() {
        assert!(load_config(Path::new("no/such/config.toml")).is_err());
    }
}
