use hellogate_kernel::{service::echo::echo_service, SharedService};
use hellogate_plugin::{BoxError, HgBody, PluginConfig, PluginInstanceId, PluginInstanceName, PluginRepository};
use hyper::{service::Service, Request};
use tower_layer::Layer;
use serde_json::json;

async fn x_plugin(service: &SharedService) -> Result<String, BoxError> {
    let req = Request::get("http://example.com/").body(HgBody::empty())?;
    let resp = service.call(req).await?;
    let value = resp.headers().get("x-plugin").ok_or("missing x-plugin header")?;
    Ok(value.to_str()?.to_string())
}

#[tokio::test]
async fn test_hot_update() -> Result<(), BoxError> {
    let _ = tracing_subscriber::fmt().try_init();
    let repo = PluginRepository::with_prelude();
    let id = PluginInstanceId::new("hello-world", PluginInstanceName::named("name"));
    repo.create_or_update_instance(PluginConfig::new(id.clone(), json!({ "message": "before" })))?;

    let chain = repo.access_chain([&id])?;
    let service = SharedService::new(chain.layer(echo_service()));
    assert_eq!(x_plugin(&service).await?, "before");

    repo.create_or_update_instance(PluginConfig::new(id.clone(), json!({ "message": "after" })))?;
    assert_eq!(x_plugin(&service).await?, "after");

    // an update that fails keeps the running config
    assert!(repo.create_or_update_instance(PluginConfig::new(id.clone(), json!({ "message": ["not", "a", "string"] }))).is_err());
    assert_eq!(x_plugin(&service).await?, "after");
    let snapshot = repo.instance_snapshot(&id).ok_or("instance exists")?;
    assert_eq!(snapshot.config.spec, json!({ "message": "after" }));

    repo.create_or_update_instance(PluginConfig::new(id.clone(), json!(null)))?;
    assert_eq!(x_plugin(&service).await?, "hello");
    Ok(())
}
