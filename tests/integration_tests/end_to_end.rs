//! Full-stack resolution against mock APIs

use super::fixtures::{config_for, mount_cloud, mount_robot};
use hcloud_resolver::cloud::Cloud;
use hcloud_resolver::models::NetworkZone;
use hcloud_resolver::resolver::ResolveError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_resolves_from_both_sources() {
    let cloud_api = MockServer::start().await;
    let robot_api = MockServer::start().await;
    mount_cloud(&cloud_api).await;
    mount_robot(&robot_api).await;

    let cloud = Cloud::new(&config_for(&cloud_api, &robot_api)).await.unwrap();
    assert_eq!(cloud.refresh_inventory().await.unwrap(), 1);

    let resolver = cloud.resolver();

    let from_cloud = resolver.resolve_by_name("cloud-node").await.unwrap();
    assert_eq!(from_cloud.id, 1);
    assert_eq!(from_cloud.machine_type, "cpx11");

    let from_inventory = resolver.resolve_by_name("dedicated-node").await.unwrap();
    assert_eq!(from_inventory.id, 321);
    assert_eq!(from_inventory.zone, "hel1");
    assert_eq!(from_inventory.region, "hel1-dc2");
    assert_eq!(from_inventory.network_zone, Some(NetworkZone::EuCentral));

    let by_provider_id = resolver.resolve_by_provider_id("hcloud://321").await.unwrap();
    assert_eq!(by_provider_id.name, "dedicated-node");

    assert_eq!(
        resolver.resolve_by_id(404).await.unwrap_err(),
        ResolveError::InstanceNotFound
    );

    assert_eq!(cloud.current_zone().await.unwrap().region, "nbg1");
    cloud.shutdown().await;
}

#[tokio::test]
async fn test_inventory_outage_keeps_last_snapshot() {
    let cloud_api = MockServer::start().await;
    let robot_api = MockServer::start().await;
    mount_cloud(&cloud_api).await;
    mount_robot(&robot_api).await;

    let cloud = Cloud::new(&config_for(&cloud_api, &robot_api)).await.unwrap();
    cloud.refresh_inventory().await.unwrap();

    // Inventory starts failing
    robot_api.reset().await;
    Mock::given(method("GET"))
        .and(path("/server"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&robot_api)
        .await;

    assert!(cloud.refresh_inventory().await.is_err());

    let server = cloud.resolver().resolve_by_name("dedicated-node").await.unwrap();
    assert_eq!(server.id, 321);
    cloud.shutdown().await;
}

#[tokio::test]
async fn test_cloud_outage_is_not_deregistration() {
    let cloud_api = MockServer::start().await;
    let robot_api = MockServer::start().await;
    mount_cloud(&cloud_api).await;
    mount_robot(&robot_api).await;

    let cloud = Cloud::new(&config_for(&cloud_api, &robot_api)).await.unwrap();
    cloud.refresh_inventory().await.unwrap();

    cloud_api.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&cloud_api)
        .await;

    let err = cloud.resolver().resolve_by_name("dedicated-node").await.unwrap_err();
    assert!(matches!(err, ResolveError::Transport(_)));
    assert!(cloud.instance_exists_by_provider_id("hcloud://321").await.is_err());
    cloud.shutdown().await;
}
