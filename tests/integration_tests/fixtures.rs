//! Mock API fixtures shared by the end-to-end tests

use hcloud_resolver::config::{
    Config, HCLOUD_ENDPOINT_ENV, HCLOUD_TOKEN_ENV, HROBOT_ENDPOINT_ENV, HROBOT_PASS_ENV,
    HROBOT_USER_ENV, NODE_NAME_ENV,
};
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing both clients at mock servers
pub fn config_for(cloud: &MockServer, robot: &MockServer) -> Config {
    let env = HashMap::from([
        (HCLOUD_TOKEN_ENV, "x".repeat(64)),
        (HCLOUD_ENDPOINT_ENV, cloud.uri()),
        (NODE_NAME_ENV, "cloud-node".to_string()),
        (HROBOT_USER_ENV, "robot".to_string()),
        (HROBOT_PASS_ENV, "secret".to_string()),
        (HROBOT_ENDPOINT_ENV, robot.uri()),
    ]);
    Config::from_lookup(|key| env.get(key).cloned()).unwrap()
}

pub fn cloud_server_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "status": "running",
        "public_net": { "ipv4": { "ip": "203.0.113.20" } },
        "server_type": { "name": "cpx11" },
        "datacenter": {
            "name": "nbg1-dc3",
            "location": { "name": "nbg1", "network_zone": "eu-central" }
        }
    })
}

/// Cloud API that knows exactly one server, `cloud-node` with ID 1
pub async fn mount_cloud(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/servers"))
        .and(query_param("name", "cloud-node"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [cloud_server_json(1, "cloud-node")]
        })))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/servers/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "server": cloud_server_json(1, "cloud-node") })),
        )
        .with_priority(1)
        .mount(server)
        .await;

    // Listing during startup, and every other name lookup
    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "servers": [] })))
        .with_priority(5)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/servers/\d+$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "not_found", "message": "server not found" }
        })))
        .with_priority(5)
        .mount(server)
        .await;
}

/// Inventory API with one dedicated server, `dedicated-node` with ID 321
pub async fn mount_robot(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "server": {
                "server_ip": "198.51.100.30", "server_number": 321,
                "server_name": "dedicated-node", "product": "AX41-NVMe",
                "dc": "HEL1-DC2"
            }}
        ])))
        .mount(server)
        .await;
}
