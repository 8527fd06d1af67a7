mod common;

use anyhow::Result;
use serde_json::json;
use uuid::Uuid;

// Subscription idempotence and counter behavior.

async fn create_channel(
    server: &common::TestServer,
    client: &reqwest::Client,
    auth: &str,
) -> Result<String> {
    let created = client
        .post(format!("{}/channel/data", server.base_url))
        .header("Authorization", auth)
        .json(&json!({ "name": format!("Channel {}", Uuid::new_v4().simple()) }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    anyhow::ensure!(created["status"] == "SUCCESS", "channel create failed: {}", created);
    Ok(created["payload"]["id"].as_str().unwrap().to_string())
}

async fn subscriber_count(
    server: &common::TestServer,
    client: &reqwest::Client,
    id: &str,
) -> Result<String> {
    let doc = client
        .get(format!("{}/channel/data/{}", server.base_url, id))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    Ok(doc["payload"]["subscribers"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn subscribe_unsubscribe_round_trip_restores_the_counter() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let owner = common::bearer("owner-1", "tenant-sub", "publisher");
    let listener = common::bearer("listener-1", "tenant-sub", "listener");

    let channel_id = create_channel(server, &client, &owner).await?;
    assert_eq!(subscriber_count(server, &client, &channel_id).await?, "0");

    let sub = client
        .put(format!("{}/channel/user/subscription/{}", server.base_url, channel_id))
        .header("Authorization", &listener)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(sub["status"], "SUCCESS");
    assert_eq!(sub["payload"]["subscribed"], true);
    assert_eq!(subscriber_count(server, &client, &channel_id).await?, "1");

    // subscribing again must not create a second document or double count
    let again = client
        .put(format!("{}/channel/user/subscription/{}", server.base_url, channel_id))
        .header("Authorization", &listener)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(again["status"], "SUCCESS");
    assert_eq!(subscriber_count(server, &client, &channel_id).await?, "1");

    let unsub = client
        .put(format!("{}/channel/user/unsubscription/{}", server.base_url, channel_id))
        .header("Authorization", &listener)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(unsub["status"], "SUCCESS");
    assert_eq!(unsub["payload"]["subscribed"], false);
    assert_eq!(unsub["payload"]["notifyMe"], false);
    assert_eq!(subscriber_count(server, &client, &channel_id).await?, "0");

    // exactly one subscription document for the (user, channel) pair
    let one = client
        .get(format!("{}/channel/user/onesubscription/{}", server.base_url, channel_id))
        .header("Authorization", &listener)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(one["status"], "SUCCESS");
    assert!(one["payload"].is_object(), "expected a single document: {}", one);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn notify_implies_subscribed_and_unnotify_only_clears_the_flag() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let owner = common::bearer("owner-2", "tenant-sub", "publisher");
    let listener = common::bearer("listener-2", "tenant-sub", "listener");

    let channel_id = create_channel(server, &client, &owner).await?;

    let notified = client
        .put(format!("{}/channel/user/notify/{}", server.base_url, channel_id))
        .header("Authorization", &listener)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(notified["status"], "SUCCESS");
    assert_eq!(notified["payload"]["subscribed"], true);
    assert_eq!(notified["payload"]["notifyMe"], true);

    let unnotified = client
        .put(format!("{}/channel/user/unnotify/{}", server.base_url, channel_id))
        .header("Authorization", &listener)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(unnotified["status"], "SUCCESS");
    assert_eq!(unnotified["payload"]["subscribed"], true);
    assert_eq!(unnotified["payload"]["notifyMe"], false);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn subscribing_to_a_missing_channel_is_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let listener = common::bearer("listener-3", "tenant-sub", "listener");

    let res = client
        .put(format!("{}/channel/user/subscription/{}", server.base_url, Uuid::new_v4()))
        .header("Authorization", &listener)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;

    assert_eq!(res["status"], "NOT_FOUND");
    assert_eq!(res["payload"]["msg"], "Channel Not Found");

    Ok(())
}
