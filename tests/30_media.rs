mod common;

use anyhow::Result;
use serde_json::json;
use uuid::Uuid;

// Media lifecycle: encrypted source link, the verified-channel gate on
// reactivation, and explicit append/replace association patches.

async fn create_verified_channel(
    server: &common::TestServer,
    client: &reqwest::Client,
    owner: &str,
    admin: &str,
) -> Result<String> {
    let created = client
        .post(format!("{}/channel/data", server.base_url))
        .header("Authorization", owner)
        .json(&json!({ "name": format!("Media Channel {}", Uuid::new_v4().simple()) }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    let id = created["payload"]["id"].as_str().unwrap().to_string();

    let verified = client
        .put(format!("{}/channel/verify/{}", server.base_url, id))
        .header("Authorization", admin)
        .json(&json!({ "verify": "yes" }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    anyhow::ensure!(verified["payload"]["isVerified"] == true, "verify failed: {}", verified);

    Ok(id)
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn created_media_round_trips_its_source_link() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let owner = common::bearer("media-user-1", "tenant-media", "publisher");

    let created = client
        .post(format!("{}/media", server.base_url))
        .header("Authorization", &owner)
        .json(&json!({
            "name": "Sunday Service",
            "prettyName": format!("sunday-service-{}", Uuid::new_v4().simple()),
            "sourceLink": "https://cdn.example.com/sermons/sunday.mp4",
            "views": "0"
        }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;

    assert_eq!(created["status"], "SUCCESS");
    // the envelope carries plaintext; at rest the column is ciphertext
    assert_eq!(
        created["payload"]["secretSourceLink"],
        "https://cdn.example.com/sermons/sunday.mp4"
    );
    assert_eq!(created["payload"]["isActive"], false);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn unsuspend_requires_a_verified_channel() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let owner = common::bearer("media-user-2", "tenant-media", "publisher");
    let admin = common::bearer("media-admin", "tenant-media", "admin");

    // channel starts unverified
    let channel = client
        .post(format!("{}/channel/data", server.base_url))
        .header("Authorization", &owner)
        .json(&json!({ "name": format!("Unverified {}", Uuid::new_v4().simple()) }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    let channel_id = channel["payload"]["id"].as_str().unwrap().to_string();

    let media = client
        .post(format!("{}/media", server.base_url))
        .header("Authorization", &owner)
        .json(&json!({
            "name": "Gated Sermon",
            "prettyName": format!("gated-{}", Uuid::new_v4().simple()),
            "mediaChannel": channel_id
        }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    let media_id = media["payload"]["id"].as_str().unwrap().to_string();

    let blocked = client
        .put(format!("{}/media/unsuspend/{}", server.base_url, media_id))
        .header("Authorization", &owner)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(blocked["status"], "FAILED_VALIDATION");
    assert_eq!(blocked["payload"]["err"], "Channel Unverified");

    // isActive must be unchanged
    let fetched = client
        .get(format!("{}/media/{}", server.base_url, media_id))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(fetched["payload"]["isActive"], false);

    // once the channel is verified, reactivation goes through
    client
        .put(format!("{}/channel/verify/{}", server.base_url, channel_id))
        .header("Authorization", &admin)
        .json(&json!({ "verify": "yes" }))
        .send()
        .await?;

    let allowed = client
        .put(format!("{}/media/unsuspend/{}", server.base_url, media_id))
        .header("Authorization", &owner)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(allowed["status"], "SUCCESS");
    assert_eq!(allowed["payload"]["isActive"], true);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn association_patches_append_and_replace() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let owner = common::bearer("media-user-3", "tenant-media", "publisher");
    let admin = common::bearer("media-admin", "tenant-media", "admin");

    let channel_id = create_verified_channel(server, &client, &owner, &admin).await?;

    let media = client
        .post(format!("{}/media", server.base_url))
        .header("Authorization", &owner)
        .json(&json!({
            "name": "Patchable",
            "prettyName": format!("patchable-{}", Uuid::new_v4().simple()),
            "mediaChannel": channel_id,
            "thumbnailLink": ["thumb-1.png"]
        }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    let media_id = media["payload"]["id"].as_str().unwrap().to_string();

    // append keeps the existing value
    let appended = client
        .put(format!("{}/media/{}", server.base_url, media_id))
        .header("Authorization", &owner)
        .json(&json!({ "thumbnailLink": { "append": "thumb-2.png" } }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(appended["payload"]["thumbnailLink"], json!(["thumb-1.png", "thumb-2.png"]));

    // replace swaps the whole set
    let replaced = client
        .put(format!("{}/media/{}", server.base_url, media_id))
        .header("Authorization", &owner)
        .json(&json!({ "thumbnailLink": { "replace": ["thumb-3.png"] } }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(replaced["payload"]["thumbnailLink"], json!(["thumb-3.png"]));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn search_without_filter_is_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/media/search/result", server.base_url))
        .json(&json!({}))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;

    assert_eq!(res["status"], "NOT_FOUND");

    Ok(())
}
