mod common;

use anyhow::Result;
use serde_json::json;
use uuid::Uuid;

// Tag and minister catalogs: required fields, enum domains, and the
// hash-based name uniqueness over encrypted plaintext.

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn tag_requires_name_and_valid_core_type() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let auth = common::bearer("tag-user", "tenant-cat", "publisher");

    let res = client
        .post(format!("{}/media/data/tag", server.base_url))
        .header("Authorization", &auth)
        .json(&json!({ "coreType": "podcast" }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;

    assert_eq!(res["status"], "FAILED_VALIDATION");
    let errors = res["payload"].as_array().cloned().unwrap_or_default();
    assert!(errors.iter().any(|e| e["property"] == "name"), "missing name error: {:?}", errors);
    assert!(
        errors.iter().any(|e| e["property"] == "coreType"
            && e["constraints"]["isEnum"]
                == "Core Type should only contain music, sermon or music-sermon"),
        "missing coreType enum error: {:?}",
        errors
    );

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn tag_name_uniqueness_is_enforced_through_the_hash() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let auth = common::bearer("tag-user", "tenant-cat", "publisher");
    let name = format!("Worship {}", Uuid::new_v4().simple());

    let first = client
        .post(format!("{}/media/data/tag", server.base_url))
        .header("Authorization", &auth)
        .json(&json!({
            "name": name,
            "prettyName": format!("worship-{}", Uuid::new_v4().simple()),
            "coreType": "music"
        }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(first["status"], "SUCCESS");
    // plaintext comes back decrypted, the hash is what the store indexes
    assert_eq!(first["payload"]["secretName"], name.as_str());
    assert!(first["payload"]["nameHash"].as_str().is_some());

    let second = client
        .post(format!("{}/media/data/tag", server.base_url))
        .header("Authorization", &auth)
        .json(&json!({
            "name": name,
            "prettyName": format!("worship-{}", Uuid::new_v4().simple()),
            "coreType": "music"
        }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(second["status"], "FAILED_VALIDATION");
    let errors = second["payload"].as_array().cloned().unwrap_or_default();
    assert!(errors.iter().any(|e| e["property"] == "name"), "expected duplicate: {:?}", errors);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn minister_office_is_validated_when_present() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let auth = common::bearer("min-user", "tenant-cat", "publisher");

    let rejected = client
        .post(format!("{}/minister", server.base_url))
        .header("Authorization", &auth)
        .json(&json!({
            "name": format!("Rev {}", Uuid::new_v4().simple()),
            "coreType": "sermon",
            "office": "bishop"
        }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(rejected["status"], "FAILED_VALIDATION");

    let accepted = client
        .post(format!("{}/minister", server.base_url))
        .header("Authorization", &auth)
        .json(&json!({
            "name": format!("Rev {}", Uuid::new_v4().simple()),
            "prettyName": format!("rev-{}", Uuid::new_v4().simple()),
            "coreType": "sermon",
            "office": "pastor"
        }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(accepted["status"], "SUCCESS");
    assert_eq!(accepted["payload"]["office"], "pastor");

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn tag_feature_toggle_sets_and_clears_the_timestamp() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let auth = common::bearer("tag-user", "tenant-cat", "publisher");

    let created = client
        .post(format!("{}/media/data/tag", server.base_url))
        .header("Authorization", &auth)
        .json(&json!({
            "name": format!("Featured {}", Uuid::new_v4().simple()),
            "prettyName": format!("featured-{}", Uuid::new_v4().simple()),
            "coreType": "sermon"
        }))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    let id = created["payload"]["id"].as_str().unwrap().to_string();

    let featured = client
        .put(format!("{}/media/data/tag/feature/{}", server.base_url, id))
        .header("Authorization", &auth)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(featured["payload"]["featured"], true);
    assert!(featured["payload"]["featuredAt"].as_str().is_some());

    let unfeatured = client
        .put(format!("{}/media/data/tag/unfeature/{}", server.base_url, id))
        .header("Authorization", &auth)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(unfeatured["payload"]["featured"], false);
    assert!(unfeatured["payload"]["featuredAt"].is_null());

    Ok(())
}
