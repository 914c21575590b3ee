mod common;

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn dataset_form(name: &str) -> Form {
    Form::new()
        .text("name", name.to_string())
        .part(
            "dataset",
            Part::bytes(b"id,amount\n1,10\n".to_vec()).file_name("data.csv"),
        )
        .part(
            "mock_dataset",
            Part::bytes(b"id,amount\n1,0\n".to_vec()).file_name("data.csv"),
        )
}

async fn create_dataset(
    client: &reqwest::Client,
    server: &common::TestServer,
    name: &str,
) -> Result<()> {
    let res = client
        .post(server.url("/api/v1/datasets/create-from-file"))
        .multipart(dataset_form(name))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn list_starts_empty() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/api/v1/trusted-datasites"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["datasites"], json!([]));

    Ok(())
}

#[tokio::test]
async fn update_normalizes_and_persists_the_list() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/v1/trusted-datasites"))
        .json(&json!({
            "datasites": ["alice@site-a.org", "  ", " bob@site-b.org "]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Auto-approve list updated with 2 emails");

    let res = client
        .get(server.url("/api/v1/trusted-datasites"))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["datasites"], json!(["alice@site-a.org", "bob@site-b.org"]));

    Ok(())
}

#[tokio::test]
async fn update_cascades_to_existing_datasets() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    create_dataset(&client, &server, "sales").await?;

    let res = client.get(server.url("/api/v1/datasets")).send().await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["datasets"][0]["autoApproval"], json!([]));

    let res = client
        .post(server.url("/api/v1/trusted-datasites"))
        .json(&json!({ "datasites": ["alice@site-a.org"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/api/v1/datasets")).send().await?;
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["datasets"][0]["autoApproval"],
        json!(["alice@site-a.org"])
    );

    Ok(())
}

#[tokio::test]
async fn new_datasets_inherit_the_current_list() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/v1/trusted-datasites"))
        .json(&json!({ "datasites": ["alice@site-a.org", "bob@site-b.org"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    create_dataset(&client, &server, "crops").await?;
    let res = client.get(server.url("/api/v1/datasets")).send().await?;
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["datasets"][0]["autoApproval"],
        json!(["alice@site-a.org", "bob@site-b.org"])
    );

    Ok(())
}
