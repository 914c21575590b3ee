mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_reports_healthy() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::get(server.url("/api/health")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "healthy");

    Ok(())
}

#[tokio::test]
async fn account_reflects_configured_identity() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::get(server.url("/api/v1/account")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["email"], "owner@test.local");
    assert_eq!(body["is_admin"], true);
    assert_eq!(body["host_datasite_url"], "datasite://owner@test.local");

    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::get(server.url("/api/v1/nope")).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}
