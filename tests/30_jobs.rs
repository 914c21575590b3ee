mod common;

use std::fs;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use datasite_dashboard::registry::{JobRecord, JobStatus};

/// Jobs normally arrive through the sync layer, so tests seed them straight
/// into the workspace registry.
fn seed_job(server: &common::TestServer, name: &str) -> Result<JobRecord> {
    let registry = server.registry()?;
    let record = JobRecord::new(name, "Mean yield per region", "alice@site-a.org", "sales");
    registry.jobs().insert(&record)?;
    Ok(record)
}

#[tokio::test]
async fn list_and_get_jobs() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let job = seed_job(&server, "crop-analysis")?;
    seed_job(&server, "price-forecast")?;

    let res = client.get(server.url("/api/v1/jobs")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let jobs = body["jobs"].as_array().expect("jobs array");
    assert_eq!(jobs.len(), 2);

    let res = client
        .get(server.url(&format!("/api/v1/jobs/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["name"], "crop-analysis");
    assert_eq!(body["createdBy"], "alice@site-a.org");
    assert_eq!(body["datasetName"], "sales");
    assert_eq!(body["status"], "pending_code_review");

    let res = client
        .get(server.url("/api/v1/jobs/00000000-0000-0000-0000-000000000000"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["detail"],
        "Job with UID '00000000-0000-0000-0000-000000000000' not found"
    );

    Ok(())
}

#[tokio::test]
async fn review_and_dispatch_lifecycle() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let job = seed_job(&server, "crop-analysis")?;

    let res = client
        .post(server.url(&format!("/api/v1/jobs/approve/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], format!("Job {} approved.", job.uid));

    let res = client
        .get(server.url(&format!("/api/v1/jobs/{}", job.uid)))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "approved");

    let res = client
        .post(server.url(&format!("/api/v1/jobs/run/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], format!("Job {} started.", job.uid));

    // Not rerunnable until a run actually finished or failed
    let res = client
        .post(server.url(&format!("/api/v1/jobs/rerun/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["detail"],
        format!(
            "Job {} cannot be rerun. Current status: approved. Only finished or failed jobs can be rerun.",
            job.uid
        )
    );

    server
        .registry()?
        .jobs()
        .set_status(job.uid, JobStatus::JobRunFinished)?;
    let res = client
        .post(server.url(&format!("/api/v1/jobs/rerun/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], format!("Job {} restarted.", job.uid));

    let other = seed_job(&server, "price-forecast")?;
    let res = client
        .post(server.url(&format!("/api/v1/jobs/reject/{}", other.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .get(server.url(&format!("/api/v1/jobs/{}", other.uid)))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "rejected");

    Ok(())
}

#[tokio::test]
async fn logs_appear_once_a_run_captured_them() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let job = seed_job(&server, "crop-analysis")?;

    let res = client
        .get(server.url(&format!("/api/v1/jobs/logs/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["detail"],
        format!(
            "Logs not available for job {}. Job may not have been executed yet.",
            job.uid
        )
    );

    let logs_dir = server.registry()?.jobs().logs_dir(job.uid);
    fs::create_dir_all(&logs_dir)?;
    fs::write(logs_dir.join("stdout.log"), "rows processed: 420\n")?;

    let res = client
        .get(server.url(&format!("/api/v1/jobs/logs/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["stdout"], "rows processed: 420\n");
    assert_eq!(body["stderr"], "");

    Ok(())
}

#[tokio::test]
async fn code_preview_skips_tooling_directories() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let job = seed_job(&server, "crop-analysis")?;

    let code_dir = server.registry()?.jobs().code_dir(job.uid);
    fs::write(code_dir.join("main.py"), "print(\"hello\")\n")?;
    fs::create_dir_all(code_dir.join(".git"))?;
    fs::write(code_dir.join(".git").join("config"), "[core]\n")?;
    fs::create_dir_all(code_dir.join("__pycache__"))?;
    fs::write(code_dir.join("__pycache__").join("main.pyc"), [0u8, 1])?;

    let res = client
        .get(server.url(&format!("/api/v1/jobs/code/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["files"]["main.py"], "print(\"hello\")\n");
    let files = body["files"].as_object().expect("files object");
    let names: Vec<&String> = files.keys().collect();
    assert_eq!(names, vec!["main.py"], "tooling entries leaked");
    assert!(body["code_dir"].as_str().expect("code_dir").ends_with("code"));

    Ok(())
}

#[tokio::test]
async fn output_preview_requires_a_finished_run() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let job = seed_job(&server, "crop-analysis")?;

    let res = client
        .get(server.url(&format!("/api/v1/jobs/output/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["detail"],
        format!(
            "Output not available for job {}. Job may not have been executed yet.",
            job.uid
        )
    );

    let output_dir = server.registry()?.jobs().output_dir(job.uid);
    fs::create_dir_all(&output_dir)?;
    fs::write(output_dir.join("result.csv"), "region,yield\nnorth,4.2\n")?;

    let res = client
        .get(server.url(&format!("/api/v1/jobs/output/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["files"]["result.csv"], "region,yield\nnorth,4.2\n");

    Ok(())
}

#[tokio::test]
async fn delete_one_and_delete_all() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let job = seed_job(&server, "crop-analysis")?;

    let res = client
        .delete(server.url(&format!("/api/v1/jobs/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], format!("Job {} deleted.", job.uid));

    let res = client
        .delete(server.url(&format!("/api/v1/jobs/{}", job.uid)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    seed_job(&server, "a")?;
    seed_job(&server, "b")?;
    let res = client.delete(server.url("/api/v1/jobs")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["deleted"], 2);

    let res = client.get(server.url("/api/v1/jobs")).send().await?;
    let body = res.json::<Value>().await?;
    assert!(body["jobs"].as_array().expect("jobs array").is_empty());

    Ok(())
}
