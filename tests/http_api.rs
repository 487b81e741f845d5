// tests/http_api.rs

use std::error::Error;
use std::fs;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use recoverd::fs::mock::MockFileSystem;
use recoverd::http::router;
use recoverd_test_utils::builders::ConfigFileBuilder;
use recoverd_test_utils::scratch::Scratch;
use recoverd_test_utils::{collect_until_complete, init_tracing, with_timeout};
use serde_json::Value;
use tower::ServiceExt;

type TestResult = Result<(), Box<dyn Error>>;

const BOUNDARY: &str = "recoverd-test-boundary";

/// Hand-rolled `multipart/form-data` body: `(field, file name, contents)`.
fn multipart_body(parts: &[(&str, &str, &str)]) -> String {
    let mut body = String::new();
    for (field, file_name, contents) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        body.push_str(&format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        ));
        body.push_str("Content-Type: application/octet-stream\r\n\r\n");
        body.push_str(contents);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn upload_request(parts: &[(&str, &str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: Response) -> Result<Value, Box<dyn Error>> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn upload_stores_definition_and_qualifying_data_files() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let app = router(scratch.state(scratch.config().build()));

        let response = app
            .oneshot(upload_request(&[
                ("create_sql", "schema.sql", "CREATE TABLE t (id INT);"),
                ("ibd_files[]", "t.ibd", "pages"),
                ("ibd_files[]", "readme.txt", "ignored"),
            ]))
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await?;
        assert_eq!(body["message"], "Files uploaded successfully");
        assert_eq!(body["definition"], "create.sql");
        assert_eq!(body["data_files"], serde_json::json!(["t.ibd"]));
        assert_eq!(body["skipped"], serde_json::json!(["readme.txt"]));

        assert_eq!(scratch.staged_names(), vec!["create.sql", "t.ibd"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn large_upload_is_staged_from_disk_and_leaves_no_spool_behind() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let app = router(scratch.state(scratch.config().build()));
        let pages = "p".repeat(512 * 1024);

        let response = app
            .oneshot(upload_request(&[
                ("create_sql", "schema.sql", "CREATE TABLE t (id INT);"),
                ("ibd_files[]", "t.ibd", &pages),
            ]))
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(fs::read_to_string(scratch.staging_dir().join("t.ibd"))?, pages);

        let mut root: Vec<String> = fs::read_dir(scratch.path())?
            .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<Result<_, _>>()?;
        root.sort();
        assert_eq!(root, vec!["backup", "staging", "work"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn upload_without_definition_is_a_bad_request() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let app = router(scratch.state(scratch.config().build()));

        let response = app
            .oneshot(upload_request(&[
                ("create_sql", "", ""),
                ("ibd_files[]", "t.ibd", "pages"),
            ]))
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await?;
        assert_eq!(body["code"], "MISSING_INPUT");
        assert!(scratch.staged_names().is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn download_without_backups_is_not_found() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let app = router(scratch.state(scratch.config().build()));

        let response = app.oneshot(empty_request("GET", "/download_backup")).await?;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await?;
        assert_eq!(body["error"], "No backup file available");
        assert_eq!(body["code"], "BACKUP_NOT_FOUND");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn download_of_backup_that_cannot_be_inspected_is_unreadable() -> TestResult {
    with_timeout(async {
        init_tracing();
        let mock = MockFileSystem::new();
        let cfg = ConfigFileBuilder::new()
            .with_staging_dir("/srv/recoverd/staging")
            .with_backup_dir("/srv/recoverd/backup")
            .with_working_dir("/srv/recoverd")
            .build();
        let state = recoverd::build_state(Arc::new(mock.clone()), cfg)?;
        mock.add_file("/srv/recoverd/backup/backup_20230101.sql", "-- dump");
        mock.fail_metadata(true);

        let response = router(state)
            .oneshot(empty_request("GET", "/download_backup"))
            .await?;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await?;
        assert_eq!(body["code"], "BACKUP_UNREADABLE");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn download_streams_newest_backup_as_attachment() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        scratch.write_backup("backup_20230101.sql", "-- january");
        scratch.write_backup("backup_20230215.sql", "-- february");
        let app = router(scratch.state(scratch.config().build()));

        let response = app.oneshot(empty_request("GET", "/download_backup")).await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/sql");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"backup_20230215.sql\""
        );
        let bytes = response.into_body().collect().await?.to_bytes();
        assert_eq!(&bytes[..], b"-- february");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn start_recovery_is_accepted_once_then_conflicts() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let state = scratch.state(
            scratch
                .config()
                .with_script("while [ ! -f go ]; do sleep 0.05; done")
                .build(),
        );
        let mut sub = state.supervisor.subscribe();
        let app = router(state.clone());

        let first = app
            .clone()
            .oneshot(empty_request("POST", "/start_recovery"))
            .await?;
        assert_eq!(first.status(), StatusCode::ACCEPTED);
        let body = json_body(first).await?;
        assert_eq!(body["message"], "Recovery process started");
        let run_id = body["run_id"].as_u64().expect("numeric run id");

        let second = app
            .clone()
            .oneshot(empty_request("POST", "/start_recovery"))
            .await?;
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(second).await?["code"], "ALREADY_RUNNING");

        let status = app.clone().oneshot(empty_request("GET", "/status")).await?;
        let status = json_body(status).await?;
        assert_eq!(status["phase"], "running");
        assert_eq!(status["run_id"], run_id);

        let upload = app
            .clone()
            .oneshot(upload_request(&[
                ("create_sql", "create.sql", "x"),
                ("ibd_files[]", "t.ibd", "pages"),
            ]))
            .await?;
        assert_eq!(upload.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(upload).await?["code"], "STAGING_IN_USE");

        fs::write(scratch.work_dir().join("go"), "")?;
        collect_until_complete(&mut sub).await;

        let status = app.oneshot(empty_request("GET", "/status")).await?;
        let status = json_body(status).await?;
        assert_eq!(status["phase"], "idle");
        assert_eq!(status["last_run"]["outcome"], "succeeded");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn start_with_missing_executable_is_a_server_error() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let state = scratch.state(
            scratch
                .config()
                .with_command("/nonexistent/recovery.sh", &[])
                .build(),
        );
        let app = router(state);

        let response = app.oneshot(empty_request("POST", "/start_recovery")).await?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await?;
        assert_eq!(body["code"], "LAUNCH_FAILURE");
        assert_eq!(body["error"], "An internal error occurred");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn health_reports_ok() -> TestResult {
    with_timeout(async {
        let scratch = Scratch::new();
        let app = router(scratch.state(scratch.config().build()));

        let response = app.oneshot(empty_request("GET", "/health")).await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await?;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        Ok(())
    })
    .await
}
