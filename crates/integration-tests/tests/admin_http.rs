//! HTTP tests against a running admin panel.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The admin server running (cargo run -p shopfront-admin)
//! - `SHOPFRONT_SUPERUSER_USERNAME` / `SHOPFRONT_SUPERUSER_PASSWORD` for an
//!   existing Admin account (see `shopfront-cli staff bootstrap`)
//!
//! Run with: cargo test -p shopfront-integration-tests -- --ignored

use reqwest::{StatusCode, header};
use shopfront_integration_tests::{admin_base_url, admin_session, session_client};

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_anonymous_requests_go_to_login() {
    let client = session_client();
    let base_url = admin_base_url();

    let resp = client
        .get(format!("{base_url}/catalogue"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/auth/login")
    );
}

#[tokio::test]
#[ignore = "Requires running admin server and superuser credentials"]
async fn test_admin_sections_render() {
    let client = admin_session().await;
    let base_url = admin_base_url();

    for path in [
        "/",
        "/catalogue",
        "/catalogue/categories",
        "/catalogue/upload",
        "/inventory?low=1",
        "/customers?gender=Female&age=20-30",
        "/staff",
    ] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .unwrap_or_else(|e| panic!("{path}: {e}"));
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server and superuser credentials"]
async fn test_exports_are_csv_attachments() {
    let client = admin_session().await;
    let base_url = admin_base_url();

    for path in ["/catalogue/export", "/inventory/export"] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .unwrap_or_else(|e| panic!("{path}: {e}"));
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.starts_with("attachment"), "{path}");
        assert!(disposition.contains(".csv"), "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server and superuser credentials"]
async fn test_bad_upload_is_reported_not_written() {
    let client = admin_session().await;
    let base_url = admin_base_url();

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"sku,name\nX,Y\n".to_vec()).file_name("bad.csv"),
    );
    let resp = client
        .post(format!("{base_url}/catalogue/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/catalogue/upload")
    );
}

async fn upload(client: &reqwest::Client, csv: String, update_existing: bool) -> reqwest::Response {
    let mut form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(csv.into_bytes()).file_name("products.csv"),
    );
    if update_existing {
        form = form.text("update_existing", "on");
    }
    client
        .post(format!("{}/catalogue/upload", admin_base_url()))
        .multipart(form)
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"))
}

#[tokio::test]
#[ignore = "Requires running admin server and superuser credentials"]
async fn test_upload_moves_category_and_reports_oversized_rows() {
    let client = admin_session().await;
    let base_url = admin_base_url();
    let code = format!("UP-{:08x}", rand::random::<u32>());

    let resp = upload(
        &client,
        format!("sku,name,category,qty,price\n{code},Lamp,Electronics,3,9.5\n"),
        false,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // A blank subcategory under a new category lands in its General subcategory,
    // and a row that cannot be stored is reported without losing the good one.
    let long_name = "n".repeat(201);
    let resp = upload(
        &client,
        format!(
            "sku,name,category,subcategory,qty,price\n\
             {code},Lamp,Automotive,,4,9.5\n\
             {code}-X,{long_name},Automotive,,1,1\n"
        ),
        true,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let page = client
        .get(format!("{base_url}/catalogue?q={code}"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"))
        .text()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert!(page.contains("Updated 1 products."), "{page}");
    assert!(page.contains("Line 3: name longer than 200 characters"), "{page}");

    let csv = client
        .get(format!("{base_url}/catalogue/export?q={code}"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"))
        .text()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    let row = csv
        .lines()
        .find(|l| l.starts_with(&format!("{code},")))
        .unwrap_or_else(|| panic!("{code} missing from export:\n{csv}"));
    assert!(row.starts_with(&format!("{code},Lamp,Automotive,General,4,")), "{row}");
}
