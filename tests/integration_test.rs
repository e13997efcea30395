//! Integration tests for image requests using the I3fTest harness

mod common;

use common::{I3fTest, OTHER_IMAGE, TEST_IMAGE, TEST_IMAGE_BYTES};
use i3fd::images::LEVEL0_COMPLIANCE;
use i3fd::profiles::ProfileParams;
use i3fd::I3fRequest;

fn compliance_link() -> String {
    format!("<{}>;rel=\"compliesTo\"", LEVEL0_COMPLIANCE)
}

#[tokio::test]
async fn test_health_endpoint() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let resp = i3f.get("/health").await.expect("Failed to get health");
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["images"], "ok");
}

#[tokio::test]
async fn test_root_endpoint() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let resp = i3f.get("/").await.expect("Failed to get root");
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["name"], "i3fd");
    assert_eq!(body["compliance"], LEVEL0_COMPLIANCE);
    assert_eq!(body["profiles"], serde_json::json!(["thumb", "unmodified"]));
    assert_eq!(body["auth"], false);
}

#[tokio::test]
async fn test_parameterized_request() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let path = format!("/{}/full/full/0/color.png", TEST_IMAGE);
    let resp = i3f.get(&path).await.expect("Request failed");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/png");
    assert_eq!(resp.headers()["link"], compliance_link().as_str());

    let body = resp.bytes().await.expect("No body");
    assert_eq!(body.as_ref(), TEST_IMAGE_BYTES);
}

#[tokio::test]
async fn test_dummy_ignores_manipulation_parameters() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let path = format!("/{}/pct:10,10,50,50/!100,100/90/grey.jpg", TEST_IMAGE);
    let resp = i3f.get(&path).await.expect("Request failed");
    assert_eq!(resp.status(), 200);
    let body = resp.bytes().await.expect("No body");
    assert_eq!(body.as_ref(), TEST_IMAGE_BYTES);
}

#[tokio::test]
async fn test_unknown_mime_type_has_no_content_type() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let resp = i3f
        .get(&format!("/{}/unmodified", OTHER_IMAGE))
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("content-type").is_none());
}

#[tokio::test]
async fn test_named_profiles() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    for profile in ["unmodified", "thumb", "thumb.png"] {
        let resp = i3f
            .get(&format!("/{}/{}", TEST_IMAGE, profile))
            .await
            .expect("Request failed");
        assert_eq!(resp.status(), 200, "profile {}", profile);
    }
}

#[tokio::test]
async fn test_configured_profile() {
    let i3f = I3fTest::start_with(|config| {
        config.profiles.insert(
            "tiny".to_string(),
            ProfileParams {
                size: Some("8,8".to_string()),
                ..Default::default()
            },
        );
    })
    .await
    .expect("Failed to start server");

    let resp = i3f
        .get(&format!("/{}/tiny", TEST_IMAGE))
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_unknown_profile_is_bad_request() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let resp = i3f
        .get(&format!("/{}/poster", TEST_IMAGE))
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.headers()["content-type"], "text/xml");
    assert!(resp.headers().get("link").is_none());

    let body = resp.text().await.expect("No body");
    assert!(body.contains("<parameter>profile</parameter>"));
    assert!(body.contains("Named-profile poster not implemented"));
}

#[tokio::test]
async fn test_bad_parameters() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let cases = [
        ("bogus/full/0/color", "region"),
        ("full/0,0/0/color", "size"),
        ("full/full/45x/color", "rotation"),
        ("full/full/0/purple.jpg", "color"),
    ];
    for (params, parameter) in cases {
        let resp = i3f
            .get(&format!("/{}/{}", TEST_IMAGE, params))
            .await
            .expect("Request failed");
        assert_eq!(resp.status(), 400, "{}", params);
        let body = resp.text().await.expect("No body");
        assert!(
            body.contains(&format!("<parameter>{}</parameter>", parameter)),
            "{} should blame {}",
            params,
            parameter
        );
        assert!(body.contains("Bad request: "));
    }
}

#[tokio::test]
async fn test_wrong_segment_count() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let resp = i3f
        .get(&format!("/{}/full/full", TEST_IMAGE))
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_missing_image_lists_available() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let resp = i3f
        .get("/nothere.png/full/full/0/color")
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.headers()["content-type"], "text/xml");

    let body = resp.text().await.expect("No body");
    assert!(body.contains("<parameter>identifier</parameter>"));
    assert!(body.contains("Image resource &apos;nothere.png&apos; not found."));
    assert!(body.contains(&format!("  {}\n", TEST_IMAGE)));
    assert!(body.contains(&format!("  {}\n", OTHER_IMAGE)));
    assert!(body.contains("Request parameters:"));
}

#[tokio::test]
async fn test_remote_identifier_not_supported() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let mut request = I3fRequest::new("/");
    request.identifier = "http://example.org/image.png".to_string();
    request.profile = Some("unmodified".to_string());
    let path = request.to_path();
    assert_eq!(path, "/http:%2F%2Fexample.org%2Fimage.png/unmodified");

    let resp = i3f.get(&path).await.expect("Request failed");
    assert_eq!(resp.status(), 404);
    let body = resp.text().await.expect("No body");
    assert!(body.contains("Only local test images and http: URIs for images are supported."));
}

#[tokio::test]
async fn test_uri_too_long() {
    let i3f = I3fTest::start().await.expect("Failed to start server");

    let path = format!("/{}/full/full/0/color", "x".repeat(1024));
    let resp = i3f.get(&path).await.expect("Request failed");
    assert_eq!(resp.status(), 414);
    let body = resp.text().await.expect("No body");
    assert!(body.contains("URI Too Long: Max 1024 chars, got 1043"));
}

#[tokio::test]
async fn test_debug_off_hides_parameters() {
    let i3f = I3fTest::start_with(|config| config.debug = false)
        .await
        .expect("Failed to start server");

    let resp = i3f
        .get("/nothere.png/full/full/0/color")
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), 404);
    let body = resp.text().await.expect("No body");
    assert!(!body.contains("Request parameters:"));
}

#[tokio::test]
async fn test_base_url_prefix() {
    let i3f = I3fTest::start_with(|config| config.base_url = "/iiif".to_string())
        .await
        .expect("Failed to start server");

    let resp = i3f
        .get(&format!("/iiif/{}/unmodified", TEST_IMAGE))
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), 200);

    let resp = i3f
        .get(&format!("/{}/unmodified", TEST_IMAGE))
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_parallel_servers() {
    let i3f1 = I3fTest::start().await.expect("Failed to start server 1");
    let i3f2 = I3fTest::start().await.expect("Failed to start server 2");

    assert_ne!(i3f1.addr, i3f2.addr);

    let resp1 = i3f1.get("/health").await.expect("Failed to get health 1");
    let resp2 = i3f2.get("/health").await.expect("Failed to get health 2");

    assert_eq!(resp1.status(), 200);
    assert_eq!(resp2.status(), 200);
}
