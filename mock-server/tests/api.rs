use std::time::Duration;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with, Ad, BackendConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "adadmin-test-boundary";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, cookie: Option<&str>) -> http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match cookie {
        Some(cookie) => builder.header(http::header::COOKIE, cookie),
        None => builder,
    }
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<String> {
    request(method, uri, cookie)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<String> {
    request(method, uri, cookie).body(String::new()).unwrap()
}

fn multipart_request(cookie: &str, fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    request("POST", "/api/admin/ads", Some(cookie))
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Log in with the default account and return the `name=value` cookie pair.
async fn login(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            None,
            json!({"loginId": "admin", "password": "1234"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let set_cookie = resp
        .headers()
        .get(http::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie.split(';').next().unwrap().to_string()
}

async fn create_iframe(app: &Router, cookie: &str, title: &str) -> Ad {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/ads/iframe",
            Some(cookie),
            json!({"title": title, "embed_src": "https://x", "embed_width": 300, "embed_height": 250}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_value(body_json(resp).await["result"].clone()).unwrap()
}

// --- auth ---

#[tokio::test]
async fn login_with_wrong_password_returns_401_detail() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            None,
            json!({"loginId": "admin", "password": "wrong"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({"detail": "invalid credentials"}));
}

#[tokio::test]
async fn me_without_session_is_unauthorized() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/admin/me", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["detail"], "UNAUTHORIZED");
}

#[tokio::test]
async fn login_then_me_returns_profile_envelope() {
    let app = app();
    let cookie = login(&app).await;

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/admin/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["result"]["loginId"], "admin");
    assert!(body["result"]["createdAt"].is_string());
}

#[tokio::test]
async fn logout_invalidates_session() {
    let app = app();
    let cookie = login(&app).await;

    let resp = app
        .clone()
        .oneshot(empty_request("POST", "/api/auth/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = resp.headers().get(http::header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/admin/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_session_is_unauthorized() {
    let app = app_with(BackendConfig {
        session_ttl: Duration::ZERO,
        ..BackendConfig::default()
    });
    let cookie = login(&app).await;

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/admin/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ads_require_session() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/admin/ads?page=0&size=20", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- create ---

#[tokio::test]
async fn create_image_ad_stores_upload() {
    let app = app();
    let cookie = login(&app).await;
    let png = [0x89, b'P', b'N', b'G', 0x00, 0xff];

    let resp = app
        .clone()
        .oneshot(multipart_request(
            &cookie,
            &[("title", "Winter sale"), ("description", ""), ("target_url", "https://origin.com")],
            Some(("banner.png", &png[..])),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ad = body_json(resp).await["result"].clone();
    assert_eq!(ad["ad_type"], "IMAGE");
    assert_eq!(ad["title"], "Winter sale");
    assert!(ad["description"].is_null());
    assert_eq!(ad["target_url"], "https://origin.com");

    let image_url = ad["image_url"].as_str().unwrap();
    assert!(image_url.starts_with("/static/ads/"));
    assert!(image_url.ends_with("_banner.png"));

    let resp = app
        .clone()
        .oneshot(empty_request("GET", image_url, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(http::header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(&body_bytes(resp).await[..], &png[..]);
}

#[tokio::test]
async fn create_image_ad_without_image_is_422() {
    let app = app();
    let cookie = login(&app).await;

    let resp = app
        .clone()
        .oneshot(multipart_request(&cookie, &[("title", "No image")], None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await["detail"], "image is required");
}

#[tokio::test]
async fn create_iframe_ad_with_zero_size_is_422() {
    let app = app();
    let cookie = login(&app).await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/ads/iframe",
            Some(&cookie),
            json!({"title": "w", "embed_src": "https://x", "embed_width": 0, "embed_height": 250}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- list ---

#[tokio::test]
async fn list_is_newest_first_paged_and_searchable() {
    let app = app();
    let cookie = login(&app).await;
    for title in ["alpha", "beta", "gamma"] {
        create_iframe(&app, &cookie, title).await;
    }

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/admin/ads?page=0&size=2", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await["result"].clone();
    assert_eq!(page["total_elements"], 3);
    assert_eq!(page["total_pages"], 2);
    let titles: Vec<&str> = page["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|ad| ad["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["gamma", "beta"]);

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/admin/ads?page=0&size=20&keyword=alp", Some(&cookie)))
        .await
        .unwrap();
    let page = body_json(resp).await["result"].clone();
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["title"], "alpha");
}

// --- update ---

#[tokio::test]
async fn patch_rejects_fields_of_other_kind() {
    let app = app();
    let cookie = login(&app).await;
    let ad = create_iframe(&app, &cookie, "widget").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/admin/ads/{}", ad.id),
            Some(&cookie),
            json!({"target_url": "https://nope"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn patch_missing_ad_is_404() {
    let app = app();
    let cookie = login(&app).await;

    let resp = app
        .clone()
        .oneshot(json_request("PATCH", "/api/admin/ads/999", Some(&cookie), json!({"title": "x"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["detail"], "ad not found");
}

// --- delete ---

#[tokio::test]
async fn deleted_ad_is_hidden_but_its_neighbours_remain() {
    let app = app();
    let cookie = login(&app).await;
    let keep = create_iframe(&app, &cookie, "keep").await;
    let gone = create_iframe(&app, &cookie, "gone").await;
    let gone_uri = format!("/api/admin/ads/{}", gone.id);

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &gone_uri, Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/admin/ads?page=0&size=20", Some(&cookie)))
        .await
        .unwrap();
    let page = body_json(resp).await["result"].clone();
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["id"], keep.id);

    for req in [
        empty_request("GET", &gone_uri, Some(&cookie)),
        json_request("PATCH", &gone_uri, Some(&cookie), json!({"title": "back"})),
        empty_request("DELETE", &gone_uri, Some(&cookie)),
    ] {
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["detail"], "ad not found");
    }

    // ids are not reused after a delete
    let next = create_iframe(&app, &cookie, "next").await;
    assert_eq!(next.id, gone.id + 1);
}

// --- full lifecycle ---

#[tokio::test]
async fn ad_lifecycle() {
    let app = app();
    let cookie = login(&app).await;

    // create
    let created = create_iframe(&app, &cookie, "Partner widget").await;
    let id = created.id;

    // get
    let resp = app
        .clone()
        .oneshot(empty_request("GET", &format!("/api/admin/ads/{id}"), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "ad detail");
    assert_eq!(body["result"]["id"], id);
    assert_eq!(body["result"]["ad_type"], "IFRAME");

    // update: partial, only embed size
    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/admin/ads/{id}"),
            Some(&cookie),
            json!({"embed_width": 728, "embed_height": 90}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await["result"].clone();
    assert_eq!(updated["title"], "Partner widget"); // unchanged
    assert_eq!(updated["embed_width"], 728);

    // delete
    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/admin/ads/{id}"), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete: 404
    let resp = app
        .clone()
        .oneshot(empty_request("GET", &format!("/api/admin/ads/{id}"), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list after delete: empty
    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/admin/ads", Some(&cookie)))
        .await
        .unwrap();
    let page = body_json(resp).await["result"].clone();
    assert_eq!(page["total_elements"], 0);
    assert_eq!(page["size"], 10);
}
