//! Route table

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use storefront_shared::config::CorsSettings;

use crate::handlers::{health, menu};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Menu reads
        .route("/api/v1/storefronts/{storefront_id}/menu", get(menu::get_menu))
        .route(
            "/api/v1/storefronts/{storefront_id}/menu/public",
            get(menu::get_public_menu),
        )
        // Item lifecycle
        .route(
            "/api/v1/storefronts/{storefront_id}/menu/items",
            post(menu::create_item),
        )
        .route(
            "/api/v1/storefronts/{storefront_id}/menu/items/{item_id}",
            put(menu::update_item).delete(menu::delete_item),
        )
        // Structure
        .route(
            "/api/v1/storefronts/{storefront_id}/menu/items/{item_id}/move",
            post(menu::move_item),
        )
        .route(
            "/api/v1/storefronts/{storefront_id}/menu/items/{item_id}/promote",
            post(menu::promote_item),
        )
        .route(
            "/api/v1/storefronts/{storefront_id}/menu/reorder",
            post(menu::reorder_items),
        )
        .route(
            "/api/v1/storefronts/{storefront_id}/menu/structure",
            put(menu::set_structure),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use storefront_infrastructure::InMemoryMenuRepository;
    use storefront_shared::config::AppConfig;

    fn app() -> Router {
        let config = AppConfig::defaults().unwrap();
        build_router(AppState::new(Arc::new(InMemoryMenuRepository::new()), config))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router, sf: Uuid, label: &str, parent: Option<&str>) -> String {
        let (status, body) = send(
            app,
            "POST",
            &format!("/api/v1/storefronts/{}/menu/items", sf),
            Some(json!({
                "label": label,
                "link_type": "page",
                "target": label.to_lowercase(),
                "parent_id": parent,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["item"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_create_then_read_tree() {
        let app = app();
        let sf = Uuid::new_v4();
        let home = create(&app, sf, "Home", None).await;
        create(&app, sf, "Products", Some(&home)).await;

        let (status, body) = send(&app, "GET", &format!("/api/v1/storefronts/{}/menu", sf), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["revision"], 2);
        assert_eq!(body["data"]["items"][0]["label"], "Home");
        assert_eq!(body["data"]["items"][0]["children"][0]["label"], "Products");
    }

    #[tokio::test]
    async fn test_cycle_is_422_with_message() {
        let app = app();
        let sf = Uuid::new_v4();
        let home = create(&app, sf, "Home", None).await;
        let products = create(&app, sf, "Products", Some(&home)).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/storefronts/{}/menu/items/{}/move", sf, home),
            Some(json!({ "parent_id": products })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "cycle");
        assert_eq!(body["error"]["message"], "Cannot move a parent into its own child");
    }

    #[tokio::test]
    async fn test_promote_and_delete() {
        let app = app();
        let sf = Uuid::new_v4();
        let home = create(&app, sf, "Home", None).await;
        let products = create(&app, sf, "Products", Some(&home)).await;
        create(&app, sf, "Pipes", Some(&products)).await;

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/storefronts/{}/menu/items/{}/promote", sf, products),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/v1/storefronts/{}/menu/items/{}", sf, products),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deleted"][0], products.as_str());

        // Pipes took the deleted slot at the top level
        let labels: Vec<&str> = body["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["label"].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["Home", "Pipes"]);
    }

    #[tokio::test]
    async fn test_reorder_validation_and_unknown_item() {
        let app = app();
        let sf = Uuid::new_v4();
        let uri = format!("/api/v1/storefronts/{}/menu/reorder", sf);

        let (status, body) = send(&app, "POST", &uri, Some(json!({ "item_ids": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            &app,
            "POST",
            &uri,
            Some(json!({ "item_ids": [Uuid::new_v4()] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "unknown-item");
    }

    #[tokio::test]
    async fn test_unknown_item_is_404() {
        let app = app();
        let sf = Uuid::new_v4();
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/storefronts/{}/menu/items/{}/promote", sf, Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invalid_target_and_bad_ids_are_400() {
        let app = app();
        let sf = Uuid::new_v4();
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/storefronts/{}/menu/items", sf),
            Some(json!({ "label": "Docs", "link_type": "external", "target": "not a url" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "GET", "/api/v1/storefronts/not-a-uuid/menu", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_stale_structure_is_409() {
        let app = app();
        let sf = Uuid::new_v4();
        let home = create(&app, sf, "Home", None).await;
        let about = create(&app, sf, "About", None).await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/v1/storefronts/{}/menu/structure", sf),
            Some(json!({
                "entries": [
                    { "id": home, "parent_id": null, "sort_order": 0 },
                    { "id": about, "parent_id": home, "sort_order": 0 },
                ],
                "expected_revision": 1,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONCURRENT_MODIFICATION");
    }

    #[tokio::test]
    async fn test_public_menu_hides_invisible() {
        let app = app();
        let sf = Uuid::new_v4();
        let home = create(&app, sf, "Home", None).await;
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/storefronts/{}/menu/items/{}", sf, home),
            Some(json!({ "is_visible": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", &format!("/api/v1/storefronts/{}/menu/public", sf), None).await;
        assert!(body["data"]["items"].as_array().unwrap().is_empty());
    }
}
