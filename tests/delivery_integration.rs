//! Integration tests for the Delivery API client against a local mock server.

use std::sync::Arc;
use std::time::Duration;

use portfolio_content::delivery::DeliveryClient;
use portfolio_content_core::config::ContentfulConfig;
use portfolio_content_core::contract::ContentSource;
use portfolio_content_core::error::{ErrorKind, SourceError};
use portfolio_content_core::gateway::ContentGateway;
use portfolio_content_core::query::{projects_query, ProjectQuery};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENTRIES_PATH: &str = "/spaces/space1/environments/master/entries";

fn config_for(server: &MockServer) -> ContentfulConfig {
    let mut config = ContentfulConfig::new("space1", "test-token");
    config.host = server.uri();
    config
}

fn featured_response() -> serde_json::Value {
    json!({
        "sys": { "type": "Array" },
        "total": 1,
        "skip": 0,
        "limit": 100,
        "items": [{
            "sys": {
                "id": "portfolio",
                "type": "Entry",
                "createdAt": "2024-01-10T09:00:00.000Z",
                "updatedAt": "2024-03-01T12:30:00.000Z",
                "contentType": { "sys": { "type": "Link", "linkType": "ContentType", "id": "proyecto" } }
            },
            "fields": {
                "titulo": "Portfolio",
                "descripcionCorta": "This very site",
                "descripcionCompleta": "Built with **Rust**",
                "tecnologias": ["Rust", "React"],
                "imagenPrincipal": { "sys": { "type": "Link", "linkType": "Asset", "id": "shot" } },
                "urlGithub": "https://github.com/example/portfolio",
                "destacado": true,
                "fecha": "2024-01-01",
                "orden": 1
            }
        }],
        "includes": {
            "Asset": [{
                "sys": { "id": "shot", "type": "Asset" },
                "fields": {
                    "title": "Screenshot",
                    "file": {
                        "url": "//images.ctfassets.net/space1/shot/portfolio.png",
                        "contentType": "image/png",
                        "fileName": "portfolio.png",
                        "details": { "size": 2048, "image": { "width": 1280, "height": 720 } }
                    }
                }
            }]
        }
    })
}

#[tokio::test]
async fn featured_projects_resolve_included_assets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENTRIES_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("content_type", "proyecto"))
        .and(query_param("fields.destacado", "true"))
        .and(query_param("order", "fields.orden"))
        .respond_with(ResponseTemplate::new(200).set_body_json(featured_response()))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = DeliveryClient::new(&config).unwrap();
    let gateway = ContentGateway::from_config(Arc::new(client), &config);

    let projects = gateway.featured_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].title, "Portfolio");
    assert_eq!(
        projects[0].image_url().as_deref(),
        Some("https://images.ctfassets.net/space1/shot/portfolio.png")
    );
    assert_eq!(projects[0].technologies, vec!["Rust", "React"]);
}

#[tokio::test]
async fn not_found_status_is_reported_with_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENTRIES_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "sys": { "type": "Error", "id": "NotFound" },
            "message": "The resource could not be found."
        })))
        .mount(&server)
        .await;

    let client = DeliveryClient::new(&config_for(&server)).unwrap();
    let err = client
        .get_entries(&projects_query(&ProjectQuery::default()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SourceError::Http {
            status: 404,
            message: "The resource could not be found.".to_string(),
            retry_after_secs: None,
        }
    );
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn rate_limit_carries_reset_hint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENTRIES_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("X-Contentful-RateLimit-Reset", "3")
                .set_body_json(json!({ "message": "Rate limit exceeded" })),
        )
        .mount(&server)
        .await;

    let config = config_for(&server);
    let gateway = ContentGateway::from_config(
        Arc::new(DeliveryClient::new(&config).unwrap()),
        &config,
    );
    let err = gateway.skills().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert_eq!(err.retry_after_secs(), Some(3));
}

#[tokio::test]
async fn server_error_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let gateway = ContentGateway::from_config(
        Arc::new(DeliveryClient::new(&config).unwrap()),
        &config,
    );
    let err = gateway.education().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert!(err.detail().contains("503"));
}

#[tokio::test]
async fn connection_refused_is_network() {
    let mut config = ContentfulConfig::new("space1", "test-token");
    config.host = "http://127.0.0.1:1".to_string();
    let gateway = ContentGateway::from_config(
        Arc::new(DeliveryClient::new(&config).unwrap()),
        &config,
    );
    let err = gateway.featured_projects().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn unreadable_body_is_schema() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let gateway = ContentGateway::from_config(
        Arc::new(DeliveryClient::new(&config).unwrap()),
        &config,
    );
    let err = gateway.skills().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.timeout_secs = 1;
    let gateway = ContentGateway::from_config(
        Arc::new(DeliveryClient::new(&config).unwrap()),
        &config,
    );
    let err = gateway.skills().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn configured_locale_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("locale", "es-CL"))
        .and(query_param("content_type", "habilidad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.locale = Some("es-CL".to_string());
    let gateway = ContentGateway::from_config(
        Arc::new(DeliveryClient::new(&config).unwrap()),
        &config,
    );
    assert!(gateway.skills().await.unwrap().is_empty());
}
