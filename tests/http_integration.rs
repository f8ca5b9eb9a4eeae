//! Integration tests for the HTTP transport, gateways and collections
//!
//! These run the real reqwest transport against wiremock endpoints laid out
//! like a CommServe web-service API.

use cvsdk::resource::get_collection;
use cvsdk::{
    Context, Gateway, HttpSettings, HttpTransport, Method, RequestChecks, ResourceCollection,
    SdkError, ServiceFetcher, ServiceTable,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> HttpSettings {
    HttpSettings {
        auth_token: Some("QSDK test-token".to_string()),
        https: false,
        ..HttpSettings::default()
    }
}

fn context_for(server: &MockServer) -> Arc<Context> {
    let base = format!("{}/webconsole/api/", server.uri());
    let services = ServiceTable::new(&base).expect("valid base url");
    let transport = HttpTransport::with_settings(&settings()).expect("client builds");
    Arc::new(Context::new(services, Arc::new(transport)))
}

/// Tests for the gateway over a real transport
mod gateway_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_success_returns_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/webconsole/api/CommServ/Certificates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let gateway = Gateway::new(context_for(&server), "CERTIFICATES").unwrap();
        let body = gateway.perform(Method::GET, None).await.unwrap();

        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_auth_token_header_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/webconsole/api/Regions"))
            .and(header("Authtoken", "QSDK test-token"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"regions": []})))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = Gateway::new(context_for(&server), "REGIONS").unwrap();
        gateway.perform(Method::GET, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_500_maps_to_request_failed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/webconsole/api/CommServ/Certificates"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "server error"})))
            .mount(&server)
            .await;

        let gateway = Gateway::new(context_for(&server), "CERTIFICATES").unwrap();
        let err = gateway.perform(Method::GET, None).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("server error"));
    }

    #[tokio::test]
    async fn test_html_error_page_uses_title() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/webconsole/api/DownloadCenter"))
            .respond_with(ResponseTemplate::new(503).set_body_string(
                "<html><head><title>Service Unavailable</title></head><body></body></html>",
            ))
            .mount(&server)
            .await;

        let gateway = Gateway::new(context_for(&server), "DOWNLOAD_CENTER").unwrap();
        let err = gateway.perform(Method::GET, None).await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_204_decodes_to_null() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/webconsole/api/Job/17"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let gateway = Gateway::with_params(context_for(&server), "JOB", &["17"]).unwrap();
        let body = gateway.perform(Method::DELETE, None).await.unwrap();

        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_post_sends_json_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webconsole/api/ExecuteQCommand"))
            .and(body_partial_json(json!({"command": "qlist job"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"errorCode": 0, "output": "none"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gateway = Gateway::new(context_for(&server), "EXECUTE_QCOMMAND").unwrap();
        let payload = json!({"command": "qlist job"});
        let body = gateway
            .perform_checked(Method::POST, Some(&payload), RequestChecks::for_method(&Method::POST))
            .await
            .unwrap();

        assert_eq!(body["output"], "none");
    }

    #[tokio::test]
    async fn test_error_code_in_ok_response_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webconsole/api/CreateTask"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"errorCode": 2, "errorMessage": "Invalid restore options"}),
            ))
            .mount(&server)
            .await;

        let gateway = Gateway::new(context_for(&server), "RESTORE").unwrap();
        let err = gateway
            .perform_checked(
                Method::POST,
                Some(&json!({})),
                RequestChecks::for_method(&Method::POST),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("[2: Invalid restore options]"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Nothing listens on port 1
        let services = ServiceTable::new("http://127.0.0.1:1/webconsole/api/").unwrap();
        let transport = HttpTransport::with_settings(&settings()).unwrap();
        let context = Arc::new(Context::new(services, Arc::new(transport)));

        let gateway = Gateway::new(context, "CERTIFICATES").unwrap();
        let err = gateway.perform(Method::GET, None).await.unwrap_err();

        assert!(matches!(err, SdkError::Transport(_)));
        assert!(err.is_transient());
    }
}

/// Tests for collections backed by the list services
mod collection_tests {
    use super::*;

    async fn mount_regions(server: &MockServer, names: &[(&str, u64)]) {
        let regions: Vec<_> = names
            .iter()
            .map(|(name, id)| json!({"name": name, "id": id}))
            .collect();

        Mock::given(method("GET"))
            .and(path("/webconsole/api/Regions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"regions": regions})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_open_lists_entries() {
        let server = MockServer::start().await;
        mount_regions(&server, &[("EMEA", 1), ("apac", 2)]).await;

        let def = get_collection("regions").unwrap().clone();
        let regions = ResourceCollection::open(context_for(&server), def, ServiceFetcher)
            .await
            .unwrap();

        assert_eq!(regions.len(), 2);
        assert!(regions.has("emea"));
        assert!(regions.has(" APAC "));
        assert_eq!(regions.get("Emea").unwrap().id(), "1");
    }

    #[tokio::test]
    async fn test_nested_name_paths() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/webconsole/api/CommCell/DomainController"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "providers": [
                    {"shortName": {"domainName": "corp", "id": 12}, "enabled": true},
                    {"shortName": {"id": 13}}
                ]
            })))
            .mount(&server)
            .await;

        let def = get_collection("domains").unwrap().clone();
        let domains = ResourceCollection::open(context_for(&server), def, ServiceFetcher)
            .await
            .unwrap();

        assert_eq!(domains.names(), vec!["corp"]);
        assert_eq!(domains.skipped(), 1);
        assert_eq!(domains.get("CORP").unwrap().id(), "12");
    }

    #[tokio::test]
    async fn test_add_then_refresh_round_trip() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webconsole/api/Regions"))
            .and(body_partial_json(json!({"name": "latam"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "latam", "id": 9})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let def = get_collection("regions").unwrap().clone();
        let mut regions = ResourceCollection::new(context_for(&server), def, ServiceFetcher);

        let created = regions.add("latam", json!({"locations": []})).await.unwrap();
        assert_eq!(created.id(), "9");
        assert!(regions.has("LATAM"));

        mount_regions(&server, &[("latam", 9), ("emea", 1)]).await;
        regions.refresh().await.unwrap();

        assert_eq!(regions.len(), 2);
        assert_eq!(*regions.get("latam").unwrap(), created);
    }

    #[tokio::test]
    async fn test_add_without_record_uses_listing() {
        let server = MockServer::start().await;
        mount_regions(&server, &[("emea", 1), ("latam", 12)]).await;

        Mock::given(method("POST"))
            .and(path("/webconsole/api/Regions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"errorCode": 0, "regionId": 12})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/webconsole/api/Regions/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorCode": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let def = get_collection("regions").unwrap().clone();
        let mut regions = ResourceCollection::new(context_for(&server), def, ServiceFetcher);

        let created = regions.add("latam", json!({})).await.unwrap();
        assert_eq!(created.id(), "12");

        regions.refresh().await.unwrap();
        assert_eq!(*regions.get("latam").unwrap(), created);

        regions.delete("latam").await.unwrap();
        assert!(!regions.has("latam"));
    }

    #[tokio::test]
    async fn test_error_code_listing_keeps_snapshot() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/webconsole/api/Regions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "regions": [{"name": "emea", "id": 1}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/webconsole/api/Regions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"errorCode": 5, "errorMessage": "Access denied"})),
            )
            .mount(&server)
            .await;

        let def = get_collection("regions").unwrap().clone();
        let mut regions = ResourceCollection::open(context_for(&server), def, ServiceFetcher)
            .await
            .unwrap();

        let err = regions.refresh().await.unwrap_err();
        assert!(err.to_string().contains("Access denied"));
        assert!(regions.has("emea"));
    }

    #[tokio::test]
    async fn test_delete_uses_entry_id() {
        let server = MockServer::start().await;
        mount_regions(&server, &[("emea", 4)]).await;

        Mock::given(method("DELETE"))
            .and(path("/webconsole/api/Regions/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorCode": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let def = get_collection("regions").unwrap().clone();
        let mut regions = ResourceCollection::open(context_for(&server), def, ServiceFetcher)
            .await
            .unwrap();

        regions.delete("EMEA").await.unwrap();
        assert!(!regions.has("emea"));
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_entry() {
        let server = MockServer::start().await;
        mount_regions(&server, &[("emea", 4)]).await;

        Mock::given(method("DELETE"))
            .and(path("/webconsole/api/Regions/4"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(json!({"errorMessage": "Region is in use"})),
            )
            .mount(&server)
            .await;

        let def = get_collection("regions").unwrap().clone();
        let mut regions = ResourceCollection::open(context_for(&server), def, ServiceFetcher)
            .await
            .unwrap();

        let err = regions.delete("emea").await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("Region is in use"));
        assert!(regions.has("emea"));
    }

    #[tokio::test]
    async fn test_delete_unknown_name_sends_nothing() {
        let server = MockServer::start().await;
        mount_regions(&server, &[("emea", 4)]).await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let def = get_collection("regions").unwrap().clone();
        let mut regions = ResourceCollection::open(context_for(&server), def, ServiceFetcher)
            .await
            .unwrap();

        let err = regions.delete("apac").await.unwrap_err();
        assert!(matches!(err, SdkError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_snapshot() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/webconsole/api/Regions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "regions": [{"name": "emea", "id": 1}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/webconsole/api/Regions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let def = get_collection("regions").unwrap().clone();
        let mut regions = ResourceCollection::open(context_for(&server), def, ServiceFetcher)
            .await
            .unwrap();

        let err = regions.refresh().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(regions.has("emea"));
        assert_eq!(regions.len(), 1);
    }
}
