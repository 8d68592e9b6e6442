//! HTTP-level tests for the search client against a mock search engine.

use glossa_core::{EntityReference, EntityType, Error, GlossaryTerm, SearchClient};
use glossa_search::{HttpSearchClient, SearchConfig};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpSearchClient {
    let config = SearchConfig::default()
        .with_base_url(server.uri())
        .with_index("terms")
        .with_alias("all")
        .with_timeout(5);
    HttpSearchClient::new(config).expect("Failed to create search client")
}

fn apple_ref(id: Uuid) -> EntityReference {
    EntityReference::new(id, EntityType::GlossaryTerm, "Apple", "G.Fruit.Apple")
}

#[tokio::test]
async fn test_update_entity_puts_term_document() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PUT"))
        .and(path(format!("/terms/_doc/{}", id)))
        .and(body_partial_json(json!({
            "fullyQualifiedName": "G.Fruit.Apple",
            "entityType": "glossaryTerm",
            "suggest": [
                { "input": "Apple", "weight": 5 },
                { "input": "G.Fruit.Apple", "weight": 5 }
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "result": "created" })))
        .expect(1)
        .mount(&server)
        .await;

    let term = GlossaryTerm::new(id, "Apple", "G.Fruit.Apple");
    client_for(&server).update_entity(&term).await.unwrap();
}

#[tokio::test]
async fn test_soft_delete_flags_document_and_labels() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path(format!("/terms/_update/{}", id)))
        .and(body_partial_json(json!({ "doc": { "deleted": true } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/all/_update_by_query"))
        .and(query_param("conflicts", "proceed"))
        .and(body_partial_json(json!({
            "query": { "term": { "tags.tagFQN": "G.Fruit.Apple" } },
            "script": { "params": { "fqn": "G.Fruit.Apple", "deleted": true } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updated": 2 })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .soft_delete_or_restore(&apple_ref(id), true, "tags.tagFQN")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_tolerates_missing_document() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path(format!("/terms/_doc/{}", id)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "result": "not_found" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/all/_update_by_query"))
        .and(body_partial_json(json!({
            "query": { "term": { "tags.tagFQN": "G.Fruit.Apple" } },
            "script": { "source": "ctx._source.tags = []", "params": { "fqn": "G.Fruit.Apple" } }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_and_clean_references(&apple_ref(id), "ctx._source.tags = []", "tags.tagFQN")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("index closed"))
        .mount(&server)
        .await;

    let term = GlossaryTerm::new(Uuid::new_v4(), "Apple", "G.Fruit.Apple");
    let err = client_for(&server).update_entity(&term).await.unwrap_err();
    match err {
        Error::Search(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("index closed"));
        }
        other => panic!("Expected Search error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_api_key_header_sent() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PUT"))
        .and(path(format!("/terms/_doc/{}", id)))
        .and(header("Authorization", "ApiKey secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = SearchConfig::default()
        .with_base_url(server.uri())
        .with_index("terms")
        .with_api_key("secret");
    let client = HttpSearchClient::new(config).unwrap();
    client
        .update_entity(&GlossaryTerm::new(id, "Apple", "G.Fruit.Apple"))
        .await
        .unwrap();
}
