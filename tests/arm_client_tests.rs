mod common;

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use common::arm_server::{ArmServer, Scripted, StaticTokenProvider, TEST_TOKEN};
use netapp_deleter::arm::{ArmClient, PollingOptions};
use netapp_deleter::NetappDeleterError;

const API_VERSION: &str = "2024-07-01";
const ACCOUNTS: &str = "/subscriptions/s/providers/Microsoft.NetApp/netAppAccounts";
const VOLUME: &str = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.NetApp/netAppAccounts/anf/capacityPools/pool1/volumes/vol1";

fn client(server: &ArmServer) -> ArmClient {
    client_with_timeout(server, Duration::from_secs(5))
}

fn client_with_timeout(server: &ArmServer, timeout: Duration) -> ArmClient {
    let polling = PollingOptions {
        interval: Duration::from_millis(10),
        timeout,
    };
    ArmClient::new(Arc::new(StaticTokenProvider), server.base_url(), polling).unwrap()
}

#[cfg(test)]
mod list_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_follows_next_link() {
        let server = ArmServer::start().await;
        server.respond(
            "GET",
            ACCOUNTS,
            vec![Scripted::json(
                200,
                json!({
                    "value": [{"id": "a"}, {"id": "b"}],
                    "nextLink": server.url("/page2?api-version=2024-07-01&$skipToken=abc"),
                }),
            )],
        );
        server.respond(
            "GET",
            "/page2",
            vec![Scripted::json(200, json!({"value": [{"id": "c"}]}))],
        );

        let items: Vec<Value> = client(&server).list(ACCOUNTS, API_VERSION).await.unwrap();

        let ids: Vec<&str> = items.iter().filter_map(|i| i["id"].as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query, format!("api-version={API_VERSION}"));
        assert!(requests[1].query.contains("$skipToken=abc"));
        for request in &requests {
            assert_eq!(
                request.authorization.as_deref(),
                Some(format!("Bearer {TEST_TOKEN}").as_str())
            );
            assert!(request.request_id.is_some());
        }
    }

    #[tokio::test]
    async fn test_next_link_to_foreign_host_is_refused() {
        let server = ArmServer::start().await;
        server.respond(
            "GET",
            ACCOUNTS,
            vec![Scripted::json(
                200,
                json!({
                    "value": [{"id": "a"}],
                    "nextLink": "https://collector.example.net/page2?token=abc",
                }),
            )],
        );

        let result: netapp_deleter::Result<Vec<Value>> =
            client(&server).list(ACCOUNTS, API_VERSION).await;

        match result {
            Err(NetappDeleterError::InvalidArgument(message)) => {
                assert!(message.contains("collector.example.net"))
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_throttled_request_is_retried() {
        let server = ArmServer::start().await;
        server.respond(
            "GET",
            ACCOUNTS,
            vec![
                Scripted::json(
                    429,
                    json!({"error": {"code": "TooManyRequests", "message": "slow down"}}),
                )
                .header("retry-after", "0"),
                Scripted::json(200, json!({"value": [{"id": "a"}]})),
            ],
        );

        let items: Vec<Value> = client(&server).list(ACCOUNTS, API_VERSION).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(server.hits("GET", ACCOUNTS), 2);
    }

    #[tokio::test]
    async fn test_exists() {
        let server = ArmServer::start().await;
        server.respond("GET", VOLUME, vec![Scripted::json(200, json!({"id": VOLUME}))]);
        let client = client(&server);

        assert!(client.exists(VOLUME, API_VERSION).await.unwrap());
        assert!(!client
            .exists(&format!("{VOLUME}-missing"), API_VERSION)
            .await
            .unwrap());
    }
}

#[cfg(test)]
mod delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_of_missing_resource_succeeds() {
        let server = ArmServer::start().await;
        server.respond(
            "DELETE",
            VOLUME,
            vec![Scripted::json(
                404,
                json!({"error": {"code": "ResourceNotFound", "message": "gone"}}),
            )],
        );

        client(&server).delete_and_wait(VOLUME, API_VERSION).await.unwrap();
        assert_eq!(server.hits("DELETE", VOLUME), 1);
    }

    #[tokio::test]
    async fn test_conflict_is_reported() {
        let server = ArmServer::start().await;
        server.respond(
            "DELETE",
            VOLUME,
            vec![Scripted::json(
                409,
                json!({"error": {
                    "code": "CannotDeleteResource",
                    "message": "Cannot delete resource while nested resources exist."
                }}),
            )],
        );

        let err = client(&server)
            .delete_and_wait(VOLUME, API_VERSION)
            .await
            .unwrap_err();
        assert!(err.is_nested_resource_conflict(), "{err}");
    }

    #[tokio::test]
    async fn test_async_operation_until_succeeded() {
        let server = ArmServer::start().await;
        server.respond(
            "DELETE",
            VOLUME,
            vec![Scripted::status(202).header("azure-asyncoperation", &server.url("/operations/op1"))],
        );
        server.respond(
            "GET",
            "/operations/op1",
            vec![
                Scripted::json(200, json!({"status": "InProgress"})),
                Scripted::json(200, json!({"status": "Deleting"})),
                Scripted::json(200, json!({"status": "Succeeded"})),
            ],
        );

        client(&server).delete_and_wait(VOLUME, API_VERSION).await.unwrap();
        assert_eq!(server.hits("GET", "/operations/op1"), 3);
        // The status document is authoritative; the resource is never re-read
        assert_eq!(server.hits("GET", VOLUME), 0);
    }

    #[tokio::test]
    async fn test_async_operation_failure_carries_error() {
        let server = ArmServer::start().await;
        server.respond(
            "DELETE",
            VOLUME,
            vec![Scripted::status(202).header("azure-asyncoperation", &server.url("/operations/op1"))],
        );
        server.respond(
            "GET",
            "/operations/op1",
            vec![Scripted::json(
                200,
                json!({
                    "status": "Failed",
                    "error": {"code": "VolumeInUse", "message": "volume has active replication"}
                }),
            )],
        );

        let err = client(&server)
            .delete_and_wait(VOLUME, API_VERSION)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("VolumeInUse"), "{message}");
        assert!(message.contains("volume has active replication"), "{message}");
    }

    #[tokio::test]
    async fn test_async_operation_canceled() {
        let server = ArmServer::start().await;
        server.respond(
            "DELETE",
            VOLUME,
            vec![Scripted::status(202).header("azure-asyncoperation", &server.url("/operations/op1"))],
        );
        server.respond(
            "GET",
            "/operations/op1",
            vec![Scripted::json(200, json!({"status": "Canceled"}))],
        );

        let err = client(&server)
            .delete_and_wait(VOLUME, API_VERSION)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("canceled"), "{err}");
    }

    #[tokio::test]
    async fn test_location_until_done() {
        let server = ArmServer::start().await;
        server.respond(
            "DELETE",
            VOLUME,
            vec![Scripted::status(202).header("location", &server.url("/operations/loc1"))],
        );
        server.respond(
            "GET",
            "/operations/loc1",
            vec![Scripted::status(202), Scripted::status(200)],
        );

        client(&server).delete_and_wait(VOLUME, API_VERSION).await.unwrap();
        assert_eq!(server.hits("GET", "/operations/loc1"), 2);
    }

    #[tokio::test]
    async fn test_location_that_never_finishes_times_out() {
        let server = ArmServer::start().await;
        server.respond(
            "DELETE",
            VOLUME,
            vec![Scripted::status(202).header("location", &server.url("/operations/loc1"))],
        );
        server.respond("GET", "/operations/loc1", vec![Scripted::status(202)]);

        let err = client_with_timeout(&server, Duration::from_millis(100))
            .delete_and_wait(VOLUME, API_VERSION)
            .await
            .unwrap_err();

        assert!(matches!(err, NetappDeleterError::Timeout(_)), "{err:?}");
        assert!(server.hits("GET", "/operations/loc1") >= 1);
    }

    #[tokio::test]
    async fn test_resource_polled_until_not_found() {
        let server = ArmServer::start().await;
        server.respond("DELETE", VOLUME, vec![Scripted::status(202)]);
        server.respond(
            "GET",
            VOLUME,
            vec![
                Scripted::json(200, json!({"id": VOLUME, "properties": {"provisioningState": "Deleting"}})),
                Scripted::json(404, json!({"error": {"code": "ResourceNotFound", "message": "gone"}})),
            ],
        );

        client(&server).delete_and_wait(VOLUME, API_VERSION).await.unwrap();
        assert_eq!(server.hits("GET", VOLUME), 2);
    }
}
