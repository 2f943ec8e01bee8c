mod common;

use common::lsp_client::TestClient;

/// Verifies the server completes the initialize / initialized / shutdown
/// handshake and advertises the capabilities the protocol's bootstrap step
/// names (§4.6 step 2).
#[tokio::test]
async fn initialize_advertises_capabilities_and_server_info() {
    let mut client = TestClient::new();
    let result = client.initialize().await;

    assert_eq!(result["capabilities"]["textDocumentSync"], serde_json::json!(1)); // FULL
    assert_eq!(result["capabilities"]["foldingRangeProvider"], serde_json::json!(true));
    assert!(result["capabilities"]["completionProvider"].is_object());
    assert_eq!(result["serverInfo"]["name"], "tl-lsp");

    client.shutdown().await;
}

/// `shutdown` followed by `exit` causes the server's main loop to terminate;
/// verified indirectly by the client's write half not erroring.
#[tokio::test]
async fn shutdown_then_exit_is_accepted() {
    let mut client = TestClient::new();
    client.initialize().await;
    client.shutdown().await;
}
