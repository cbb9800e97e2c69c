use portfolio_api_rest::RestServer;
use portfolio_core_contact_contracts::MockContactFeatureService;
use portfolio_core_health_contracts::MockHealthFeatureService;
use tokio::net::TcpListener;

/// Serve the REST API on an ephemeral port and return its base url.
pub async fn serve(health: MockHealthFeatureService, contact: MockContactFeatureService) -> String {
    let router = RestServer::new(health, contact).router();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}
