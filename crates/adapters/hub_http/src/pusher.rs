//! `StatePusher` implementation over the hub's REST API.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use kiosk_bridge_app::ports::StatePusher;
use kiosk_bridge_domain::entity::HubPath;
use kiosk_bridge_domain::error::BridgeError;

use crate::config::HubHttpConfig;
use crate::error::HubHttpError;

/// Pushes JSON payloads to `{server_url}{path}` with bearer authentication.
///
/// Failed pushes are reported once and never retried; the next state change
/// or motion heartbeat supersedes them.
#[derive(Debug, Clone)]
pub struct HttpStatePusher {
    client: Client,
    server_url: String,
    auth_token: Option<String>,
}

impl HttpStatePusher {
    /// Build a pusher from validated configuration.
    ///
    /// `auth_token` is the resolved token; `None` sends unauthenticated requests.
    ///
    /// # Errors
    ///
    /// Returns [`HubHttpError::Config`] for an invalid configuration or
    /// [`HubHttpError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &HubHttpConfig, auth_token: Option<String>) -> Result<Self, HubHttpError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(HubHttpError::Client)?;
        Ok(Self {
            client,
            server_url: config.base_url().to_string(),
            auth_token,
        })
    }

    fn url(&self, path: &HubPath) -> String {
        format!("{}{path}", self.server_url)
    }

    async fn post(&self, path: HubPath, body: Value) -> Result<Value, HubHttpError> {
        let url = self.url(&path);
        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(HubHttpError::Request)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(HubHttpError::Status(status.as_u16()));
        }
        let answer = response.json::<Value>().await.map_err(HubHttpError::Decode)?;
        tracing::trace!(%url, "hub accepted push");
        Ok(answer)
    }
}

impl StatePusher for HttpStatePusher {
    fn push(&self, path: HubPath, body: Value) -> impl Future<Output = Result<Value, BridgeError>> + Send {
        async move { self.post(path, body).await.map_err(HubHttpError::into_domain) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config(server_url: String) -> HubHttpConfig {
        HubHttpConfig {
            server_url,
            ..HubHttpConfig::default()
        }
    }

    fn motion_path() -> HubPath {
        HubPath::States("binary_sensor.kiosk_motion".into())
    }

    #[tokio::test]
    async fn should_post_json_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/states/binary_sensor.kiosk_motion")
            .match_header("authorization", "Bearer secret")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"state": "on"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"entity_id":"binary_sensor.kiosk_motion","state":"on"}"#)
            .create_async()
            .await;

        let pusher = HttpStatePusher::new(&config(server.url()), Some("secret".into())).unwrap();
        let answer = pusher.push(motion_path(), json!({"state": "on"})).await.unwrap();

        assert_eq!(answer["state"], "on");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn should_join_server_url_with_trailing_slash() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/room_presence/abc_1_2")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let pusher = HttpStatePusher::new(&config(format!("{}/", server.url())), None).unwrap();
        pusher
            .push(HubPath::RoomPresence("abc_1_2".into()), json!({}))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn should_omit_authorization_without_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/states/binary_sensor.kiosk_motion")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let pusher = HttpStatePusher::new(&config(server.url()), None).unwrap();
        pusher.push(motion_path(), json!({})).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn should_fail_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/states/binary_sensor.kiosk_motion")
            .with_status(500)
            .create_async()
            .await;

        let pusher = HttpStatePusher::new(&config(server.url()), None).unwrap();
        let err = pusher.push(motion_path(), json!({})).await.unwrap_err();

        assert!(matches!(err, BridgeError::Delivery(_)));
    }

    #[tokio::test]
    async fn should_fail_on_non_200_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/states/binary_sensor.kiosk_motion")
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let pusher = HttpStatePusher::new(&config(server.url()), None).unwrap();
        let err = pusher.post(motion_path(), json!({})).await.unwrap_err();

        assert!(matches!(err, HubHttpError::Status(201)));
    }

    #[tokio::test]
    async fn should_fail_on_non_json_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/states/binary_sensor.kiosk_motion")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let pusher = HttpStatePusher::new(&config(server.url()), None).unwrap();
        let err = pusher.post(motion_path(), json!({})).await.unwrap_err();

        assert!(matches!(err, HubHttpError::Decode(_)));
    }

    #[tokio::test]
    async fn should_fail_when_hub_is_unreachable() {
        let pusher = HttpStatePusher::new(&config("http://127.0.0.1:1".into()), None).unwrap();
        let err = pusher.post(motion_path(), json!({})).await.unwrap_err();

        assert!(matches!(err, HubHttpError::Request(_)));
    }

    #[test]
    fn should_refuse_invalid_config() {
        let err = HttpStatePusher::new(&config("not a url".into()), None).unwrap_err();
        assert!(matches!(err, HubHttpError::Config(_)));
    }
}
