use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::GroupsApi;
use crate::error::ApiError;
use crate::models::{ApiResponse, GroupList, StatusMessage};
use crate::utils::constants::{GROUP_FILTER_PARAM, GROUPS_PATH};

/// `GroupsApi` over HTTP with bearer token auth.
pub struct HttpGroupsApi {
    client: Client,
    base: Url,
    token: String,
}

#[derive(Serialize)]
struct NewGroupBody<'a> {
    groupname: &'a str,
}

#[derive(Serialize)]
struct NewMemberBody<'a> {
    username: &'a str,
    #[serde(rename = "isAdmin")]
    is_admin: bool,
}

impl HttpGroupsApi {
    pub fn new(host: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_client(Client::new(), host, token)
    }

    pub fn with_client(client: Client, host: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        let base = Url::parse(host).map_err(|e| ApiError::InvalidHost(format!("{host}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidHost(host.to_string()));
        }
        Ok(Self {
            client,
            base,
            token: token.into(),
        })
    }

    /// Groups endpoint followed by `segments`, each one percent-encoded on
    /// its own so names cannot add path levels, queries or fragments.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        // `with_client` rejects hosts that cannot carry a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(GROUPS_PATH).extend(segments);
        }
        url
    }

    fn groups_url(&self) -> Url {
        self.endpoint([])
    }

    fn members_url(&self, group_name: &str) -> Url {
        self.endpoint([group_name, "users"])
    }

    fn member_url(&self, group_name: &str, user_name: &str) -> Url {
        self.endpoint([group_name, "users", user_name])
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>, ApiError> {
        let response = request.bearer_auth(&self.token).send().await?;
        Self::read_envelope(response).await
    }

    // 4xx replies still carry a `{ success: false }` envelope worth reading.
    async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<ApiResponse<T>, ApiError> {
        let status = response.status();
        debug!(%status, url = %response.url(), "groups API replied");
        if status.is_server_error() {
            return Err(ApiError::Status(status));
        }
        Ok(response.json::<ApiResponse<T>>().await?)
    }
}

#[async_trait]
impl GroupsApi for HttpGroupsApi {
    async fn get_groups(&self, filter: Option<&str>) -> Result<GroupList, ApiError> {
        let mut request = self.client.get(self.groups_url());
        if let Some(groupname) = filter {
            request = request.query(&[(GROUP_FILTER_PARAM, groupname)]);
        }
        let envelope = self.send::<GroupList>(request).await?;
        Ok(envelope.result)
    }

    async fn add_new_group(&self, groupname: &str) -> Result<ApiResponse<StatusMessage>, ApiError> {
        let request = self
            .client
            .post(self.groups_url())
            .json(&NewGroupBody { groupname });
        self.send(request).await
    }

    async fn add_group_user(
        &self,
        group_name: &str,
        user_name: &str,
        is_admin: bool,
    ) -> Result<ApiResponse<StatusMessage>, ApiError> {
        let request = self
            .client
            .post(self.members_url(group_name))
            .json(&NewMemberBody {
                username: user_name,
                is_admin,
            });
        self.send(request).await
    }

    async fn remove_group_user(
        &self,
        group_name: &str,
        user_name: &str,
    ) -> Result<ApiResponse<StatusMessage>, ApiError> {
        let request = self.client.delete(self.member_url(group_name, user_name));
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use super::*;

    fn local_api(host: &str) -> HttpGroupsApi {
        let client = Client::builder().no_proxy().build().expect("client");
        HttpGroupsApi::with_client(client, host, "secret").expect("valid host")
    }

    /// Answer a single request with `status` and `body`, handing back the raw
    /// request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (seen, request) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut raw = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.expect("read request");
                raw.extend_from_slice(&chunk[..n]);
                if n == 0 || request_complete(&raw) {
                    break;
                }
            }
            let _ = seen.send(String::from_utf8_lossy(&raw).into_owned());

            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.expect("write reply");
        });

        (format!("http://{addr}"), request)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..head_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= head_end + 4 + length
    }

    #[test]
    fn builds_urls_without_double_slash() {
        let api = local_api("https://groups.example.com/");
        assert_eq!(api.groups_url().as_str(), "https://groups.example.com/api/groups");
        assert_eq!(
            api.members_url("eng").as_str(),
            "https://groups.example.com/api/groups/eng/users"
        );
    }

    #[test]
    fn keeps_host_path_prefix() {
        let api = local_api("https://example.com/admin/");
        assert_eq!(api.groups_url().as_str(), "https://example.com/admin/api/groups");
    }

    #[test]
    fn names_are_escaped_per_segment() {
        let api = local_api("https://groups.example.com");
        let url = api.member_url("a/b", "x#y?z");

        assert_eq!(url.path(), "/api/groups/a%2Fb/users/x%23y%3Fz");
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn rejects_hosts_without_a_path() {
        assert!(matches!(
            HttpGroupsApi::new("mailto:admin@example.com", "t"),
            Err(ApiError::InvalidHost(_))
        ));
        assert!(matches!(HttpGroupsApi::new("not a url", "t"), Err(ApiError::InvalidHost(_))));
    }

    #[test]
    fn member_body_uses_camel_case_flag() {
        let body = serde_json::to_value(NewMemberBody {
            username: "ada",
            is_admin: true,
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({ "username": "ada", "isAdmin": true }));
    }

    #[tokio::test]
    async fn server_errors_map_to_status() {
        let (host, _request) = serve_once("503 Service Unavailable", "").await;

        let err = local_api(&host).get_groups(None).await.expect_err("server is down");

        assert!(matches!(err, ApiError::Status(status) if status.as_u16() == 503));
    }

    #[tokio::test]
    async fn get_groups_sends_filter_and_token() {
        let (host, request) = serve_once(
            "200 OK",
            r#"{ "success": true, "result": { "groups": [{ "groupname": "eng" }] } }"#,
        )
        .await;

        let list = local_api(&host).get_groups(Some("eng")).await.expect("groups");

        assert_eq!(list.groups[0].groupname, "eng");
        let request = request.await.expect("request seen").to_lowercase();
        assert!(request.starts_with("get /api/groups?groupname=eng http/1.1"));
        assert!(request.contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn remove_member_escapes_names_on_the_wire() {
        let (host, request) = serve_once("200 OK", r#"{ "success": true, "result": {} }"#).await;

        let response = local_api(&host)
            .remove_group_user("a/b", "x#y")
            .await
            .expect("removed");

        assert!(response.success);
        let request = request.await.expect("request seen");
        assert!(request.starts_with("DELETE /api/groups/a%2Fb/users/x%23y HTTP/1.1"));
    }

    #[tokio::test]
    async fn client_errors_still_return_the_envelope() {
        let (host, _request) = serve_once(
            "409 Conflict",
            r#"{ "success": false, "result": { "message": "Group already exists" } }"#,
        )
        .await;

        let response = local_api(&host).add_new_group("eng").await.expect("envelope");

        assert!(!response.success);
        assert_eq!(response.result.message.as_deref(), Some("Group already exists"));
    }
}
