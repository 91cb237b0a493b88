use api_types::{
    deposit::SaveDeposit,
    user::{AuthResponse, LoginUser, RegisterUser, UserRecord},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use engine::{EngineError, RemoteAuth, RemoteStore};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

#[derive(Debug)]
pub enum ClientError {
    NotFound,
    Server(String),
    Transport(reqwest::Error),
}

impl From<ClientError> for EngineError {
    fn from(err: ClientError) -> Self {
        let reason = match err {
            ClientError::NotFound => "not found".to_string(),
            ClientError::Server(body) => body,
            ClientError::Transport(err) => err.to_string(),
        };
        EngineError::RemoteUnreachable(reason)
    }
}

/// The remote store spoken to over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url.trim())
            .map_err(|err| AppError::Input(format!("invalid base_url: {err}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::Server(format!("invalid endpoint {path}: {err}")))
    }

    /// Send `request`, mapping any non-success status to a [`ClientError`].
    async fn send(request: RequestBuilder) -> std::result::Result<Response, ClientError> {
        let res = request.send().await.map_err(ClientError::Transport)?;

        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        let err = match status.as_u16() {
            404 => ClientError::NotFound,
            _ => ClientError::Server(format!("{status}: {body}")),
        };
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> std::result::Result<T, ClientError> {
        Self::send(request)
            .await?
            .json::<T>()
            .await
            .map_err(ClientError::Transport)
    }

    /// Register and login answer `{ok, user, msg}`, whatever the status code.
    async fn auth(&self, request: RequestBuilder) -> std::result::Result<RemoteAuth, EngineError> {
        let res = request.send().await.map_err(ClientError::Transport)?;
        let status = res.status();
        let parsed = res.json::<AuthResponse>().await;

        match parsed {
            Ok(AuthResponse {
                ok: true,
                user: Some(user),
                ..
            }) => Ok(RemoteAuth::Accepted(user)),
            Ok(AuthResponse {
                ok: false, msg, ..
            }) if status.is_success() || status.is_client_error() => Ok(RemoteAuth::Rejected(
                msg.unwrap_or_else(|| "rejected".to_string()),
            )),
            Ok(_) => Err(ClientError::Server(format!("{status}: unexpected auth response")).into()),
            Err(err) => Err(ClientError::Transport(err).into()),
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn register(
        &self,
        id: &str,
        credential: &str,
        monthly_goal: i64,
    ) -> std::result::Result<RemoteAuth, EngineError> {
        let payload = RegisterUser {
            username: id.to_string(),
            password: credential.to_string(),
            monthly_goal,
        };
        let endpoint = self.endpoint("api/register")?;
        self.auth(self.http.post(endpoint).json(&payload)).await
    }

    async fn authenticate(
        &self,
        id: &str,
        credential: &str,
    ) -> std::result::Result<RemoteAuth, EngineError> {
        let payload = LoginUser {
            username: id.to_string(),
            password: credential.to_string(),
        };
        let endpoint = self.endpoint("api/login")?;
        self.auth(self.http.post(endpoint).json(&payload)).await
    }

    async fn fetch_user(&self, id: &str) -> std::result::Result<Option<UserRecord>, EngineError> {
        let mut endpoint = self.endpoint("api/user/")?;
        endpoint
            .path_segments_mut()
            .map_err(|()| ClientError::Server("base_url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(id);

        match Self::send_json::<UserRecord>(self.http.get(endpoint)).await {
            Ok(record) => Ok(Some(record)),
            Err(ClientError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn record_deposit(
        &self,
        id: &str,
        amount: i64,
        date: NaiveDate,
    ) -> std::result::Result<(), EngineError> {
        let payload = SaveDeposit {
            username: id.to_string(),
            amount,
            date,
        };
        let endpoint = self.endpoint("api/save")?;
        Self::send(self.http.post(endpoint).json(&payload)).await?;
        Ok(())
    }

    async fn update_account(&self, record: &UserRecord) -> std::result::Result<(), EngineError> {
        let endpoint = self.endpoint("api/update-user")?;
        Self::send(self.http.post(endpoint).json(record)).await?;
        Ok(())
    }
}
