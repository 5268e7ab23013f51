//! HTTP client for the signage backend

use crate::credentials::CredentialStore;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use boardctrl_core::types::{LoginRequest, LoginResponse};
use boardctrl_core::{ApiConfig, Board, BoardId, Category, CategoryId, Credentials, Page, Slide};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Source of the slide list for a board
///
/// Listing must be idempotent and free of side effects; the rotation engine calls it
/// exactly once per presentation.
#[async_trait]
pub trait SlideSource: Send + Sync {
    /// Fetch every slide of a board, in the order the backend returns them
    async fn list_slides(&self, board: BoardId) -> ClientResult<Vec<Slide>>;
}

/// API client for the signage backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    page_size: u32,
    credentials: Arc<dyn CredentialStore>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialStore>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        if config.accept_invalid_certs {
            warn!(base_url = %config.base(), "TLS certificate verification is disabled");
        }

        Ok(Self {
            client,
            base_url: config.base().to_string(),
            page_size: config.page_size.max(1),
            credentials,
        })
    }

    /// Credential store used for authenticated requests
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Sign in and store the issued credential
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidCredentials`] when the backend answers 401, or a
    /// transport/status error otherwise.
    #[instrument(skip(self, password))]
    pub async fn login(&self, user: &str, password: &str) -> ClientResult<Credentials> {
        let url = format!("{}/api/Authentication/Login", self.base_url);
        let body = LoginRequest {
            user: user.to_string(),
            password: password.to_string(),
        };

        let response = self.client.post(&url).json(&body).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(user, "Login rejected");
            return Err(ClientError::InvalidCredentials);
        }

        let login: LoginResponse = Self::decode(response).await?;
        let credentials = Credentials::from(login);
        self.credentials.save(&credentials).await?;

        info!(user = %credentials.user_name, "Signed in");
        Ok(credentials)
    }

    /// Forget the stored credential
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store cannot be cleared.
    pub async fn logout(&self) -> ClientResult<()> {
        self.credentials.clear().await?;
        info!("Signed out");
        Ok(())
    }

    /// Get one page of categories
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the credential is missing or rejected,
    /// or the response cannot be parsed.
    pub async fn list_categories(&self, page: u32) -> ClientResult<Page<Category>> {
        let url = format!("{}/api/Categories/FullCategories", self.base_url);
        let request = self.client.get(&url).query(&[
            ("page", page.max(1).to_string()),
            ("pageSize", self.page_size.to_string()),
        ]);

        let categories: Page<Category> = self.send_authenticated(request).await?;
        debug!(page, count = categories.items.len(), "Fetched categories");
        Ok(categories.normalized())
    }

    /// Get one page of boards filed under a category
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the credential is missing or rejected,
    /// or the response cannot be parsed.
    pub async fn list_boards(&self, category: CategoryId, page: u32) -> ClientResult<Page<Board>> {
        let url = format!("{}/api/Board/list-boards-by-category", self.base_url);
        let request = self.client.get(&url).query(&[
            ("categoryId", category.to_string()),
            ("pageNumber", page.max(1).to_string()),
            ("pageSize", self.page_size.to_string()),
        ]);

        let boards: Page<Board> = self.send_authenticated(request).await?;
        debug!(%category, page, count = boards.items.len(), "Fetched boards");
        Ok(boards.normalized())
    }

    /// Get every slide of a board, in backend order
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the credential is missing or rejected,
    /// or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_slides(&self, board: BoardId) -> ClientResult<Vec<Slide>> {
        let url = format!("{}/api/Slides/List-Slide-by-board", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("boardId", board.to_string())]);

        let slides: Vec<Slide> = self.send_authenticated(request).await?;
        debug!(count = slides.len(), "Fetched slides");
        Ok(slides)
    }

    /// Attach the stored bearer token, send, and decode the JSON body
    async fn send_authenticated<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ClientResult<T> {
        let credentials = self
            .credentials
            .load()
            .await?
            .ok_or(ClientError::NotAuthenticated)?;

        let response = request.bearer_auth(&credentials.token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl SlideSource for ApiClient {
    async fn list_slides(&self, board: BoardId) -> ClientResult<Vec<Slide>> {
        Self::list_slides(self, board).await
    }
}
