//! Account provider backed by a hosted identity platform's admin API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use planivo_application::{AccountCreation, AccountProvider, NewAccount};
use planivo_core::{AppError, AppResult};
use planivo_domain::UserId;

const LOOKUP_PAGE_SIZE: usize = 200;
const MAX_LOOKUP_PAGES: usize = 50;

/// HTTP implementation of the account provider port.
///
/// Talks to `{base_url}/admin/users` with a service key.
#[derive(Clone)]
pub struct HttpAccountProvider {
    http_client: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct AdminUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdminUserList {
    #[serde(default)]
    users: Vec<AdminUser>,
}

impl HttpAccountProvider {
    /// Creates a provider for the admin API rooted at `base_url`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            service_key: service_key.into(),
        }
    }

    fn users_endpoint(&self) -> String {
        format!("{}/admin/users", self.base_url)
    }

    /// The `email` filter is a hint only. Pages are scanned until a short page.
    fn lookup_url(&self, email: &str, page: usize) -> AppResult<reqwest::Url> {
        let page = page.to_string();
        let per_page = LOOKUP_PAGE_SIZE.to_string();
        reqwest::Url::parse_with_params(
            &self.users_endpoint(),
            &[
                ("email", email),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
            ],
        )
        .map_err(|error| AppError::Internal(format!("invalid account service url: {error}")))
    }

    async fn fetch_users_page(&self, email: &str, page: usize) -> AppResult<Vec<AdminUser>> {
        let response = self
            .authorized(self.http_client.get(self.lookup_url(email, page)?))
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("account service transport error: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Internal(format!(
                "account lookup failed with status {status}"
            )));
        }

        let list = response.json::<AdminUserList>().await.map_err(|error| {
            AppError::Internal(format!("invalid account service response: {error}"))
        })?;
        Ok(list.users)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(self.service_key.as_str())
            .header("apikey", self.service_key.as_str())
    }
}

/// Picks the account whose email matches exactly, ignoring ASCII case.
fn account_with_email(users: Vec<AdminUser>, email: &str) -> Option<UserId> {
    users
        .into_iter()
        .find(|user| {
            user.email
                .as_deref()
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(email))
        })
        .map(|user| UserId::from_uuid(user.id))
}

/// Whether an error response reports an existing account for the email.
fn is_duplicate_account(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::CONFLICT {
        return true;
    }

    status == StatusCode::UNPROCESSABLE_ENTITY && {
        let body = body.to_lowercase();
        body.contains("already") && (body.contains("registered") || body.contains("exists"))
    }
}

#[async_trait]
impl AccountProvider for HttpAccountProvider {
    async fn create_account(&self, account: NewAccount<'_>) -> AppResult<AccountCreation> {
        let response = self
            .authorized(self.http_client.post(self.users_endpoint()))
            .json(&serde_json::json!({
                "email": account.email,
                "password": account.password,
                "email_confirm": true,
                "user_metadata": { "full_name": account.full_name },
            }))
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("account service transport error: {error}"))
            })?;

        let status = response.status();
        if status.is_success() {
            let user = response.json::<AdminUser>().await.map_err(|error| {
                AppError::Internal(format!("invalid account service response: {error}"))
            })?;
            info!(user_id = %user.id, "account created");
            return Ok(AccountCreation::Created(UserId::from_uuid(user.id)));
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());
        if is_duplicate_account(status, &body) {
            return Ok(AccountCreation::AlreadyExists);
        }

        Err(AppError::Internal(format!(
            "account creation failed with status {status}: {body}"
        )))
    }

    async fn find_account_id_by_email(&self, email: &str) -> AppResult<Option<UserId>> {
        for page in 1..=MAX_LOOKUP_PAGES {
            let users = self.fetch_users_page(email, page).await?;
            let page_len = users.len();
            if let Some(user_id) = account_with_email(users, email) {
                return Ok(Some(user_id));
            }
            if page_len < LOOKUP_PAGE_SIZE {
                return Ok(None);
            }
        }

        warn!(pages = MAX_LOOKUP_PAGES, "account lookup stopped at the page limit");
        Ok(None)
    }
}
