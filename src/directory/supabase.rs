use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use url::Url;

use super::{DirectoryError, IdentityDirectory, IdentityRecord};
use crate::{
    config::{ConfigurationError, DirectoryConfig},
    credential::TemporaryCredential,
};

const ADMIN_USERS_PATH: &str = "auth/v1/admin/users";

/// Supabase (GoTrue) admin API client.
///
/// Authenticates every call with the service role key, sent both as the
/// `apikey` header and as a bearer token.
pub struct SupabaseDirectory {
    client: Client,
    base_url: Url,
    service_key: SecretString,
    page_size: u32,
    max_pages: u32,
}

#[derive(Debug, Deserialize)]
struct UserPage {
    #[serde(default)]
    users: Vec<DirectoryUser>,
}

#[derive(Debug, Deserialize)]
struct DirectoryUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
struct CredentialUpdate<'a> {
    password: &'a str,
}

impl SupabaseDirectory {
    pub fn from_config(
        client: Client,
        config: &DirectoryConfig,
    ) -> Result<Self, ConfigurationError> {
        let (base_url, service_key) = config.credentials()?;

        Ok(Self {
            client,
            base_url,
            service_key,
            page_size: config.page_size.max(1),
            max_pages: config.max_pages.max(1),
        })
    }

    fn users_url(&self) -> Result<Url, DirectoryError> {
        Ok(self.base_url.join(ADMIN_USERS_PATH)?)
    }

    fn user_url(&self, id: &str) -> Result<Url, DirectoryError> {
        let mut url = self.users_url()?;
        url.path_segments_mut()
            .map_err(|()| DirectoryError::UrlNotABase)?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    async fn list_page(&self, page: u32) -> Result<Vec<DirectoryUser>, DirectoryError> {
        let response = self
            .client
            .get(self.users_url()?)
            .query(&[("page", page), ("per_page", self.page_size)])
            .header("apikey", self.service_key.expose_secret())
            .bearer_auth(self.service_key.expose_secret())
            .send()
            .await?;

        let page: UserPage = ensure_success(response).await?.json().await?;
        Ok(page.users)
    }
}

async fn ensure_success(response: Response) -> Result<Response, DirectoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(DirectoryError::Status { status, body })
}

#[async_trait]
impl IdentityDirectory for SupabaseDirectory {
    #[instrument(skip_all)]
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, DirectoryError> {
        for page in 1..=self.max_pages {
            let users = self.list_page(page).await?;
            let fetched = users.len();
            trace!(page, fetched, "fetched directory page");

            if let Some(user) = users
                .into_iter()
                .find(|user| user.email.as_deref() == Some(email))
            {
                debug!(user_id = %user.id, "matched directory record");
                return Ok(Some(IdentityRecord {
                    id: user.id,
                    email: email.to_string(),
                }));
            }

            if fetched < self.page_size as usize {
                return Ok(None);
            }
        }

        Err(DirectoryError::ListingTruncated(self.max_pages))
    }

    #[instrument(skip(self, credential))]
    async fn update_credential(
        &self,
        id: &str,
        credential: &TemporaryCredential,
    ) -> Result<(), DirectoryError> {
        let response = self
            .client
            .put(self.user_url(id)?)
            .header("apikey", self.service_key.expose_secret())
            .bearer_auth(self.service_key.expose_secret())
            .json(&CredentialUpdate {
                password: credential.expose(),
            })
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}
