//! Bluesky (AT Protocol) client for profile follower counts.
//!
//! Without credentials the public AppView answers `getProfile`. With an
//! `identifier:password` credential a session is opened on the PDS first and
//! the access JWT is sent as a bearer token.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::http::{join_url, normalise_base_url, read_json, HttpSettings};
use crate::retry::retry_with_backoff;

pub const BLUESKY_PUBLIC_BASE: &str = "https://public.api.bsky.app";
pub const BLUESKY_PDS_BASE: &str = "https://bsky.social";

const SERVICE: &str = "bluesky";

#[derive(Clone)]
struct Credentials {
    identifier: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    followers_count: Option<u64>,
}

pub struct BlueskyClient {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl BlueskyClient {
    /// Uses the PDS when `credentials` is set, else the public AppView.
    ///
    /// # Errors
    ///
    /// See [`BlueskyClient::with_base_url`].
    pub fn new(credentials: Option<&str>, settings: &HttpSettings) -> Result<Self, SourceError> {
        let base = if credentials.is_some() {
            BLUESKY_PDS_BASE
        } else {
            BLUESKY_PUBLIC_BASE
        };
        Self::with_base_url(base, credentials, settings)
    }

    /// # Errors
    ///
    /// - [`SourceError::Api`] when `credentials` is not `identifier:password`.
    /// - [`SourceError::InvalidUrl`] for an unparsable base URL.
    /// - [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        base_url: &str,
        credentials: Option<&str>,
        settings: &HttpSettings,
    ) -> Result<Self, SourceError> {
        let credentials = credentials.map(parse_credentials).transpose()?;
        Ok(Self {
            client: settings.build_client()?,
            base_url: normalise_base_url(base_url)?,
            credentials,
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
        })
    }

    /// Reads `followersCount` from `app.bsky.actor.getProfile`.
    ///
    /// # Errors
    ///
    /// - [`SourceError::UnexpectedStatus`] (401) when the session cannot be
    ///   created.
    /// - [`SourceError::MissingField`] when the profile has no count.
    /// - Status and transport errors from either request, after retries.
    pub async fn follower_count(&self, actor: &str) -> Result<u64, SourceError> {
        let access_jwt = match &self.credentials {
            Some(credentials) => Some(self.create_session(credentials).await?),
            None => None,
        };

        let mut url = join_url(&self.base_url, "xrpc/app.bsky.actor.getProfile")?;
        url.query_pairs_mut().append_pair("actor", actor);

        let profile: Profile = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            let access_jwt = access_jwt.clone();
            async move {
                let mut request = self.client.get(url);
                if let Some(jwt) = &access_jwt {
                    request = request.bearer_auth(jwt);
                }
                read_json(request.send().await?, SERVICE).await
            }
        })
        .await?;

        let count = profile.followers_count.ok_or(SourceError::MissingField {
            service: SERVICE,
            field: "followersCount",
        })?;
        tracing::info!(actor, followers = count, "fetched Bluesky followers");
        Ok(count)
    }

    async fn create_session(&self, credentials: &Credentials) -> Result<String, SourceError> {
        let url = join_url(&self.base_url, "xrpc/com.atproto.server.createSession")?;
        let session: Session = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .post(url)
                    .json(&CreateSessionRequest {
                        identifier: &credentials.identifier,
                        password: &credentials.password,
                    })
                    .send()
                    .await?;
                read_json(response, SERVICE).await
            }
        })
        .await?;
        tracing::debug!(identifier = %credentials.identifier, "opened Bluesky session");
        Ok(session.access_jwt)
    }
}

fn parse_credentials(raw: &str) -> Result<Credentials, SourceError> {
    match raw.split_once(':') {
        Some((identifier, password)) if !identifier.is_empty() && !password.is_empty() => {
            Ok(Credentials {
                identifier: identifier.to_owned(),
                password: password.to_owned(),
            })
        }
        _ => Err(SourceError::Api {
            service: SERVICE,
            message: "credentials must be formatted as identifier:password".to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_split_on_first_colon() {
        let creds = parse_credentials("me.bsky.social:app:pass").unwrap();
        assert_eq!(creds.identifier, "me.bsky.social");
        assert_eq!(creds.password, "app:pass");
    }

    #[test]
    fn credentials_without_password_are_rejected() {
        assert!(parse_credentials("me.bsky.social").is_err());
        assert!(parse_credentials("me.bsky.social:").is_err());
        assert!(parse_credentials(":secret").is_err());
    }
}
