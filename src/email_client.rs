use anyhow::Context;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};

use crate::configuration::EmailClientSettings;
use crate::domain::UserEmail;

/// Client for the transactional email API used to reach users.
pub struct EmailClient {
    sender: UserEmail,
    http_client: Client,
    base_url: Url,
    authorization_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: UserEmail,
        authorization_token: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, anyhow::Error> {
        let base_url = Url::parse(&base_url).context("Failed to parse the email API base url")?;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the email API http client")?;

        Ok(Self {
            http_client,
            base_url,
            sender,
            authorization_token,
        })
    }

    pub fn from_settings(settings: &EmailClientSettings) -> Result<Self, anyhow::Error> {
        let sender = settings.sender().map_err(anyhow::Error::msg)?;
        Self::new(
            settings.base_url.clone(),
            sender,
            settings.authorization_token.clone(),
            settings.timeout(),
        )
    }

    #[tracing::instrument(name = "Send an email", skip(self, html_content, text_content))]
    pub async fn send_email(
        &self,
        recipient: &UserEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), reqwest::Error> {
        // joining a path onto a parsed http(s) url cannot fail
        let mut url = self.base_url.clone();
        url.set_path("/email");

        let request_body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: recipient.as_ref(),
            subject,
            html_body: html_content,
            text_body: text_content,
        };

        self.http_client
            .post(url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await?
            // `send` only fails on transport errors; non-2xx statuses are checked here
            .error_for_status()?;

        Ok(())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}
