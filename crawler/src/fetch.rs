use crate::extract::{parse_question, question_links};
use anyhow::{Context, Result};
use context_core::QuestionRecord;
use reqwest::{Client, StatusCode, Url};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base: Url,
    pub user_agent: String,
    pub page_timeout: Duration,
    pub probe_timeout: Duration,
}

/// Sequential HTTP access to the question browser.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn listing_url(&self, okruh: u32) -> Result<Url> {
        let mut url = self.config.base.join("prohlizeni_otazek.php")?;
        url.query_pairs_mut().append_pair("okruh", &okruh.to_string());
        Ok(url)
    }

    /// Links to every question page of one okruh.
    pub async fn question_links(&self, okruh: u32) -> Result<Vec<Url>> {
        let url = self.listing_url(okruh)?;
        let html = self.get_text(&url).await.with_context(|| format!("fetching listing {url}"))?;
        Ok(question_links(&html, &url))
    }

    /// Fetch and parse one question page. `Ok(None)` means the page was skipped.
    pub async fn scrape_question(&self, url: &Url) -> Result<Option<QuestionRecord>> {
        let html = self.get_text(url).await?;
        let page = match parse_question(&html, url) {
            Ok(page) => page,
            Err(reason) => {
                tracing::warn!(%url, %reason, "skipping question page");
                return Ok(None);
            }
        };

        let mut live: HashSet<Url> = HashSet::new();
        for img in page.image_urls() {
            if self.image_exists(img).await {
                live.insert(img.clone());
            } else {
                tracing::warn!(id = %page.id, image = %img, "image not reachable");
            }
        }
        Ok(Some(page.into_record(|u| live.contains(u))))
    }

    /// HEAD probe; only a 200 counts as existing.
    pub async fn image_exists(&self, url: &Url) -> bool {
        match self
            .client
            .head(url.clone())
            .timeout(self.config.probe_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status() == StatusCode::OK,
            Err(_) => false,
        }
    }

    async fn get_text(&self, url: &Url) -> Result<String> {
        let resp = self
            .client
            .get(url.clone())
            .timeout(self.config.page_timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}
