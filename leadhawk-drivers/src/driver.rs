use crate::behavioral::BehavioralEngine;
use crate::fingerprint::UserAgentManager;
use crate::stealth::{build_stealth_arguments, StealthScripts};
use anyhow::Result;
use fantoccini::{Client, ClientBuilder};
use leadhawk_common::StealthLevel;
use serde_json::json;
use std::collections::HashMap;
use webdriver::capabilities::Capabilities;

/// Thin wrapper around a `fantoccini` WebDriver client that applies a
/// session fingerprint on connect and JS evasions on every navigation.
pub struct StealthDriver {
    client: Client,
    behavioral: BehavioralEngine,
    stealth_level: StealthLevel,
    user_agents: UserAgentManager,
}

impl StealthDriver {
    /// Connect to a running WebDriver service (e.g. Chromedriver).
    pub async fn connect(
        webdriver_url: &str,
        headless: bool,
        stealth_level: StealthLevel,
    ) -> Result<Self> {
        let mut user_agents = UserAgentManager::new();
        let profile = user_agents.session_profile().clone();

        let mut args = build_stealth_arguments(stealth_level, &profile);
        if headless {
            args.push("--headless".to_string());
            args.push("--disable-gpu".to_string());
        }

        let mut chrome_opts = HashMap::new();
        chrome_opts.insert("args".to_string(), json!(args));

        let mut caps = Capabilities::new();
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        tracing::debug!(
            webdriver_url,
            headless,
            user_agent = %profile.user_agent,
            "browser.session.connect"
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await?;

        Ok(Self {
            client,
            behavioral: BehavioralEngine::new(),
            stealth_level,
            user_agents,
        })
    }

    /// Navigate to `url` with human-like pacing and apply the evasion
    /// scripts appropriate for this session's stealth level.
    pub async fn goto(&mut self, url: &str) -> Result<()> {
        self.behavioral.random_delay(300, 1200).await;
        self.client.goto(url).await?;
        self.apply_evasions().await
    }

    async fn apply_evasions(&mut self) -> Result<()> {
        self.client
            .execute(StealthScripts::core_evasions(), vec![])
            .await?;

        match self.stealth_level {
            StealthLevel::Lightweight => {}
            StealthLevel::Balanced => {
                self.client
                    .execute(StealthScripts::canvas_evasions(), vec![])
                    .await?;
            }
            StealthLevel::Maximum => {
                self.client
                    .execute(StealthScripts::canvas_evasions(), vec![])
                    .await?;
                self.client
                    .execute(StealthScripts::webgl_evasions(), vec![])
                    .await?;

                let platform = self.user_agents.session_profile().platform.clone();
                self.client
                    .execute(
                        &format!(
                            "Object.defineProperty(navigator, 'platform', {{ get: () => '{}' }});",
                            platform
                        ),
                        vec![],
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// Linger on the page briefly, the way a reader would.
    pub async fn dwell(&self) {
        self.behavioral.random_delay(800, 2500).await;
    }

    /// Return the full page HTML source.
    pub async fn page_source(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::from)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
