//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::assistant::{AssistantError, ClaudeClient, SpeechClient};
use crate::config::{StoreRules, StorefrontConfig};
use crate::services::RateBoard;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    rates: RateBoard,
    claude: Option<ClaudeClient>,
    speech: Option<SpeechClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// AI clients are only built when their API keys are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured AI client can't be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, AssistantError> {
        let claude = config.claude.as_ref().map(ClaudeClient::new).transpose()?;
        let speech = config.speech.as_ref().map(SpeechClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                rates: RateBoard::new(),
                claude,
                speech,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Store rules: shipping, exchange deduction, stock threshold, time zone.
    #[must_use]
    pub fn rules(&self) -> &StoreRules {
        &self.inner.config.store
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The cached market-rate board.
    #[must_use]
    pub fn rates(&self) -> &RateBoard {
        &self.inner.rates
    }

    /// Claude client, or `NotConfigured` when `ANTHROPIC_API_KEY` is unset.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::NotConfigured` if chat is disabled.
    pub fn claude(&self) -> Result<&ClaudeClient, AssistantError> {
        self.inner
            .claude
            .as_ref()
            .ok_or(AssistantError::NotConfigured("The shopping assistant"))
    }

    /// Speech client, or `NotConfigured` when `OPENAI_API_KEY` is unset.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::NotConfigured` if speech is disabled.
    pub fn speech(&self) -> Result<&SpeechClient, AssistantError> {
        self.inner
            .speech
            .as_ref()
            .ok_or(AssistantError::NotConfigured("Voice support"))
    }
}
