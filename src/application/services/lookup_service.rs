use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::domain::entities::{Code, Quote, Tier};
use crate::domain::traits::Store;

/// Resolves a code to the quote a given requester is allowed to see
#[derive(Clone)]
pub struct LookupService {
    store: Arc<dyn Store>,
}

impl LookupService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate raw input and resolve it. Malformed codes never reach the store.
    pub async fn resolve(&self, code: &str, username: Option<&str>) -> Result<Quote, CommandError> {
        let code = Code::parse(code).ok_or_else(CommandError::invalid_lookup_code)?;
        self.resolve_code(&code, username).await
    }

    pub async fn resolve_code(&self, code: &Code, username: Option<&str>) -> Result<Quote, CommandError> {
        let mapping = self
            .store
            .get_output_mapping(code)
            .await?
            .ok_or_else(|| CommandError::NoMappingFound(code.to_string()))?;

        let tier = self.tier_of(username).await?;
        tracing::debug!(code = %code, tier = %tier, "Resolved price lookup");

        Ok(match tier {
            Tier::Special => Quote::Special {
                selling_price: mapping.special_output1,
                cost_price: mapping.special_output2,
            },
            Tier::Normal => Quote::Plain(mapping.normal_output),
        })
    }

    /// Tier of a requester, normal unless a record says otherwise
    pub async fn tier_of(&self, username: Option<&str>) -> Result<Tier, CommandError> {
        let Some(username) = username.filter(|u| !u.is_empty()) else {
            return Ok(Tier::Normal);
        };
        Ok(self.store.get_user_tier(username).await?.unwrap_or_default())
    }
}
