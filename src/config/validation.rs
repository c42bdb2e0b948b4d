//! Configuration validation logic.

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_tokens(&config.account.tokens)?;
    validate_user_agent(&config.account.user_agent)?;
    validate_page_sizes(config)?;

    Ok(())
}

/// Validate the API token list.
pub fn validate_tokens(tokens: &[String]) -> Result<()> {
    if tokens.is_empty() {
        return Err(Error::MissingConfig("account.tokens".to_string()));
    }

    for token in tokens {
        if token.trim().is_empty() {
            return Err(Error::ConfigValidation {
                field: "account.tokens".to_string(),
                message: "Tokens cannot be empty".to_string(),
            });
        }

        let token_lower = token.to_lowercase();
        if token_lower.contains("replaceme") || token_lower.contains("your_token") {
            return Err(Error::ConfigValidation {
                field: "account.tokens".to_string(),
                message: "Token appears to be a placeholder. Please provide your actual API token."
                    .to_string(),
            });
        }
    }

    Ok(())
}

/// Validate the user agent string.
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    if user_agent.trim().is_empty() {
        return Err(Error::MissingConfig("account.user_agent".to_string()));
    }

    Ok(())
}

fn validate_page_sizes(config: &Config) -> Result<()> {
    for (field, value) in [
        ("options.posts_page_size", config.options.posts_page_size),
        (
            "options.followers_page_size",
            config.options.followers_page_size,
        ),
        (
            "options.following_page_size",
            config.options.following_page_size,
        ),
    ] {
        if value == 0 {
            return Err(Error::ConfigValidation {
                field: field.to_string(),
                message: "Page size must be at least 1".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_list_rejected() {
        assert!(matches!(
            validate_tokens(&[]),
            Err(Error::MissingConfig(_))
        ));
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let tokens = vec!["REPLACEME".to_string()];
        assert!(matches!(
            validate_tokens(&tokens),
            Err(Error::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_valid_tokens_accepted() {
        let tokens = vec!["real-token-1".to_string(), "real-token-2".to_string()];
        assert!(validate_tokens(&tokens).is_ok());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = Config::default();
        config.account.tokens = vec!["tok".to_string()];
        config.options.posts_page_size = 0;
        assert!(matches!(
            validate_config(&config),
            Err(Error::ConfigValidation { .. })
        ));
    }
}
