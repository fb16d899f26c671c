//! Command-line arguments

use std::time::Duration;

use clap::Parser;
use llm_core::{Message, Options, ResponseFormat, Thinking};
use llm_runtime::catalog;
use tokio_util::sync::CancellationToken;

/// Send one prompt to a catalog model
#[derive(Debug, Parser)]
#[command(name = "llm-cli", version, about)]
pub struct Cli {
    /// Model name from the catalog
    #[arg(short, long, default_value = catalog::NANO)]
    pub model: String,

    /// System instruction placed before the prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Print deltas as they arrive
    #[arg(long)]
    pub stream: bool,

    /// Ask for a JSON object reply
    #[arg(long)]
    pub json: bool,

    /// Reasoning effort: none, minimal, low, medium or high
    #[arg(long, default_value = "none")]
    pub thinking: Thinking,

    /// Make a single attempt
    #[arg(long)]
    pub no_retry: bool,

    /// Cache lifetime in seconds, 0 disables caching
    #[arg(long, default_value_t = 0)]
    pub cache_secs: u64,

    /// Prompt text; multiple words are joined with spaces
    #[arg(required = true)]
    pub prompt: Vec<String>,
}

impl Cli {
    pub fn conversation(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(Message::system(system.as_str()));
        }
        messages.push(Message::user(self.prompt.join(" ")));
        messages
    }

    pub fn options(&self, cancel: CancellationToken) -> Options {
        let mut options = Options::default()
            .with_thinking(self.thinking)
            .with_cache(Duration::from_secs(self.cache_secs))
            .with_cancel(cancel);
        if self.json {
            options = options.with_response_format(ResponseFormat::JsonObject);
        }
        if self.no_retry {
            options = options.without_retry();
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_core::Role;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["llm-cli", "hello", "world"]).unwrap();
        assert_eq!(cli.model, catalog::NANO);
        assert_eq!(cli.thinking, Thinking::None);

        let conversation = cli.conversation();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation[0].content, "hello world");

        let options = cli.options(CancellationToken::new());
        assert_eq!(options.cache_ttl(), None);
        assert!(!options.no_retry);
        assert!(options.response_format.is_none());
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "llm-cli", "--model", "gpt-5", "--system", "be terse", "--json", "--thinking", "high",
            "--no-retry", "--cache-secs", "60", "--stream", "hi",
        ])
        .unwrap();
        assert!(cli.stream);

        let conversation = cli.conversation();
        assert_eq!(conversation[0].role, Role::System);
        assert_eq!(conversation[1].role, Role::User);

        let options = cli.options(CancellationToken::new());
        assert_eq!(options.thinking, Thinking::High);
        assert_eq!(options.cache_ttl(), Some(Duration::from_secs(60)));
        assert_eq!(options.response_format, Some(ResponseFormat::JsonObject));
        assert!(options.no_retry);
    }

    #[test]
    fn test_prompt_required() {
        assert!(Cli::try_parse_from(["llm-cli"]).is_err());
        assert!(Cli::try_parse_from(["llm-cli", "--thinking", "extreme", "hi"]).is_err());
    }
}
