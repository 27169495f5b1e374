use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::client::{ClientConfig, DEFAULT_API_URL, DEFAULT_REFERER};
use crate::rate_limit::{ConfigError, WindowPolicy};

pub const DEFAULT_CHAT_MODEL: &str = "mistralai/mistral-small-3.1-24b-instruct:free";
pub const DEFAULT_TONE_MODEL: &str = "arcee-ai/trinity-large-preview:free";

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "tinylm")]
#[command(about = "Rate-limited chatbot and tone rewriter for a hosted completion API")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    // Completion endpoint
    #[arg(long, env = "OPENROUTER_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    // Bearer token for the completion endpoint
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true, default_value = "", global = true)]
    pub api_key: String,

    // Sent as HTTP-Referer
    #[arg(long, default_value = DEFAULT_REFERER, global = true)]
    pub referer: String,

    // Model used for chat
    #[arg(short, long, default_value = DEFAULT_CHAT_MODEL, global = true)]
    pub model: String,

    // Model used for tone rewriting
    #[arg(long, default_value = DEFAULT_TONE_MODEL, global = true)]
    pub tone_model: String,

    #[arg(long, default_value_t = 0.7, global = true)]
    pub temperature: f32,

    // Token cap for chat replies
    #[arg(long, default_value_t = 1000, global = true)]
    pub max_tokens: u32,

    // Token cap for tone rewrites
    #[arg(long, default_value_t = 500, global = true)]
    pub tone_max_tokens: u32,

    // Upstream request timeout in seconds
    #[arg(long, default_value_t = 60, global = true)]
    pub timeout: u64,

    // Rate limit max requests per window
    #[arg(long, default_value_t = 10, global = true)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 60, global = true)]
    pub rate_window: u64,

    // Optional second, longer cap (e.g. 100 per day)
    #[arg(long, global = true)]
    pub daily_limit: Option<u32>,

    #[arg(long, default_value_t = 86_400, global = true)]
    pub daily_window: u64,

    // Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Interactive chat on the terminal
    Chat,
    /// HTTP server for the chat and tone-rewrite endpoints
    Serve {
        // Port to run the server on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

// Request shaping shared by the CLI loop and the web handlers
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub chat_model: String,
    pub tone_model: String,
    pub temperature: f32,
    pub chat_max_tokens: u32,
    pub tone_max_tokens: u32,
}

impl Args {
    pub fn policies(&self) -> Result<Vec<WindowPolicy>, ConfigError> {
        let mut policies = vec![WindowPolicy::per_seconds(self.rate_limit, self.rate_window)?];
        if let Some(daily) = self.daily_limit {
            policies.push(WindowPolicy::per_seconds(daily, self.daily_window)?);
        }
        Ok(policies)
    }

    pub fn client_config(&self, title: &str) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            referer: self.referer.clone(),
            title: title.to_string(),
            timeout: Duration::from_secs(self.timeout),
        }
    }

    pub fn settings(&self) -> CompletionSettings {
        CompletionSettings {
            chat_model: self.model.clone(),
            tone_model: self.tone_model.clone(),
            temperature: self.temperature,
            chat_max_tokens: self.max_tokens,
            tone_max_tokens: self.tone_max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_free_tier_quota() {
        let args = Args::try_parse_from(["tinylm", "chat"]).unwrap();
        let policies = args.policies().unwrap();
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].max_count(), 10);
        assert_eq!(policies[0].duration(), Duration::from_secs(60));
        assert_eq!(args.settings().chat_max_tokens, 1000);
        assert_eq!(args.settings().tone_max_tokens, 500);
    }

    #[test]
    fn daily_limit_adds_second_window() {
        let args =
            Args::try_parse_from(["tinylm", "serve", "--port", "9000", "--daily-limit", "100"])
                .unwrap();
        assert!(matches!(args.command, Command::Serve { port: 9000 }));
        let policies = args.policies().unwrap();
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[1].max_count(), 100);
        assert_eq!(policies[1].duration(), Duration::from_secs(86_400));
    }

    #[test]
    fn zero_rate_limit_is_a_config_error() {
        let args = Args::try_parse_from(["tinylm", "chat", "--rate-limit", "0"]).unwrap();
        assert_eq!(args.policies(), Err(ConfigError::ZeroCount));
    }
}
