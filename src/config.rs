//! Command line and environment configuration.

use clap::{Args, Parser, Subcommand};

use crate::credentials::CredentialSource;
use crate::error::{CallError, SdkError, WORKFLOW_ERROR_CODE};
use crate::model::{Credentials, InsertMode, MediaOptions, Stream};
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::session::{SessionConfig, DEFAULT_MAX_PUBLISH_ATTEMPTS};
use crate::sim::{Outcome, SimScript};

#[derive(Debug, Parser)]
#[command(name = "call-session", version, about = "Video call session runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Join a call session
    Call(CallArgs),
    /// Serve session credentials on GET /session
    Server(ServerArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CallArgs {
    #[arg(long, env = "API_KEY")]
    pub api_key: Option<String>,

    #[arg(long, env = "SESSION_ID")]
    pub session_id: Option<String>,

    #[arg(long, env = "TOKEN")]
    pub token: Option<String>,

    /// Credential server queried when static credentials are incomplete
    #[arg(long, env = "SAMPLE_SERVER_BASE_URL")]
    pub server_url: Option<String>,

    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_init_attempts: u32,

    #[arg(long, default_value_t = DEFAULT_MAX_PUBLISH_ATTEMPTS)]
    pub max_publish_attempts: u32,

    #[arg(long, default_value = "100%")]
    pub width: String,

    #[arg(long, default_value = "100%")]
    pub height: String,

    #[arg(long, default_value = "append")]
    pub insert_mode: InsertMode,

    /// Publisher initializations that fail before one succeeds
    #[arg(long, default_value_t = 0)]
    pub sim_init_failures: u32,

    /// Publish calls that fail with a workflow error before one succeeds
    #[arg(long, default_value_t = 0)]
    pub sim_publish_failures: u32,

    /// Remote stream ids announced after connecting
    #[arg(long = "sim-stream")]
    pub sim_streams: Vec<String>,

    /// Report the platform as lacking WebRTC support
    #[arg(long)]
    pub sim_unsupported_platform: bool,

    /// Raise a global SDK exception once connecting starts
    #[arg(long)]
    pub simulate_exception: bool,
}

impl CallArgs {
    pub fn credential_source(&self) -> Result<CredentialSource, CallError> {
        let static_credentials = Credentials::from_parts(
            self.api_key.as_deref(),
            self.session_id.as_deref(),
            self.token.as_deref(),
        );
        CredentialSource::select(static_credentials, self.server_url.as_deref())
    }

    pub fn session_config(&self) -> SessionConfig {
        let options = MediaOptions {
            insert_mode: self.insert_mode,
            width: self.width.clone(),
            height: self.height.clone(),
        };

        SessionConfig {
            publisher_options: options.clone(),
            subscriber_options: options,
            init_policy: RetryPolicy::new(self.max_init_attempts),
            max_publish_attempts: self.max_publish_attempts,
            ..SessionConfig::default()
        }
    }

    pub fn sim_script(&self) -> SimScript {
        let workflow = |n: u32, what: &str| -> Vec<Outcome> {
            (1..=n)
                .map(|i| {
                    Outcome::Fail(SdkError::new(
                        WORKFLOW_ERROR_CODE,
                        format!("simulated {what} failure {i}"),
                    ))
                })
                .collect()
        };

        SimScript {
            init: workflow(self.sim_init_failures, "publisher initialization"),
            publish: workflow(self.sim_publish_failures, "publish"),
            remote_streams: self
                .sim_streams
                .iter()
                .map(|id| Stream::new(id.as_str(), format!("connection-{id}")))
                .collect(),
            unsupported_platform: self.sim_unsupported_platform,
            ..SimScript::default()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    #[arg(long, default_value = "0.0.0.0:3000")]
    pub bind: String,

    #[arg(long, env = "API_KEY")]
    pub api_key: String,

    #[arg(long, env = "SESSION_ID")]
    pub session_id: String,

    #[arg(long, env = "TOKEN")]
    pub token: String,
}

impl ServerArgs {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.api_key, &self.session_id, &self.token)
    }
}
