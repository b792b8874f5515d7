//! Credential server
//!
//! A development stand-in for the credential-issuing service: answers
//! `GET /session` with the configured `{apiKey, sessionId, token}`.

use anyhow::{anyhow, Result};
use rouille::{Request, Response, Server};
use tracing::info;

use crate::config::ServerArgs;
use crate::model::Credentials;
use crate::util::init_log;

pub fn main(args: ServerArgs) -> Result<()> {
    init_log();

    let server = bind(&args.bind, args.credentials())?;
    info!(
        "Serving credentials on http://{}/session",
        server.server_addr()
    );

    server.run();
    Ok(())
}

/// Bind the server without starting it. Use `run()` or `stoppable()` on the
/// result.
pub fn bind(
    addr: &str,
    credentials: Credentials,
) -> Result<Server<impl Fn(&Request) -> Response + Send + Sync + 'static>> {
    Server::new(addr, move |request| session_request(request, &credentials))
        .map_err(|e| anyhow!("starting the credential server on {addr}: {e}"))
}

fn session_request(request: &Request, credentials: &Credentials) -> Response {
    info!("{} {}", request.method(), request.url());

    if request.method() != "GET" {
        return Response::text("method not allowed").with_status_code(405);
    }

    match request.url().as_str() {
        "/session" => Response::json(credentials)
            .with_additional_header("Access-Control-Allow-Origin", "*"),
        _ => Response::empty_404(),
    }
}
