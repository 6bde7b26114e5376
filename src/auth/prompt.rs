use crate::auth::CodeSource;
use crate::auth::flow::STATE_TOKEN;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use console::Term;
use dialoguer::Input;
use std::io::BufRead;
use tiny_http::{Response, Server};
use tracing::{debug, instrument};
use url::Url;

/// Out-of-band redirect: the provider shows the code for the operator to copy.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Asks the operator to open the URL and paste the resulting code.
///
/// Without a terminal the code is read as one line from standard input, so
/// it can be piped in.
#[derive(Debug, Default, Clone)]
pub struct TerminalPrompt;

#[async_trait]
impl CodeSource for TerminalPrompt {
    fn redirect_uri(&self) -> String {
        OOB_REDIRECT_URI.to_string()
    }

    async fn authorization_code(&self, auth_url: &Url) -> Result<String> {
        println!(
            "Go to the following link in your browser then type the authorization code:\n{}",
            auth_url
        );

        tokio::task::spawn_blocking(|| {
            if !Term::stderr().is_term() {
                debug!("No terminal attached, reading code from stdin");
                return read_code_line(std::io::stdin().lock());
            }

            Input::<String>::new()
                .with_prompt("Authorization code")
                .interact_text()
                .map(|code| code.trim().to_string())
                .map_err(|e| AppError::Auth(format!("Unable to read authorization code: {}", e)))
        })
        .await
        .map_err(|e| AppError::Auth(format!("Prompt task failed: {}", e)))?
    }
}

/// Read the first whitespace-delimited token of one input line.
fn read_code_line<R: BufRead>(mut reader: R) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| AppError::Auth(format!("Unable to read authorization code: {}", e)))?;

    line.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| AppError::Auth("No authorization code supplied".to_string()))
}

/// Receives the code on a one-shot HTTP listener bound to the loopback
/// interface.
#[derive(Debug, Clone)]
pub struct LoopbackReceiver {
    port: u16,
}

impl LoopbackReceiver {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl CodeSource for LoopbackReceiver {
    fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    #[instrument(name = "Waiting for authorization callback", skip_all, fields(port = self.port))]
    async fn authorization_code(&self, auth_url: &Url) -> Result<String> {
        let bind_addr = format!("127.0.0.1:{}", self.port);
        let server = Server::http(&bind_addr)
            .map_err(|e| AppError::Auth(format!("Failed to bind to {}: {}", bind_addr, e)))?;

        println!("Open this URL in your browser:\n{}", auth_url);
        println!();
        println!("Waiting for authorization...");

        let port = self.port;
        tokio::task::spawn_blocking(move || {
            let request = server
                .recv()
                .map_err(|e| AppError::Auth(format!("Failed to receive request: {}", e)))?;

            let outcome = parse_callback(port, request.url());
            let body = match &outcome {
                Ok(_) => "Authentication successful! You can close this window.",
                Err(_) => "Authentication failed. Check the terminal for details.",
            };
            request
                .respond(Response::from_string(body))
                .map_err(|e| AppError::Auth(format!("Failed to send response: {}", e)))?;

            outcome
        })
        .await
        .map_err(|e| AppError::Auth(format!("Callback task failed: {}", e)))?
    }
}

/// Extract the authorization code from the callback request path.
fn parse_callback(port: u16, path: &str) -> Result<String> {
    let callback_url = format!("http://127.0.0.1:{}{}", port, path);
    let url = Url::parse(&callback_url)
        .map_err(|e| AppError::Auth(format!("Failed to parse callback URL: {}", e)))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(AppError::Auth(format!("Authorization denied: {}", error)));
    }

    let state = param("state").ok_or_else(|| AppError::Auth("No state in callback".to_string()))?;
    if state != STATE_TOKEN {
        return Err(AppError::Auth("CSRF token mismatch".to_string()));
    }

    let code = param("code").ok_or_else(|| AppError::Auth("No code in callback".to_string()))?;
    debug!("Received authorization code");

    Ok(code)
}
