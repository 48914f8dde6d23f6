//! OAuth2 credential provider for the Gmail API
//!
//! Consumed once at startup: a hub returned here is valid for the duration
//! of one invocation, and re-authentication mid-run is not the engine's
//! concern. Tokens persist to a cache file between runs; destructive runs
//! may discard the cache afterwards via [`discard_cached_token`].

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use std::env;
use std::path::Path;
use yup_oauth2::ApplicationSecret;

use crate::error::{Result, SweepError};

/// Scopes for the full cleanup workflow, requested together at
/// authentication time so one consent covers every command
///
/// - gmail.modify: listing, header reads, trash (no permanent deletion)
/// - gmail.settings.basic: filter creation
pub const REQUIRED_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.settings.basic",
];

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Initialize a Gmail API hub with OAuth2 authentication
///
/// Sets up the complete Gmail API client with:
/// - OAuth2 InstalledFlow (desktop app flow, opens a browser)
/// - Token persistence to disk for automatic refresh
/// - HTTP/1 client with TLS support
///
/// # Arguments
/// * `credentials_path` - Path to the OAuth2 credentials JSON file
/// * `token_cache_path` - Path where access tokens will be cached
pub async fn initialize_gmail_hub(
    credentials_path: &Path,
    token_cache_path: &Path,
) -> Result<GmailHub> {
    let secret = resolve_application_secret(credentials_path).await?;

    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_cache_path)
    .build()
    .await
    .map_err(|e| SweepError::Auth(format!("Failed to build authenticator: {}", e)))?;

    // Pre-authenticate so the token is cached with the full scope set;
    // asking per-call would trigger extra OAuth flows.
    let _token = auth
        .token(REQUIRED_SCOPES)
        .await
        .map_err(|e| SweepError::Auth(format!("Failed to obtain token: {}", e)))?;

    // The cache now holds a refresh token; owner-only access
    if token_cache_path.exists() {
        secure_token_file(token_cache_path).await?;
    }

    // HTTP/1 for compatibility with google-gmail1
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| SweepError::Auth(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}

/// Remove the cached token file, forcing a fresh OAuth flow next run.
///
/// A missing file is not an error; the cache is already gone.
pub async fn discard_cached_token(token_cache_path: &Path) -> Result<()> {
    match tokio::fs::remove_file(token_cache_path).await {
        Ok(()) => {
            tracing::info!("Removed token cache at {:?}", token_cache_path);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Resolve the OAuth2 application secret: from the credentials file when it
/// exists, otherwise from environment variables.
pub async fn resolve_application_secret(credentials_path: &Path) -> Result<ApplicationSecret> {
    if credentials_path.exists() {
        yup_oauth2::read_application_secret(credentials_path)
            .await
            .map_err(|e| SweepError::Auth(format!("Failed to read credentials: {}", e)))
    } else {
        tracing::warn!(
            "Credentials file not found at {:?}, trying environment variables",
            credentials_path
        );
        load_credentials_from_env()
    }
}

/// Load OAuth2 credentials from environment variables, for deployments
/// that avoid credential files.
///
/// # Environment Variables
/// - `GMAIL_CLIENT_ID`: OAuth2 client ID
/// - `GMAIL_CLIENT_SECRET`: OAuth2 client secret
/// - `GMAIL_REDIRECT_URI`: Redirect URI (optional, defaults to http://localhost:8080)
pub fn load_credentials_from_env() -> Result<ApplicationSecret> {
    let client_id = env::var("GMAIL_CLIENT_ID")
        .map_err(|_| SweepError::Config("GMAIL_CLIENT_ID not set".to_string()))?;
    let client_secret = env::var("GMAIL_CLIENT_SECRET")
        .map_err(|_| SweepError::Config("GMAIL_CLIENT_SECRET not set".to_string()))?;
    let redirect_uri =
        env::var("GMAIL_REDIRECT_URI").unwrap_or_else(|_| "http://localhost:8080".to_string());

    Ok(ApplicationSecret {
        client_id,
        client_secret,
        auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
        redirect_uris: vec![redirect_uri],
        ..Default::default()
    })
}

/// Secure token file permissions on Unix systems
///
/// Sets file permissions to 0600 (read/write for owner only)
/// to prevent unauthorized access to OAuth2 tokens
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600); // Read/write for owner only
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Secure token file on Windows (stub implementation)
///
/// Windows uses ACLs instead of Unix permissions; in production this
/// should use win32 APIs to set appropriate ACLs
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
