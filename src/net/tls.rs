//! TLS configuration and certificate provisioning.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::process::Command;

use crate::config::TlsConfig;

/// Subject of generated certificates.
const SELF_SIGNED_SUBJECT: &str = "/C=US/ST=State/L=City/O=Organization/CN=localhost";
const SELF_SIGNED_DAYS: &str = "365";

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("{kind} file not found: {path}")]
    MissingFile { kind: &'static str, path: PathBuf },

    #[error("openssl not found on PATH; install it or supply certificate files")]
    OpensslNotFound,

    #[error("openssl failed: {0}")]
    Openssl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve the TLS settings into a server config, provisioning a
/// self-signed pair first when allowed and needed.
pub async fn prepare_tls(config: &TlsConfig) -> Result<RustlsConfig, TlsError> {
    let present = config.cert_path.exists() && config.key_path.exists();
    if !present && config.auto_provision {
        provision_self_signed(&config.cert_path, &config.key_path).await?;
    }
    load_tls_config(&config.cert_path, &config.key_path).await
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    if !cert_path.exists() {
        return Err(TlsError::MissingFile {
            kind: "Certificate",
            path: cert_path.to_path_buf(),
        });
    }
    if !key_path.exists() {
        return Err(TlsError::MissingFile {
            kind: "Private key",
            path: key_path.to_path_buf(),
        });
    }

    Ok(RustlsConfig::from_pem_file(cert_path, key_path).await?)
}

/// Generate a self-signed RSA certificate for `localhost` with openssl.
///
/// Existing files are left untouched.
pub async fn provision_self_signed(cert_path: &Path, key_path: &Path) -> Result<(), TlsError> {
    if cert_path.exists() && key_path.exists() {
        tracing::info!(cert = %cert_path.display(), key = %key_path.display(), "Certificates already exist");
        return Ok(());
    }

    for path in [cert_path, key_path] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tracing::info!("Creating self-signed certificate");
    let output = Command::new("openssl")
        .args(["req", "-x509", "-newkey", "rsa:4096", "-keyout"])
        .arg(key_path)
        .arg("-out")
        .arg(cert_path)
        .args(["-days", SELF_SIGNED_DAYS, "-nodes", "-subj", SELF_SIGNED_SUBJECT])
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TlsError::OpensslNotFound,
            _ => TlsError::Io(e),
        })?;

    if !output.status.success() {
        return Err(TlsError::Openssl(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    tracing::warn!(
        cert = %cert_path.display(),
        key = %key_path.display(),
        "Self-signed certificate created; browsers will warn"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_files_without_provisioning_fail() {
        let dir = tempfile::tempdir().unwrap();
        let config = TlsConfig {
            enabled: true,
            cert_path: dir.path().join("cert.pem"),
            key_path: dir.path().join("key.pem"),
            auto_provision: false,
        };

        let err = prepare_tls(&config).await.unwrap_err();
        assert!(matches!(err, TlsError::MissingFile { kind: "Certificate", .. }));
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        std::fs::write(&cert, "").unwrap();

        let err = load_tls_config(&cert, &dir.path().join("key.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TlsError::MissingFile { kind: "Private key", .. }));
    }

    #[tokio::test]
    async fn provisioning_skips_existing_pair() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, "cert").unwrap();
        std::fs::write(&key, "key").unwrap();

        provision_self_signed(&cert, &key).await.unwrap();
        assert_eq!(std::fs::read_to_string(&cert).unwrap(), "cert");
    }
}
