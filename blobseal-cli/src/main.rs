//! `blobseal` — envelope-encrypt files from the command line.
//!
//! Ciphertext is written to the output path and the encryption metadata
//! to a `<output>.encryptiondata` sidecar; both must travel together.
//! Exit codes distinguish the error kinds so scripts can react to a
//! resolver miss differently from tampering.

use anyhow::{Context, Result, anyhow};
use blobseal_crypto::{
    CryptoError, EncryptedBlob, EncryptionMetadata, KeyResolver, RsaKey,
};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Sidecar extension for the metadata attribute value.
const SIDECAR_EXT: &str = "encryptiondata";

#[derive(Parser)]
#[command(name = "blobseal", about = "Client-side envelope encryption for files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an RSA keypair and write it as PKCS#8 PEM.
    Keygen {
        /// Key identifier recorded in metadata of blobs it encrypts.
        #[arg(long)]
        id: String,
        /// Output path for the private key PEM.
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 2048)]
        bits: usize,
    },
    /// Encrypt a file; writes ciphertext plus a metadata sidecar.
    Encrypt {
        input: PathBuf,
        output: PathBuf,
        /// Identifier of the wrapping key.
        #[arg(long)]
        key_id: String,
        /// PEM file holding the wrapping key (private PKCS#8 or public SPKI).
        #[arg(long)]
        key: PathBuf,
    },
    /// Decrypt a file previously produced by `encrypt`.
    Decrypt {
        input: PathBuf,
        output: PathBuf,
        /// Key available for unwrap, as `<id>=<pem-path>`. Repeatable.
        #[arg(long = "key", value_name = "ID=PEM")]
        keys: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// One distinguishable exit code per error kind; 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CryptoError>() {
        Some(CryptoError::KeyNotFound(_)) => 2,
        Some(CryptoError::UnsupportedAlgorithm(_)) => 3,
        Some(CryptoError::KeyMaterialMissing(_)) => 4,
        Some(CryptoError::EncryptionFailed(_)) => 5,
        Some(CryptoError::DecryptionFailed(_)) => 6,
        Some(CryptoError::IntegrityCheckFailed) => 7,
        Some(CryptoError::InvalidMetadata(_)) => 8,
        _ => 1,
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Keygen { id, out, bits } => keygen(&id, &out, bits),
        Commands::Encrypt {
            input,
            output,
            key_id,
            key,
        } => encrypt(&input, &output, &key_id, &key),
        Commands::Decrypt {
            input,
            output,
            keys,
        } => decrypt(&input, &output, &keys),
    }
}

fn keygen(id: &str, out: &Path, bits: usize) -> Result<()> {
    let key = RsaKey::generate(id, bits)?;
    let pem = key.to_pkcs8_pem()?;
    fs::write(out, pem.as_bytes()).with_context(|| format!("writing {}", out.display()))?;
    debug!(id, bits, out = %out.display(), "generated keypair");
    Ok(())
}

/// Loads a PEM as private PKCS#8 first, falling back to public SPKI.
fn load_key(id: &str, path: &Path) -> Result<RsaKey> {
    let pem = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if let Ok(key) = RsaKey::from_pkcs8_pem(id, &pem) {
        return Ok(key);
    }
    Ok(RsaKey::from_public_key_pem(id, &pem)?)
}

fn sidecar_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".");
    name.push(SIDECAR_EXT);
    PathBuf::from(name)
}

fn encrypt(input: &Path, output: &Path, key_id: &str, key_path: &Path) -> Result<()> {
    let key = load_key(key_id, key_path)?;
    let plaintext =
        fs::read(input).with_context(|| format!("reading {}", input.display()))?;

    let blob = blobseal_crypto::encrypt(&plaintext, &key)?;

    fs::write(output, &blob.ciphertext)
        .with_context(|| format!("writing {}", output.display()))?;
    fs::write(sidecar_path(output), blob.metadata.to_attribute()?)
        .with_context(|| format!("writing {}", sidecar_path(output).display()))?;

    debug!(
        key_id,
        plaintext_len = plaintext.len(),
        ciphertext_len = blob.ciphertext.len(),
        "encrypted"
    );
    Ok(())
}

fn decrypt(input: &Path, output: &Path, key_specs: &[String]) -> Result<()> {
    let resolver = KeyResolver::new();
    for spec in key_specs {
        let (id, path) = parse_key_spec(spec)?;
        resolver.register(Arc::new(load_key(&id, &path)?));
    }

    let ciphertext =
        fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let attribute = fs::read_to_string(sidecar_path(input)).map_err(|e| {
        CryptoError::InvalidMetadata(format!(
            "metadata sidecar {} unreadable: {e}",
            sidecar_path(input).display()
        ))
    })?;
    let metadata = EncryptionMetadata::from_attribute(&attribute)?;

    let blob = EncryptedBlob {
        ciphertext,
        metadata,
    };
    let plaintext = blobseal_crypto::decrypt(&blob, &resolver)?;

    fs::write(output, plaintext).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn parse_key_spec(spec: &str) -> Result<(String, PathBuf)> {
    let (id, path) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("key spec {spec:?} is not of the form <id>=<pem-path>"))?;
    if id.is_empty() || path.is_empty() {
        return Err(anyhow!("key spec {spec:?} has an empty id or path"));
    }
    Ok((id.to_string(), PathBuf::from(path)))
}
