//! Transfer sessions
//!
//! Receiver: send a fresh RSA public key, read the RSA-sealed AES key, then
//! read one AES data frame and return its plaintext.
//!
//! Sender: read the public key, seal a fresh AES key under it, then send the
//! file as one AES data frame.

use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use rand::rngs::OsRng;
use tracing::{debug, info, warn};

use cypher_crypto::aes::{Aes128, AesKey};
use cypher_crypto::rsa::RsaKeyPair;
use cypher_protocol::message::{
    data_frame, decode_public_key, open_data_frame, open_sealed_key, public_key_frame,
    sealed_key_frame,
};
use cypher_protocol::{read_frame, write_frame};

use crate::config::{AesKeyMode, CliConfig};

/// Summary of a finished transfer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferReport {
    /// Plaintext bytes moved
    pub bytes: usize,
    /// Low bytes of the RSA modulus used for the key exchange
    pub fingerprint: String,
}

/// Draw an AES key in the configured mode
pub fn session_key(mode: AesKeyMode) -> anyhow::Result<AesKey> {
    let key = match mode {
        AesKeyMode::Legacy => AesKey::generate()?,
        AesKeyMode::Uniform => AesKey::generate_uniform()?,
    };
    Ok(key)
}

/// Run the receiving side over `stream` and return the plaintext.
pub fn receive<S: Read + Write>(
    stream: &mut S,
    config: &CliConfig,
) -> anyhow::Result<(Vec<u8>, TransferReport)> {
    let pair = RsaKeyPair::generate_with(config.rsa_bits, config.primality_rounds, &mut OsRng)
        .context("generating session keypair")?;
    let fingerprint = hex::encode(pair.public.fingerprint());
    debug!(%fingerprint, "session keypair ready");

    write_frame(stream, &public_key_frame(&pair.public)).context("sending public key")?;

    let sealed = read_frame(stream, &config.codec).context("reading sealed key")?;
    let key = open_sealed_key(&sealed, &pair.private)?;

    let data = read_frame(stream, &config.codec).context("reading data frame")?;
    let plaintext = open_data_frame(&data, &Aes128::new(&key))?;

    let report = TransferReport {
        bytes: plaintext.len(),
        fingerprint,
    };
    Ok((plaintext, report))
}

/// Run the sending side over `stream`.
pub fn send<S: Read + Write>(
    stream: &mut S,
    plaintext: &[u8],
    config: &CliConfig,
) -> anyhow::Result<TransferReport> {
    let frame = read_frame(stream, &config.codec).context("reading public key")?;
    let public = decode_public_key(&frame)?;
    let fingerprint = hex::encode(public.fingerprint());
    debug!(%fingerprint, "received peer public key");

    let key = session_key(config.aes_key_mode)?;
    write_frame(stream, &sealed_key_frame(&key, &public)).context("sending sealed key")?;
    write_frame(stream, &data_frame(plaintext, &Aes128::new(&key))?).context("sending data")?;

    Ok(TransferReport {
        bytes: plaintext.len(),
        fingerprint,
    })
}

fn prepare(stream: &TcpStream, config: &CliConfig) -> std::io::Result<()> {
    stream.set_read_timeout(config.socket_timeout())?;
    stream.set_write_timeout(config.socket_timeout())?;
    stream.set_nodelay(true)
}

/// Connect to `addr` and send the file at `path`.
pub fn send_file(addr: &str, path: &Path, config: &CliConfig) -> anyhow::Result<TransferReport> {
    let plaintext = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut stream = TcpStream::connect(addr).with_context(|| format!("connecting to {addr}"))?;
    prepare(&stream, config)?;
    info!(peer = %addr, bytes = plaintext.len(), "sending file");
    send(&mut stream, &plaintext, config)
}

fn handle_connection(mut stream: TcpStream, index: u64, config: &CliConfig) -> anyhow::Result<PathBuf> {
    let peer = stream.peer_addr().context("reading peer address")?;
    debug!(%peer, index, "connection ready");
    prepare(&stream, config)?;
    let (plaintext, report) = receive(&mut stream, config)?;

    let path = config.output_dir.join(format!("received-{index}.bin"));
    fs::write(&path, &plaintext).with_context(|| format!("writing {}", path.display()))?;
    info!(%peer, bytes = report.bytes, path = %path.display(), "transfer complete");
    Ok(path)
}

/// Accept connections on `addr`, one thread per connection.
///
/// A failed connection is logged and does not stop the loop.
///
/// With `limit` set, stops after that many connections, waits for their
/// threads and returns the files written. Without it, connection threads
/// are detached and the loop runs until the process ends.
pub fn serve(
    addr: impl ToSocketAddrs,
    config: CliConfig,
    limit: Option<u64>,
) -> anyhow::Result<Vec<PathBuf>> {
    let listener = TcpListener::bind(addr).context("binding listener")?;
    serve_on(listener, config, limit)
}

/// Same as [`serve`] on an already bound listener.
pub fn serve_on(
    listener: TcpListener,
    config: CliConfig,
    limit: Option<u64>,
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    info!(addr = %listener.local_addr()?, "listening");

    let config = Arc::new(config);
    let mut workers = Vec::new();
    let mut index = 0u64;

    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(err) => {
                warn!(%err, "accept failed");
                continue;
            }
        };
        index += 1;
        debug!(index, "accepted connection");

        let config = Arc::clone(&config);
        let worker = thread::Builder::new()
            .name(format!("cypher-conn-{index}"))
            .spawn(move || {
                let result = handle_connection(stream, index, &config);
                if let Err(err) = &result {
                    warn!(index, "transfer failed: {err:#}");
                }
                result
            })?;
        match limit {
            Some(limit) => {
                workers.push(worker);
                if index >= limit {
                    break;
                }
            }
            None => drop(worker),
        }
    }

    let mut written = Vec::new();
    for worker in workers {
        match worker.join() {
            Ok(Ok(path)) => written.push(path),
            Ok(Err(_)) => {}
            Err(_) => warn!("connection thread panicked"),
        }
    }
    Ok(written)
}
