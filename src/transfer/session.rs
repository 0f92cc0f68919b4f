use std::fs::File;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::TransferError;
use crate::logging::AUDIT_TARGET;
use crate::server::{Endpoint, EndpointStatus};
use crate::transfer::helpers::display_path;

const PUT_BUF_SIZE: usize = 1024 * 1024;

/// Login material shared by every job in a run. Read-only after load.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub private_key: PathBuf,
    pub passphrase: Option<String>,
}

/// Opens authenticated sessions. One session serves one attempt.
pub trait TransferClient {
    fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Box<dyn RemoteSession>, TransferError>;
}

/// An open session able to put whole files. `close` must be idempotent.
pub trait RemoteSession {
    fn put_file(&mut self, local: &Path, remote: &str) -> Result<(), TransferError>;
    fn close(&mut self);
}

/// Closes the wrapped session when dropped, on success and failure alike.
pub(crate) struct SessionGuard {
    inner: Box<dyn RemoteSession>,
}

impl SessionGuard {
    pub(crate) fn new(inner: Box<dyn RemoteSession>) -> Self {
        Self { inner }
    }

    pub(crate) fn put_file(&mut self, local: &Path, remote: &str) -> Result<(), TransferError> {
        self.inner.put_file(local, remote)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// libssh2-backed client: TCP with timeouts, handshake, public key auth, SFTP.
#[derive(Debug, Clone)]
pub struct Ssh2Client {
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl Default for Ssh2Client {
    fn default() -> Self {
        Self { connect_timeout: Duration::from_secs(10), io_timeout: Duration::from_secs(30) }
    }
}

impl Ssh2Client {
    fn create_tcp_connection(&self, addr: &str) -> Result<TcpStream, TransferError> {
        let mut addrs = addr
            .to_socket_addrs()
            .map_err(|_| TransferError::NoAddress(addr.to_string()))?;
        let sock = addrs.next().ok_or_else(|| TransferError::NoAddress(addr.to_string()))?;
        let tcp = TcpStream::connect_timeout(&sock, self.connect_timeout).map_err(|e| {
            TransferError::Connect { addr: addr.to_string(), msg: e.to_string() }
        })?;
        let _ = tcp.set_read_timeout(Some(self.io_timeout));
        let _ = tcp.set_write_timeout(Some(self.io_timeout));
        Ok(tcp)
    }
}

impl TransferClient for Ssh2Client {
    fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Box<dyn RemoteSession>, TransferError> {
        let addr = endpoint.addr();
        let tcp = self.create_tcp_connection(&addr)?;
        let mut sess = ssh2::Session::new()
            .map_err(|_| TransferError::SessionCreateFailed(addr.clone()))?;
        sess.set_tcp_stream(tcp);
        sess.set_timeout(u32::try_from(self.io_timeout.as_millis()).unwrap_or(u32::MAX));
        sess.handshake().map_err(|e| TransferError::HandshakeFailed {
            addr: addr.clone(),
            msg: e.to_string(),
        })?;
        sess.userauth_pubkey_file(
            &credentials.username,
            None,
            &credentials.private_key,
            credentials.passphrase.as_deref(),
        )
        .map_err(|e| TransferError::AuthFailed { addr: addr.clone(), msg: e.to_string() })?;
        if !sess.authenticated() {
            return Err(TransferError::AuthFailed { addr, msg: "key rejected".to_string() });
        }
        let sftp = sess.sftp().map_err(|e| TransferError::SftpCreateFailed {
            addr: addr.clone(),
            msg: e.to_string(),
        })?;
        tracing::debug!("[session] connected {} as {}", addr, credentials.username);
        Ok(Box::new(Ssh2Session { sess, sftp: Some(sftp), addr, closed: false }))
    }
}

struct Ssh2Session {
    sess: ssh2::Session,
    sftp: Option<ssh2::Sftp>,
    addr: String,
    closed: bool,
}

impl RemoteSession for Ssh2Session {
    fn put_file(&mut self, local: &Path, remote: &str) -> Result<(), TransferError> {
        let sftp = self.sftp.as_ref().ok_or_else(|| TransferError::SftpCreateFailed {
            addr: self.addr.clone(),
            msg: "session already closed".to_string(),
        })?;
        let local_err = |e: std::io::Error| TransferError::LocalIo {
            path: display_path(local).to_string(),
            msg: e.to_string(),
        };
        let remote_err = |msg: String| TransferError::RemoteIo { path: remote.to_string(), msg };

        let mut local_file = File::open(local).map_err(local_err)?;
        let mut remote_file =
            sftp.create(Path::new(remote)).map_err(|e| remote_err(e.to_string()))?;
        let mut buf = vec![0u8; PUT_BUF_SIZE];
        loop {
            match local_file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => remote_file.write_all(&buf[..n]).map_err(|e| remote_err(e.to_string()))?,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(local_err(e)),
            }
        }
        remote_file.flush().map_err(|e| remote_err(e.to_string()))?;
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // the SFTP channel must go before the transport
        self.sftp.take();
        if let Err(e) = self.sess.disconnect(None, "upload finished", None) {
            tracing::debug!("[session] disconnect {} failed: {}", self.addr, e);
        }
    }
}

impl Drop for Ssh2Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens and closes one session per endpoint; no retry, no upload.
pub fn probe_endpoints(
    client: &dyn TransferClient,
    endpoints: &[Endpoint],
    credentials: &Credentials,
) -> Vec<EndpointStatus> {
    endpoints
        .iter()
        .map(|ep| {
            let error = match client.connect(ep, credentials) {
                Ok(sess) => {
                    drop(SessionGuard::new(sess));
                    tracing::info!(target: AUDIT_TARGET, "Successfully connected to {}", ep);
                    None
                }
                Err(e) => {
                    tracing::error!(target: AUDIT_TARGET, "Failed to connect to {}. Error: {}", ep, e);
                    Some(e.to_string())
                }
            };
            EndpointStatus { endpoint: ep.clone(), error }
        })
        .collect()
}
