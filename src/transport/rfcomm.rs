use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::time::Duration;

use async_trait::async_trait;
use bluer::Address;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, error, info, warn};

use super::Transport;
use crate::error::{Error, Result};
use crate::protocol::frame::extract_frames;

// Bluetooth socket constants (from Linux kernel headers)
const AF_BLUETOOTH: libc::c_int = 31;
const BTPROTO_RFCOMM: libc::c_int = 3;

/// Send/receive timeout applied to the socket during the blocking connect.
const CONNECT_TIMEOUT_SECS: libc::time_t = 5;

/// `sockaddr_rc`: RFCOMM socket address (from <bluetooth/rfcomm.h>)
#[repr(C)]
struct SockaddrRc {
    rc_family: u16,
    rc_bdaddr: [u8; 6], // Bluetooth address in little-endian
    rc_channel: u8,
}

/// RFCOMM (SPP) transport over a raw BlueZ socket.
///
/// Connects with a blocking socket so the RFCOMM DLC handshake completes
/// before returning, then switches to tokio async I/O.
pub struct RfcommTransport {
    stream: Option<UnixStream>,
    pending: Vec<u8>,
    read_timeout: Duration,
}

impl RfcommTransport {
    /// `read_timeout` bounds how long `receive_all` waits for more bytes.
    pub fn new(read_timeout: Duration) -> Self {
        Self {
            stream: None,
            pending: Vec::new(),
            read_timeout,
        }
    }

    fn drop_link(&mut self) {
        self.stream = None;
        self.pending.clear();
    }
}

impl Default for RfcommTransport {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[async_trait]
impl Transport for RfcommTransport {
    async fn connect(&mut self, address: &str, port: u8) -> Result<()> {
        let address: Address = address
            .parse()
            .map_err(|e| Error::invalid(format!("bad Bluetooth address '{}': {}", address, e)))?;

        info!("Connecting to {} on RFCOMM channel {}", address, port);
        self.drop_link();

        let fd = tokio::task::spawn_blocking(move || open_rfcomm(address, port))
            .await
            .map_err(|e| Error::Transport(format!("connect task failed: {}", e)))??;

        let std_stream = std::os::unix::net::UnixStream::from(fd);
        std_stream.set_nonblocking(true)?;
        self.stream = Some(UnixStream::from_std(std_stream)?);

        info!("Connected to {} on RFCOMM channel {}", address, port);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("RFCOMM shutdown error: {}", e);
            }
            info!("RFCOMM link closed");
        }
        self.pending.clear();
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        let written = match stream.write_all(data).await {
            Ok(()) => stream.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            error!("RFCOMM write error: {}", e);
            self.drop_link();
            return Err(Error::Transport(format!("write failed: {}", e)));
        }
        Ok(())
    }

    async fn receive_all(&mut self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            frames.extend(extract_frames(&mut self.pending));

            let Some(stream) = self.stream.as_mut() else {
                break;
            };
            match tokio::time::timeout(self.read_timeout, stream.read(&mut chunk)).await {
                // Nothing more within the read window
                Err(_) => break,
                Ok(Ok(0)) => {
                    info!("RFCOMM connection closed (EOF)");
                    self.drop_link();
                    break;
                }
                Ok(Ok(n)) => self.pending.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => {
                    error!("RFCOMM read error: {}", e);
                    self.drop_link();
                    break;
                }
            }
        }

        if !self.pending.is_empty() {
            debug!("{} bytes of a partial frame buffered", self.pending.len());
        }
        frames
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Blocking RFCOMM connect. Runs on a blocking thread.
fn open_rfcomm(address: Address, channel: u8) -> Result<OwnedFd> {
    // SAFETY: plain libc socket calls on a descriptor we own; every pointer
    // passed points at a live, correctly sized local value.
    unsafe {
        let fd = libc::socket(AF_BLUETOOTH, libc::SOCK_STREAM, BTPROTO_RFCOMM);
        if fd < 0 {
            return Err(Error::Transport(format!(
                "failed to create RFCOMM socket: {}",
                std::io::Error::last_os_error()
            )));
        }
        let fd = OwnedFd::from_raw_fd(fd);
        let raw = fd.as_raw_fd();

        let timeout = libc::timeval {
            tv_sec: CONNECT_TIMEOUT_SECS,
            tv_usec: 0,
        };
        for opt in [libc::SO_SNDTIMEO, libc::SO_RCVTIMEO] {
            if libc::setsockopt(
                raw,
                libc::SOL_SOCKET,
                opt,
                &timeout as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::timeval>() as libc::socklen_t,
            ) < 0
            {
                warn!(
                    "setsockopt({}) failed: {}",
                    opt,
                    std::io::Error::last_os_error()
                );
            }
        }

        // BlueZ expects the address little-endian
        let mut rc_bdaddr = address.0;
        rc_bdaddr.reverse();
        let addr = SockaddrRc {
            rc_family: AF_BLUETOOTH as u16,
            rc_bdaddr,
            rc_channel: channel,
        };

        let ret = libc::connect(
            raw,
            &addr as *const _ as *const libc::sockaddr,
            std::mem::size_of::<SockaddrRc>() as libc::socklen_t,
        );
        if ret < 0 {
            return Err(Error::Transport(format!(
                "RFCOMM connect failed: {}",
                std::io::Error::last_os_error()
            )));
        }

        Ok(fd)
    }
}
