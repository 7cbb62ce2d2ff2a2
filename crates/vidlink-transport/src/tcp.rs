use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};

/// Listen backlog. The protocol serves exactly one peer at a time.
pub const LISTEN_BACKLOG: i32 = 1;

/// Connect to a listening receiver (blocking, no retry).
pub fn connect(endpoint: &Endpoint) -> Result<TcpStream> {
    let addr = endpoint.socket_addr();
    let stream =
        TcpStream::connect(addr).map_err(|source| TransportError::Connect { addr, source })?;
    debug!(%addr, family = %endpoint.family(), "connected");
    Ok(stream)
}

/// Apply optional read/write timeouts to a connected stream.
///
/// `None` keeps the default of blocking until the OS reports data, EOF, or an error.
pub fn set_timeouts(
    stream: &TcpStream,
    read: Option<Duration>,
    write: Option<Duration>,
) -> Result<()> {
    stream.set_read_timeout(read)?;
    stream.set_write_timeout(write)?;
    Ok(())
}

/// A bound, listening TCP socket for a single peer.
///
/// The socket is closed when this value is dropped.
pub struct TcpEndpointListener {
    listener: TcpListener,
    endpoint: Endpoint,
}

impl TcpEndpointListener {
    /// Create a socket for the endpoint's family, bind it, and listen with
    /// a backlog of [`LISTEN_BACKLOG`].
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        let listener = listen_socket(endpoint)?;
        info!(addr = %endpoint, family = %endpoint.family(), any = endpoint.is_any(), "listening");
        Ok(Self {
            listener,
            endpoint: *endpoint,
        })
    }

    /// Block until one client connects.
    pub fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok((stream, peer))
    }

    /// The endpoint requested at bind time.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

impl std::fmt::Debug for TcpEndpointListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpEndpointListener")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(unix)]
fn listen_socket(endpoint: &Endpoint) -> Result<TcpListener> {
    use std::io;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    let addr = endpoint.socket_addr();
    let domain = match endpoint {
        Endpoint::V4(_) => libc::AF_INET,
        Endpoint::V6(_) => libc::AF_INET6,
    };
    #[cfg(any(target_os = "linux", target_os = "android"))]
    let sock_type = libc::SOCK_STREAM | libc::SOCK_CLOEXEC;
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    let sock_type = libc::SOCK_STREAM;

    // SAFETY: socket(2) has no memory-safety preconditions; the result is checked below.
    let raw = unsafe { libc::socket(domain, sock_type, 0) };
    if raw < 0 {
        return Err(TransportError::Socket(io::Error::last_os_error()));
    }
    // SAFETY: `raw` is a freshly created descriptor not owned by anything else.
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    let enable: libc::c_int = 1;
    // SAFETY: `enable` outlives the call and the length matches its type.
    let rc = unsafe {
        libc::setsockopt(
            fd.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            (&enable as *const libc::c_int).cast::<libc::c_void>(),
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        tracing::warn!(error = %io::Error::last_os_error(), "SO_REUSEADDR not applied");
    }

    let rc = match endpoint {
        Endpoint::V4(v4) => {
            let sin = sockaddr_v4(v4);
            // SAFETY: `sin` is a fully initialised sockaddr_in and the length matches.
            unsafe {
                libc::bind(
                    fd.as_raw_fd(),
                    (&sin as *const libc::sockaddr_in).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
                )
            }
        }
        Endpoint::V6(v6) => {
            let sin6 = sockaddr_v6(v6);
            // SAFETY: `sin6` is a fully initialised sockaddr_in6 and the length matches.
            unsafe {
                libc::bind(
                    fd.as_raw_fd(),
                    (&sin6 as *const libc::sockaddr_in6).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
                )
            }
        }
    };
    if rc < 0 {
        return Err(TransportError::Bind {
            addr,
            source: io::Error::last_os_error(),
        });
    }

    // SAFETY: `fd` is a bound stream socket owned by this function.
    if unsafe { libc::listen(fd.as_raw_fd(), LISTEN_BACKLOG) } < 0 {
        return Err(TransportError::Bind {
            addr,
            source: io::Error::last_os_error(),
        });
    }

    Ok(TcpListener::from(fd))
}

#[cfg(unix)]
fn sockaddr_v4(addr: &std::net::SocketAddrV4) -> libc::sockaddr_in {
    // SAFETY: sockaddr_in is plain old data and all-zero is a valid value.
    let mut sin: libc::sockaddr_in = unsafe { std::mem::zeroed() };
    sin.sin_family = libc::AF_INET as libc::sa_family_t;
    sin.sin_port = addr.port().to_be();
    sin.sin_addr.s_addr = u32::from_ne_bytes(addr.ip().octets());
    sin
}

#[cfg(unix)]
fn sockaddr_v6(addr: &std::net::SocketAddrV6) -> libc::sockaddr_in6 {
    // SAFETY: sockaddr_in6 is plain old data and all-zero is a valid value.
    let mut sin6: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
    sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
    sin6.sin6_port = addr.port().to_be();
    sin6.sin6_flowinfo = addr.flowinfo();
    sin6.sin6_addr.s6_addr = addr.ip().octets();
    sin6.sin6_scope_id = addr.scope_id();
    sin6
}

// Backlog is left to the platform default here.
#[cfg(not(unix))]
fn listen_socket(endpoint: &Endpoint) -> Result<TcpListener> {
    let addr = endpoint.socket_addr();
    TcpListener::bind(addr).map_err(|source| TransportError::Bind { addr, source })
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn bind_accept_connect_ipv4() {
        let endpoint = Endpoint::parse("127.0.0.1", 0).unwrap();
        let listener = TcpEndpointListener::bind(&endpoint).unwrap();
        let local = listener.local_addr().unwrap();
        assert_ne!(local.port(), 0);

        let handle = std::thread::spawn(move || {
            let mut client = connect(&Endpoint::from(local)).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let (mut server, peer) = listener.accept().unwrap();
        assert!(peer.ip().is_loopback());
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn bind_accept_connect_ipv6_loopback() {
        let endpoint = Endpoint::parse("::1", 0).unwrap();
        // Hosts without IPv6 loopback cannot run this test.
        let Ok(listener) = TcpEndpointListener::bind(&endpoint) else {
            return;
        };
        let local = listener.local_addr().unwrap();
        assert!(local.is_ipv6());

        let handle = std::thread::spawn(move || {
            let mut client = connect(&Endpoint::from(local)).unwrap();
            client.write_all(b"v6").unwrap();
        });

        let (mut server, _peer) = listener.accept().unwrap();
        let mut buf = [0u8; 2];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"v6");

        handle.join().unwrap();
    }

    #[test]
    fn bind_any_address() {
        let endpoint = Endpoint::parse("0.0.0.0", 0).unwrap();
        let listener = TcpEndpointListener::bind(&endpoint).unwrap();
        let local = listener.local_addr().unwrap();
        assert!(local.ip().is_unspecified());
        assert!(listener.endpoint().is_any());
    }

    #[test]
    fn bind_conflict_reports_bind_error() {
        let endpoint = Endpoint::parse("127.0.0.1", 0).unwrap();
        let first = TcpEndpointListener::bind(&endpoint).unwrap();
        let taken = Endpoint::from(first.local_addr().unwrap());

        let err = TcpEndpointListener::bind(&taken).unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));
    }

    #[test]
    fn connect_refused_reports_connect_error() {
        let endpoint = Endpoint::parse("127.0.0.1", 0).unwrap();
        let closed = {
            let listener = TcpEndpointListener::bind(&endpoint).unwrap();
            listener.local_addr().unwrap()
        };

        let err = connect(&Endpoint::from(closed)).unwrap_err();
        assert!(matches!(err, TransportError::Connect { addr, .. } if addr == closed));
    }

    #[test]
    fn timeouts_are_applied() {
        let endpoint = Endpoint::parse("127.0.0.1", 0).unwrap();
        let listener = TcpEndpointListener::bind(&endpoint).unwrap();
        let local = listener.local_addr().unwrap();

        let client = connect(&Endpoint::from(local)).unwrap();
        let read = Some(Duration::from_millis(250));
        let write = Some(Duration::from_secs(2));
        set_timeouts(&client, read, write).unwrap();

        assert_eq!(client.read_timeout().unwrap(), read);
        assert_eq!(client.write_timeout().unwrap(), write);

        set_timeouts(&client, None, None).unwrap();
        assert_eq!(client.read_timeout().unwrap(), None);
    }
}
