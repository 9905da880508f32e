use std::{
    convert::Infallible,
    future::Future,
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use hyper::server::conn::Http;
use tokio::{
    io::Result as IoResult,
    net::{TcpListener, TcpStream, ToSocketAddrs},
    sync::Notify,
};

use crate::{Endpoint, Request};

/// An HTTP Server.
///
/// # Example
///
/// ```no_run
/// use feather::{endpoint::make_sync, Mux, Server};
///
/// #[tokio::main]
/// async fn main() -> std::io::Result<()> {
///     let app = Mux::new().get("/", make_sync(|_| "hello"));
///     Server::bind("127.0.0.1:3000").await?.run(app).await
/// }
/// ```
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Binds a TCP listener to the specified address.
    pub async fn bind(addr: impl ToSocketAddrs) -> IoResult<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
        })
    }

    /// Returns the local address that this server is bound to.
    pub fn local_addr(&self) -> IoResult<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run this server.
    pub async fn run(self, ep: impl Endpoint + 'static) -> IoResult<()> {
        self.run_with_graceful_shutdown(ep, futures_util::future::pending())
            .await
    }

    /// Run this server until `signal` completes, then wait for the open
    /// connections to finish.
    pub async fn run_with_graceful_shutdown(
        self,
        ep: impl Endpoint + 'static,
        signal: impl Future<Output = ()>,
    ) -> IoResult<()> {
        let ep: Arc<dyn Endpoint> = Arc::new(ep);
        let Server { listener } = self;
        let alive_connections = Arc::new(AtomicUsize::new(0));
        let notify = Arc::new(Notify::new());

        tokio::pin!(signal);

        tracing::info!(addr = %listener.local_addr()?, "listening");
        tracing::info!("server started");

        loop {
            tokio::select! {
                _ = &mut signal => {
                    tracing::info!("initiate graceful shutdown");
                    break;
                },
                res = listener.accept() => {
                    let (socket, remote_addr) = match res {
                        Ok(conn) => conn,
                        Err(err) => {
                            tracing::error!(error = %err, "failed to accept connection");
                            continue;
                        }
                    };

                    let ep = ep.clone();
                    let alive_connections = alive_connections.clone();
                    let notify = notify.clone();

                    alive_connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        serve_connection(socket, remote_addr, ep).await;

                        if alive_connections.fetch_sub(1, Ordering::SeqCst) == 1 {
                            notify.notify_one();
                        }
                    });
                }
            }
        }

        drop(listener);
        if alive_connections.load(Ordering::SeqCst) > 0 {
            tracing::info!("wait for all connections to close.");
            notify.notified().await;
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

async fn serve_connection(socket: TcpStream, remote_addr: SocketAddr, ep: Arc<dyn Endpoint>) {
    let service = hyper::service::service_fn({
        move |req: hyper::Request<hyper::Body>| {
            let ep = ep.clone();
            async move {
                let resp: hyper::Response<hyper::Body> = ep.call(Request::from(req)).await.into();
                Ok::<_, Infallible>(resp)
            }
        }
    });

    if let Err(err) = Http::new().serve_connection(socket, service).await {
        tracing::error!(remote_addr = %remote_addr, error = %err, "connection error");
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        sync::oneshot,
    };

    use super::*;
    use crate::{endpoint::make_sync, Mux};

    #[tokio::test]
    async fn test_serve() {
        let server = Server::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let app = Mux::new().get(
            "/hello/:name",
            make_sync(|req: Request| format!("hello {}", req.param("name"))),
        );
        let handle = tokio::spawn(server.run_with_graceful_shutdown(app, async move {
            let _ = rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /hello/world HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut data = String::new();
        stream.read_to_string(&mut data).await.unwrap();
        assert!(data.starts_with("HTTP/1.1 200 OK"));
        assert!(data.ends_with("hello world"));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
