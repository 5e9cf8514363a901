//! Stream abstraction over TCP sockets and in-process pipes.

use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio::net::TcpStream;

pin_project! {
    /// The client side of a connection: a TCP socket or the client half of
    /// an in-process duplex pipe handed out by a local server.
    #[project = ClientStreamProj]
    pub enum ClientStream {
        Tcp { #[pin] stream: TcpStream },
        Local { #[pin] stream: DuplexStream },
    }
}

impl From<TcpStream> for ClientStream {
    fn from(stream: TcpStream) -> Self {
        ClientStream::Tcp { stream }
    }
}

impl From<DuplexStream> for ClientStream {
    fn from(stream: DuplexStream) -> Self {
        ClientStream::Local { stream }
    }
}

impl AsyncRead for ClientStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.project() {
            ClientStreamProj::Tcp { stream } => stream.poll_read(cx, buf),
            ClientStreamProj::Local { stream } => stream.poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ClientStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.project() {
            ClientStreamProj::Tcp { stream } => stream.poll_write(cx, buf),
            ClientStreamProj::Local { stream } => stream.poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            ClientStreamProj::Tcp { stream } => stream.poll_flush(cx),
            ClientStreamProj::Local { stream } => stream.poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            ClientStreamProj::Tcp { stream } => stream.poll_shutdown(cx),
            ClientStreamProj::Local { stream } => stream.poll_shutdown(cx),
        }
    }
}
