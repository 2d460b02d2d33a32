//! Integration tests for the WebSocket transport.
//!
//! These spin up a real WebSocket server and client to verify that data
//! actually flows over the network, rather than testing logic in isolation.

#[cfg(feature = "websocket")]
mod websocket {
    use xiangqi_transport::{Connection, Transport, WebSocketTransport};

    async fn connect_client(
        addr: std::net::SocketAddr,
    ) -> tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    > {
        let url = format!("ws://{addr}");
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have local addr");

        let server_handle =
            tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let mut client_ws = connect_client(addr).await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);

        server_conn
            .send(b"hello from server")
            .await
            .expect("send should succeed");

        use futures_util::StreamExt;
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap(), "hello from server");

        use futures_util::SinkExt;
        use tokio_tungstenite::tungstenite::Message;
        client_ws
            .send(Message::Text("hello from client".into()))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"hello from client");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have local addr");

        let server_handle =
            tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let client_ws = connect_client(addr).await;
        let server_conn = server_handle.await.unwrap();

        use futures_util::SinkExt;
        use tokio_tungstenite::tungstenite::Message;
        let mut client_ws = client_ws;
        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }
}
