// tests/ws_push.rs

use std::error::Error;
use std::net::SocketAddr;

use futures::StreamExt;
use recoverd::http::{AppState, serve_on};
use recoverd_test_utils::scratch::Scratch;
use recoverd_test_utils::{init_tracing, with_timeout};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type TestResult = Result<(), Box<dyn Error>>;
type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Serve `state` on an ephemeral port; dropping the sender stops the server.
async fn spawn_server(state: AppState) -> Result<(SocketAddr, oneshot::Sender<()>), Box<dyn Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown = async {
            let _ = stop_rx.await;
        };
        if let Err(e) = serve_on(listener, state, shutdown).await {
            tracing::error!(error = ?e, "test server failed");
        }
    });

    Ok((addr, stop_tx))
}

async fn connect(addr: SocketAddr) -> Result<Client, Box<dyn Error>> {
    let (client, _response) = connect_async(format!("ws://{addr}/ws")).await?;
    Ok(client)
}

/// Read JSON frames up to and including `recovery_complete`.
async fn read_run(client: &mut Client) -> Result<Vec<Value>, Box<dyn Error>> {
    let mut frames = Vec::new();
    while let Some(msg) = client.next().await {
        let Message::Text(text) = msg? else {
            continue;
        };
        let value: Value = serde_json::from_str(&text)?;
        let done = value["event"] == "recovery_complete";
        frames.push(value);
        if done {
            return Ok(frames);
        }
    }
    Err("socket closed before recovery_complete".into())
}

#[tokio::test]
async fn connected_browsers_receive_log_lines_then_completion() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let state = scratch.state(scratch.config().with_script("echo step1; echo step2").build());
        let (addr, _stop) = spawn_server(state.clone()).await?;

        let mut first = connect(addr).await?;
        let mut second = connect(addr).await?;

        state.supervisor.start().await?;

        let expected = vec![
            json!({"event": "log_update", "data": "step1"}),
            json!({"event": "log_update", "data": "step2"}),
            json!({"event": "recovery_complete", "success": true}),
        ];
        assert_eq!(read_run(&mut first).await?, expected);
        assert_eq!(read_run(&mut second).await?, expected);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn launch_failure_reaches_browsers_as_failed_completion() -> TestResult {
    with_timeout(async {
        init_tracing();
        let scratch = Scratch::new();
        let state = scratch.state(
            scratch
                .config()
                .with_command("/nonexistent/recovery.sh", &[])
                .build(),
        );
        let (addr, _stop) = spawn_server(state.clone()).await?;
        let mut client = connect(addr).await?;

        assert!(state.supervisor.start().await.is_err());

        assert_eq!(
            read_run(&mut client).await?,
            vec![json!({"event": "recovery_complete", "success": false})]
        );
        Ok(())
    })
    .await
}
