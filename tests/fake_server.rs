//! End-to-end tests against an in-process fake MPD server.

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
};

use mpdcover::{client::Client, config::Config, error::ErrorKind};

type Responder = Arc<dyn Fn(&str) -> Vec<u8> + Send + Sync>;

/// Accepts connections forever, greeting each with `greeting` and answering
/// every request line with `respond`.
async fn serve(greeting: &'static str, respond: Responder) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let respond = Arc::clone(&respond);
            tokio::spawn(async move {
                let (reader, mut writer) = socket.into_split();
                writer.write_all(greeting.as_bytes()).await?;

                let mut lines = BufReader::new(reader).lines();
                while let Some(line) = lines.next_line().await? {
                    writer.write_all(&respond(&line)).await?;
                }

                Ok::<_, std::io::Error>(())
            });
        }
    });

    addr
}

fn client(addr: SocketAddr) -> Client {
    Client::new(Config {
        host: addr.ip().to_string(),
        port: addr.port(),
        timeout: Some(Duration::from_secs(5)),
    })
}

fn picture() -> Vec<u8> {
    (0..20_000u32).map(|i| (i % 251) as u8).collect()
}

/// Serves `picture()` for `albumart` in chunks of at most 8 KiB.
fn albumart(requests: Arc<AtomicUsize>) -> Responder {
    Arc::new(move |line: &str| {
        requests.fetch_add(1, Ordering::SeqCst);

        let Some(offset) = line
            .strip_prefix("albumart \"Can/Tago Mago/01 Paperhouse.flac\" ")
            .and_then(|offset| offset.parse::<usize>().ok())
        else {
            return b"ACK [50@0] {albumart} No file exists\n".to_vec();
        };

        let data = picture();
        let chunk = &data[offset..data.len().min(offset + 8192)];

        let mut response = format!("size: {}\nbinary: {}\n", data.len(), chunk.len()).into_bytes();
        response.extend_from_slice(chunk);
        response.extend_from_slice(b"\nOK\n");
        response
    })
}

#[tokio::test]
async fn status() {
    let addr = serve(
        "OK MPD 0.23.5\n",
        Arc::new(|line: &str| match line {
            "status" => b"volume: 50\nrepeat: 0\nOK\n".to_vec(),
            _ => b"ACK [5@0] {} unknown command\n".to_vec(),
        }),
    )
    .await;

    let response = client(addr).execute("status").await.unwrap();
    assert_eq!(response.len(), 2);
    assert_eq!(response["volume"], "50");
    assert_eq!(response["repeat"], "0");
}

#[tokio::test]
async fn unknown_command() {
    let addr = serve(
        "OK MPD 0.23.5\n",
        Arc::new(|_: &str| b"ACK [5@0] {} unknown command \"foo\"\n".to_vec()),
    )
    .await;

    let err = client(addr).execute("foo").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Protocol);
    assert_eq!(err.error.to_string(), "[5@0] {} unknown command \"foo\"");
}

#[tokio::test]
async fn handshake_rejected() {
    let addr = serve("SSH-2.0-OpenSSH_9.6\n", Arc::new(|_: &str| Vec::new())).await;

    let err = client(addr).execute("status").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Handshake);
    assert_eq!(err.error.to_string(), "SSH-2.0-OpenSSH_9.6");
}

#[tokio::test]
async fn connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).execute("status").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Connection);
}

#[tokio::test]
async fn hung_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept, then never send a greeting.
    tokio::spawn(async move {
        let mut sockets = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            sockets.push(socket);
        }
    });

    let client = Client::new(Config {
        host: addr.ip().to_string(),
        port: addr.port(),
        timeout: Some(Duration::from_millis(200)),
    });

    let err = client.execute("status").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DeadlineExceeded);
}

#[tokio::test]
async fn cover_to_file() {
    let requests = Arc::new(AtomicUsize::new(0));
    let addr = serve("OK MPD 0.24.0\n", albumart(Arc::clone(&requests))).await;
    let client = client(addr);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cover.jpg");
    let mut file = tokio::fs::File::create(&path).await.unwrap();

    let size = client
        .download_cover("Can/Tago Mago/01 Paperhouse.flac", &mut file)
        .await
        .unwrap();
    drop(file);

    assert_eq!(size, 20_000);
    assert_eq!(requests.load(Ordering::SeqCst), 3);
    assert_eq!(tokio::fs::read(&path).await.unwrap(), picture());
}

#[tokio::test]
async fn cover_twice_into_same_sink() {
    let addr = serve("OK MPD 0.24.0\n", albumart(Arc::new(AtomicUsize::new(0)))).await;
    let client = client(addr);

    let mut sink = std::io::Cursor::new(Vec::new());
    client
        .download_cover("Can/Tago Mago/01 Paperhouse.flac", &mut sink)
        .await
        .unwrap();
    let first = sink.get_ref().clone();

    client
        .download_cover("Can/Tago Mago/01 Paperhouse.flac", &mut sink)
        .await
        .unwrap();

    assert_eq!(sink.get_ref(), &first);
    assert_eq!(first, picture());
}

#[tokio::test]
async fn missing_cover() {
    let addr = serve("OK MPD 0.24.0\n", albumart(Arc::new(AtomicUsize::new(0)))).await;

    let mut sink = std::io::Cursor::new(Vec::new());
    let err = client(addr)
        .download_cover("nope.flac", &mut sink)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Protocol);
    assert!(err.ack().is_some_and(|ack| ack.is_no_exist()));
}

#[tokio::test]
async fn current_file() {
    let addr = serve(
        "OK MPD 0.23.5\n",
        Arc::new(|line: &str| match line {
            "currentsong" => {
                b"file: Can/Tago Mago/01 Paperhouse.flac\nTitle: Paperhouse\nOK\n".to_vec()
            }
            _ => b"ACK [5@0] {} unknown command\n".to_vec(),
        }),
    )
    .await;

    let file = client(addr).current_file().await.unwrap();
    assert_eq!(file.as_deref(), Some("Can/Tago Mago/01 Paperhouse.flac"));
}
