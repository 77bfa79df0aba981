//! Scripted lottery server for socket-level tests.

use std::net::SocketAddr;

use frames::BetRecord;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Replies for one accepted connection: the n-th received frame is answered
/// with the n-th entry, `None` meaning "read it but stay silent". The server
/// hangs up once the script is exhausted.
pub type ConnScript = Vec<Option<&'static str>>;

pub struct ScriptedServer {
    pub addr: SocketAddr,
    task: JoinHandle<Vec<Vec<String>>>,
}

impl ScriptedServer {
    /// Bind to an ephemeral port and serve one connection per script entry, in order.
    pub async fn start(script: Vec<ConnScript>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let task = tokio::spawn(async move {
            let mut sessions = Vec::with_capacity(script.len());
            for replies in script {
                let (stream, _) = listener.accept().await.expect("accept");
                sessions.push(serve(stream, replies).await);
            }
            sessions
        });
        Self { addr, task }
    }

    /// Wait for every scripted connection to close and return the frames
    /// received on each, as text.
    pub async fn finish(self) -> Vec<Vec<String>> {
        self.task.await.expect("server task")
    }
}

async fn serve(stream: TcpStream, replies: ConnScript) -> Vec<String> {
    let mut stream = BufReader::new(stream);
    let mut received = Vec::new();

    for reply in replies {
        let Ok(payload) = frames::read_frame(&mut stream).await else {
            break;
        };
        received.push(String::from_utf8(payload).expect("utf-8 payload"));
        if let Some(line) = reply {
            if frames::write_line(&mut stream, line).await.is_err() {
                break;
            }
        }
    }
    received
}

pub fn sample_bets(count: usize) -> Vec<BetRecord> {
    (0..count)
        .map(|i| BetRecord {
            agency_id: "1".to_owned(),
            first_name: format!("Name{i}"),
            last_name: "Lopez".to_owned(),
            document: format!("{}", 30_000_000 + i),
            birthdate: "1990-05-12".to_owned(),
            number: format!("{:04}", i * 7),
        })
        .collect()
}
