//! In-process stub of the remote worker server.
//!
//! Listens on an ephemeral localhost port, serves each connection on its own
//! thread, and answers every request according to a test-supplied handler.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivateSec1KeyDer};
use rustls::{ServerConfig, ServerConnection, StreamOwned};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage, WebSocket};
use wsworker_client::codec::{HexEnvelope, MsgPackCodec};
use wsworker_client::protocol::Message;

/// What the stub does with a request.
pub enum Action {
    /// Send a reply and keep the connection.
    Reply(Vec<u8>),
    /// Send a reply, then drop the socket without a close handshake.
    ReplyThenDrop(Vec<u8>),
    /// Drop the socket without replying.
    Drop,
}

/// Request as seen by the handler.
pub struct Request {
    /// 1-based index of the connection it arrived on.
    pub connection: usize,
    pub message: Message,
}

pub struct StubServer {
    port: u16,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(usize, Message)>>>,
}

/// Self-signed certificate for `localhost`, valid until 2126.
const CERT_DER: &[u8] = include_bytes!("../fixtures/localhost.cert.der");
/// SEC1 P-256 key matching [`CERT_DER`].
const KEY_DER: &[u8] = include_bytes!("../fixtures/localhost.key.der");

impl StubServer {
    /// Plain `ws://` server.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Action + Send + Sync + 'static,
    {
        Self::spawn(handler, None)
    }

    /// `wss://` server presenting a self-signed certificate.
    pub fn start_tls<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Action + Send + Sync + 'static,
    {
        Self::spawn(handler, Some(tls_config()))
    }

    fn spawn<F>(handler: F, tls: Option<Arc<ServerConfig>>) -> Self
    where
        F: Fn(&Request) -> Action + Send + Sync + 'static,
    {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let accepted = connections.clone();
        let log = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let connection = accepted.fetch_add(1, Ordering::SeqCst) + 1;
                let handler = handler.clone();
                let log = log.clone();
                let tls = tls.clone();
                thread::spawn(move || match tls {
                    Some(config) => {
                        let Ok(session) = ServerConnection::new(config) else {
                            return;
                        };
                        let stream = StreamOwned::new(session, stream);
                        serve(stream, connection, handler.as_ref(), &log);
                    }
                    None => serve(stream, connection, handler.as_ref(), &log),
                });
            }
        });

        Self {
            port,
            connections,
            requests,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Every decoded request with the connection it arrived on.
    pub fn requests(&self) -> Vec<(usize, Message)> {
        self.requests.lock().unwrap().clone()
    }
}

fn tls_config() -> Arc<ServerConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let key = PrivateKeyDer::Sec1(PrivateSec1KeyDer::from(KEY_DER.to_vec()));
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![CertificateDer::from(CERT_DER.to_vec())], key)
        .unwrap();
    Arc::new(config)
}

fn serve<S, F>(stream: S, connection: usize, handler: &F, log: &Mutex<Vec<(usize, Message)>>)
where
    S: Read + Write,
    F: Fn(&Request) -> Action + ?Sized,
{
    let Ok(mut ws) = tungstenite::accept(stream) else {
        return;
    };

    loop {
        let text = match ws.read() {
            Ok(WsMessage::Text(text)) => text,
            // Keep reading so the close reply gets flushed.
            Ok(_) => continue,
            Err(_) => return,
        };

        let payload = HexEnvelope::unwrap(&text).unwrap();
        let message: Message = MsgPackCodec::decode(&payload).unwrap();
        log.lock().unwrap().push((connection, message.clone()));

        match handler(&Request {
            connection,
            message,
        }) {
            Action::Reply(reply) => send(&mut ws, &reply),
            Action::ReplyThenDrop(reply) => {
                send(&mut ws, &reply);
                return;
            }
            Action::Drop => return,
        }
    }
}

fn send<S: Read + Write>(ws: &mut WebSocket<S>, reply: &[u8]) {
    let _ = ws.send(WsMessage::Text(HexEnvelope::wrap(reply)));
}

/// Encode a reply value.
pub fn reply<V: serde::Serialize>(value: &V) -> Vec<u8> {
    MsgPackCodec::encode(value).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
