//! Remote console (RCON) command executor.
//!
//! Speaks the Source-style RCON framing used by Minecraft servers:
//! little-endian i32 length prefix, i32 request id, i32 packet type,
//! NUL-terminated body, trailing NUL. Auth packets are type 3; the server
//! signals a bad password by echoing request id -1.
//!
//! The executor owns one lazily-established, authenticated connection per
//! configured server. Commands against the same server are serialized (the
//! protocol is not safely pipelined); different servers proceed
//! independently. Any connect/send failure drops the cached connection and
//! retries the whole connect+send cycle with a fixed pause, up to a
//! bounded attempt count.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{RconConfig, RconServerConfig};

/// SERVERDATA_AUTH
const PACKET_TYPE_AUTH: i32 = 3;
/// SERVERDATA_EXECCOMMAND (also SERVERDATA_AUTH_RESPONSE on the wire)
const PACKET_TYPE_EXEC: i32 = 2;

/// Upper bound on a response body we are willing to read.
const MAX_PACKET_BODY: usize = 1 << 20;

lazy_static! {
    /// Minecraft legacy color/format codes: section sign plus one code char.
    static ref COLOR_CODE_RE: Regex = Regex::new("(?i)§[0-9a-fk-or]").expect("valid regex");
}

/// Errors surfaced by the executor.
#[derive(Debug, Error)]
pub enum RconError {
    #[error("unknown server id '{0}'")]
    UnknownServer(String),

    #[error("authentication rejected by server")]
    AuthRejected,

    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request timed out")]
    Timeout,

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("command failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// One entry parsed from the server's player-list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlinePlayer {
    pub role: String,
    pub name: String,
}

/// The seam the fulfillment dispatcher depends on, so tests can run
/// against a fake instead of a live socket.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Sends one command and returns the raw response text.
    async fn execute(&self, server_id: &str, command: &str) -> Result<String, RconError>;

    /// Server used when a product's execution config names none.
    fn default_server_id(&self) -> &str;
}

/// Encodes one RCON packet: length-prefixed id + type + body + two NULs.
fn encode_packet(id: i32, packet_type: i32, body: &str) -> Vec<u8> {
    let length = 4 + 4 + body.len() + 2;
    let mut buf = Vec::with_capacity(4 + length);
    buf.extend_from_slice(&(length as i32).to_le_bytes());
    buf.extend_from_slice(&id.to_le_bytes());
    buf.extend_from_slice(&packet_type.to_le_bytes());
    buf.extend_from_slice(body.as_bytes());
    buf.extend_from_slice(&[0, 0]);
    buf
}

/// Strips legacy color codes from a server response.
fn strip_color_codes(text: &str) -> String {
    COLOR_CODE_RE.replace_all(text, "").into_owned()
}

/// Parses a line-oriented `role: name` listing into structured entries.
/// Unparseable or empty lines are skipped, not fatal.
fn parse_player_list(response: &str) -> Vec<OnlinePlayer> {
    let clean = strip_color_codes(response);
    let mut players = Vec::new();

    for line in clean.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((role, name)) = line.split_once(':') else {
            continue;
        };
        let role = role.trim();
        let name = name.trim();
        if role.is_empty() || name.is_empty() {
            continue;
        }

        let mut chars = role.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
            None => continue,
        };

        players.push(OnlinePlayer {
            role: capitalized,
            name: name.to_string(),
        });
    }

    players
}

/// A live, authenticated connection to one server.
struct RconConnection {
    stream: TcpStream,
    next_id: i32,
}

impl RconConnection {
    async fn connect(config: &RconServerConfig, io_timeout: Duration) -> Result<Self, RconError> {
        let addr = format!("{}:{}", config.host, config.port);
        let stream = timeout(io_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| RconError::Timeout)??;

        let mut conn = Self { stream, next_id: 1 };
        conn.authenticate(&config.password, io_timeout).await?;

        info!(server = %config.id, addr = %addr, "RCON connected and authenticated");
        Ok(conn)
    }

    async fn authenticate(&mut self, password: &str, io_timeout: Duration) -> Result<(), RconError> {
        let id = self.take_id();
        self.write_packet(id, PACKET_TYPE_AUTH, password, io_timeout)
            .await?;

        // Some servers send an empty RESPONSE_VALUE before the auth
        // response; read until we see the auth verdict.
        loop {
            let (resp_id, packet_type, _) = self.read_packet(io_timeout).await?;
            if packet_type == PACKET_TYPE_EXEC {
                if resp_id == -1 {
                    return Err(RconError::AuthRejected);
                }
                return Ok(());
            }
        }
    }

    async fn send_command(
        &mut self,
        command: &str,
        io_timeout: Duration,
    ) -> Result<String, RconError> {
        let id = self.take_id();
        self.write_packet(id, PACKET_TYPE_EXEC, command, io_timeout)
            .await?;

        let (resp_id, _, body) = self.read_packet(io_timeout).await?;
        if resp_id != id {
            return Err(RconError::Protocol(format!(
                "response id {} does not match request id {}",
                resp_id, id
            )));
        }

        Ok(body)
    }

    fn take_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    async fn write_packet(
        &mut self,
        id: i32,
        packet_type: i32,
        body: &str,
        io_timeout: Duration,
    ) -> Result<(), RconError> {
        let packet = encode_packet(id, packet_type, body);
        timeout(io_timeout, self.stream.write_all(&packet))
            .await
            .map_err(|_| RconError::Timeout)??;
        Ok(())
    }

    async fn read_packet(&mut self, io_timeout: Duration) -> Result<(i32, i32, String), RconError> {
        let mut len_buf = [0u8; 4];
        timeout(io_timeout, self.stream.read_exact(&mut len_buf))
            .await
            .map_err(|_| RconError::Timeout)??;

        let length = i32::from_le_bytes(len_buf);
        if length < 10 || length as usize > MAX_PACKET_BODY {
            return Err(RconError::Protocol(format!(
                "unreasonable packet length {}",
                length
            )));
        }

        let mut payload = vec![0u8; length as usize];
        timeout(io_timeout, self.stream.read_exact(&mut payload))
            .await
            .map_err(|_| RconError::Timeout)??;

        let id = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let packet_type = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
        // Body runs to the two trailing NULs.
        let body_bytes = &payload[8..payload.len().saturating_sub(2)];
        let body = String::from_utf8_lossy(body_bytes).into_owned();

        Ok((id, packet_type, body))
    }

    async fn close(mut self) {
        let _ = self.stream.shutdown().await;
    }
}

/// One registry slot: config plus the serialized connection cache.
struct ServerSlot {
    config: RconServerConfig,
    connection: Mutex<Option<RconConnection>>,
}

/// The connection registry. Owned by the application state and injected
/// where needed; there is no global connection map.
pub struct RconExecutor {
    slots: HashMap<String, ServerSlot>,
    default_server_id: String,
    io_timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl RconExecutor {
    pub fn new(config: RconConfig) -> Self {
        let slots = config
            .servers
            .into_iter()
            .map(|server| {
                (
                    server.id.clone(),
                    ServerSlot {
                        config: server,
                        connection: Mutex::new(None),
                    },
                )
            })
            .collect();

        Self {
            slots,
            default_server_id: config.default_server_id,
            io_timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }

    /// Sends a status command and parses the online player list.
    pub async fn list_online_players(
        &self,
        server_id: &str,
    ) -> Result<Vec<OnlinePlayer>, RconError> {
        let response = self.execute(server_id, "list").await?;
        Ok(parse_player_list(&response))
    }

    /// Connection-health snapshot: server id -> cached live connection.
    /// Never waits on an in-flight command; a held slot lock means the
    /// connection is in active use.
    pub async fn status(&self) -> HashMap<String, bool> {
        let mut status = HashMap::new();
        for (id, slot) in &self.slots {
            let connected = match slot.connection.try_lock() {
                Ok(guard) => guard.is_some(),
                Err(_) => true,
            };
            status.insert(id.clone(), connected);
        }
        status
    }

    /// Closes every cached connection. Called on graceful shutdown so
    /// sockets are not leaked.
    pub async fn shutdown(&self) {
        for (id, slot) in &self.slots {
            if let Some(conn) = slot.connection.lock().await.take() {
                conn.close().await;
                info!(server = %id, "RCON connection closed");
            }
        }
    }

    async fn execute_with_retries(
        &self,
        server_id: &str,
        command: &str,
    ) -> Result<String, RconError> {
        let slot = self
            .slots
            .get(server_id)
            .ok_or_else(|| RconError::UnknownServer(server_id.to_string()))?;

        // Holding the slot lock across the whole call serializes commands
        // per server; the remote protocol is not safely pipelined.
        let mut guard = slot.connection.lock().await;
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            if guard.is_none() {
                match RconConnection::connect(&slot.config, self.io_timeout).await {
                    Ok(conn) => *guard = Some(conn),
                    Err(e) => {
                        warn!(
                            server = %server_id,
                            attempt,
                            max = self.max_retries,
                            error = %e,
                            "RCON connect failed"
                        );
                        last_error = e.to_string();
                        if attempt < self.max_retries {
                            tokio::time::sleep(self.retry_delay).await;
                        }
                        continue;
                    }
                }
            }

            let Some(conn) = guard.as_mut() else {
                continue;
            };

            match conn.send_command(command, self.io_timeout).await {
                Ok(response) => {
                    debug!(server = %server_id, command, "RCON command executed");
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        server = %server_id,
                        attempt,
                        max = self.max_retries,
                        error = %e,
                        "RCON command failed, dropping connection"
                    );
                    // The connection is suspect after any error.
                    if let Some(conn) = guard.take() {
                        conn.close().await;
                    }
                    last_error = e.to_string();
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(RconError::RetriesExhausted {
            attempts: self.max_retries,
            last_error,
        })
    }
}

#[async_trait]
impl CommandExecutor for RconExecutor {
    async fn execute(&self, server_id: &str, command: &str) -> Result<String, RconError> {
        self.execute_with_retries(server_id, command).await
    }

    fn default_server_id(&self) -> &str {
        &self.default_server_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_packet_layout() {
        let packet = encode_packet(7, PACKET_TYPE_EXEC, "list");
        // length = 4 (id) + 4 (type) + 4 (body) + 2 (NULs) = 14
        assert_eq!(&packet[0..4], &14i32.to_le_bytes());
        assert_eq!(&packet[4..8], &7i32.to_le_bytes());
        assert_eq!(&packet[8..12], &2i32.to_le_bytes());
        assert_eq!(&packet[12..16], b"list");
        assert_eq!(&packet[16..], &[0, 0]);
    }

    #[test]
    fn test_encode_empty_body() {
        let packet = encode_packet(1, PACKET_TYPE_AUTH, "");
        assert_eq!(&packet[0..4], &10i32.to_le_bytes());
        assert_eq!(packet.len(), 14);
    }

    #[test]
    fn test_strip_color_codes() {
        assert_eq!(strip_color_codes("§aGreen §ltext§r!"), "Green text!");
        assert_eq!(strip_color_codes("plain"), "plain");
        // Uppercase code letters are stripped too.
        assert_eq!(strip_color_codes("§AX"), "X");
    }

    #[test]
    fn test_parse_player_list() {
        let response = "§aadmin: Herobrine\nplayer: Steve\n\nvip: Alex";
        let players = parse_player_list(response);
        assert_eq!(
            players,
            vec![
                OnlinePlayer {
                    role: "Admin".to_string(),
                    name: "Herobrine".to_string()
                },
                OnlinePlayer {
                    role: "Player".to_string(),
                    name: "Steve".to_string()
                },
                OnlinePlayer {
                    role: "Vip".to_string(),
                    name: "Alex".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_player_list_skips_garbage() {
        let response = "no colon here\n: noname\nrole:\n  \n";
        assert!(parse_player_list(response).is_empty());
    }

    #[test]
    fn test_parse_player_list_empty_response() {
        assert!(parse_player_list("").is_empty());
    }

    fn test_config() -> RconConfig {
        RconConfig {
            servers: vec![RconServerConfig {
                id: "main".to_string(),
                host: "127.0.0.1".to_string(),
                port: 25575,
                password: "secret".to_string(),
            }],
            default_server_id: "main".to_string(),
            timeout_secs: 10,
            max_retries: 3,
            retry_delay_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_unknown_server_rejected() {
        let executor = RconExecutor::new(test_config());
        let result = executor.execute("ghost", "list").await;
        assert!(matches!(result, Err(RconError::UnknownServer(_))));
    }

    #[tokio::test]
    async fn test_status_reports_configured_servers() {
        let executor = RconExecutor::new(test_config());
        let status = executor.status().await;
        assert_eq!(status.len(), 1);
        assert_eq!(status.get("main"), Some(&false));
    }

    #[test]
    fn test_default_server_id() {
        let executor = RconExecutor::new(test_config());
        assert_eq!(executor.default_server_id(), "main");
    }
}
