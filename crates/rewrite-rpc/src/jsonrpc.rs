//! JSON-RPC 2.0 messages with `Content-Length` framing
//!
//! Each message is a header block followed by a JSON body:
//!
//! ```text
//! Content-Length: 52\r\n
//! \r\n
//! {"jsonrpc":"2.0","id":1,"method":"Print","params":{}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, RpcError};

pub const JSONRPC_VERSION: &str = "2.0";

const CONTENT_LENGTH: &str = "Content-Length";

/// Standard error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    /// A tree id the peer does not hold
    pub const OBJECT_NOT_FOUND: i64 = -32001;
    /// The record streams of this session no longer line up
    pub const PROTOCOL_DESYNC: i64 = -32002;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Anything that can arrive on the wire; requests are tried first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Request {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

impl Response {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: u64, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(ResponseError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// The result, or the peer's error as [`RpcError::Remote`]
    pub fn into_result(self) -> Result<Value> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(RpcError::Remote {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

/// Header block plus body
pub fn encode(message: &Message) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(message)?;
    let mut framed = format!("{CONTENT_LENGTH}: {}\r\n\r\n", body.len()).into_bytes();
    framed.extend_from_slice(&body);
    Ok(framed)
}

pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let framed = encode(message)?;
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}

/// Next message, or `None` when the stream ends between messages
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Message>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut content_length = None;
    let mut line = String::new();
    let mut first = true;
    loop {
        line.clear();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            if first {
                return Ok(None);
            }
            return Err(RpcError::transport("stream ended inside a message header"));
        }
        first = false;

        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
                let length = value.trim().parse::<usize>().map_err(|_| {
                    RpcError::transport(format!("invalid {CONTENT_LENGTH} '{}'", value.trim()))
                })?;
                content_length = Some(length);
            }
        }
    }

    let length = content_length
        .ok_or_else(|| RpcError::transport(format!("message without {CONTENT_LENGTH} header")))?;
    let mut body = vec![0; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}
