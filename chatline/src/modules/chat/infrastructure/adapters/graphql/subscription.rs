// graphql-transport-ws 订阅
//
// 协议流程：connection_init -> connection_ack -> subscribe -> next* -> complete
// 消费方丢弃流时，后台任务发送 complete 并关闭连接

use futures::stream::{self, Stream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, warn};
use url::Url;

use super::{GraphqlError, GraphqlResponse};

const SUBPROTOCOL: &str = "graphql-transport-ws";
const SUBSCRIPTION_ID: &str = "1";
const CHANNEL_CAPACITY: usize = 16;

/// 协议消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolMessage {
    ConnectionInit {
        payload: Value,
    },
    ConnectionAck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Subscribe {
        id: String,
        payload: SubscribePayload,
    },
    Next {
        id: String,
        payload: Value,
    },
    Error {
        id: String,
        payload: Value,
    },
    Complete {
        id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribePayload {
    pub query: String,
    pub variables: Value,
}

/// 订阅推送的原始 data 流
pub type SubscriptionStream = Pin<Box<dyn Stream<Item = Result<Value, GraphqlError>> + Send>>;

/// GraphQL 订阅连接
pub struct GraphqlSubscription;

impl GraphqlSubscription {
    /// 建立连接并开始订阅
    ///
    /// 握手完成后才返回；之后的每个 `next` 载荷作为流的一项
    pub async fn start(
        url: &Url,
        access_token: &str,
        document: &str,
        variables: Value,
    ) -> Result<SubscriptionStream, GraphqlError> {
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| GraphqlError::NetworkError(e.to_string()))?;
        request
            .headers_mut()
            .insert("Sec-WebSocket-Protocol", HeaderValue::from_static(SUBPROTOCOL));

        let (mut ws, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| GraphqlError::NetworkError(e.to_string()))?;

        debug!("websocket connected to {}", url);

        let init = ProtocolMessage::ConnectionInit {
            payload: serde_json::json!({
                "headers": { "Authorization": format!("Bearer {}", access_token) }
            }),
        };
        send(&mut ws, &init).await?;

        // 等待 connection_ack
        loop {
            match next_protocol_message(&mut ws).await? {
                Some(ProtocolMessage::ConnectionAck { .. }) => break,
                Some(ProtocolMessage::Ping { .. }) => {
                    send(&mut ws, &ProtocolMessage::Pong { payload: None }).await?
                }
                Some(other) => {
                    return Err(GraphqlError::ProtocolError(format!(
                        "expected connection_ack, got {:?}",
                        other
                    )))
                }
                None => {
                    return Err(GraphqlError::ProtocolError(
                        "connection closed before ack".to_string(),
                    ))
                }
            }
        }

        let subscribe = ProtocolMessage::Subscribe {
            id: SUBSCRIPTION_ID.to_string(),
            payload: SubscribePayload {
                query: document.to_string(),
                variables,
            },
        };
        send(&mut ws, &subscribe).await?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(pump(ws, tx));

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(stream))
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// 把 websocket 帧转发到通道，直到服务端结束或消费方离开
async fn pump(mut ws: WsStream, tx: mpsc::Sender<Result<Value, GraphqlError>>) {
    loop {
        tokio::select! {
            _ = tx.closed() => {
                debug!("subscription dropped by consumer, completing");
                let complete = ProtocolMessage::Complete { id: SUBSCRIPTION_ID.to_string() };
                let _ = send(&mut ws, &complete).await;
                let _ = ws.close(None).await;
                return;
            }
            frame = next_protocol_message(&mut ws) => {
                match frame {
                    Ok(Some(ProtocolMessage::Next { payload, .. })) => {
                        let item = serde_json::from_value::<GraphqlResponse<Value>>(payload)
                            .map_err(|e| GraphqlError::DecodeError(e.to_string()))
                            .and_then(GraphqlResponse::into_result);
                        if tx.send(item).await.is_err() {
                            return;
                        }
                    }
                    Ok(Some(ProtocolMessage::Ping { .. })) => {
                        if let Err(e) = send(&mut ws, &ProtocolMessage::Pong { payload: None }).await {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                    Ok(Some(ProtocolMessage::Error { payload, .. })) => {
                        warn!("subscription error: {}", payload);
                        let _ = tx
                            .send(Err(GraphqlError::ResponseErrors(error_messages(&payload))))
                            .await;
                        return;
                    }
                    Ok(Some(ProtocolMessage::Complete { .. })) | Ok(None) => {
                        debug!("subscription completed by server");
                        return;
                    }
                    Ok(Some(other)) => {
                        debug!("ignoring protocol message: {:?}", other);
                    }
                    Err(e) => {
                        warn!("subscription transport error: {}", e);
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
        }
    }
}

async fn send(ws: &mut WsStream, message: &ProtocolMessage) -> Result<(), GraphqlError> {
    let text =
        serde_json::to_string(message).map_err(|e| GraphqlError::DecodeError(e.to_string()))?;
    ws.send(Message::Text(text))
        .await
        .map_err(|e| GraphqlError::NetworkError(e.to_string()))
}

/// 读取下一条协议消息；连接关闭时返回 None
async fn next_protocol_message(
    ws: &mut WsStream,
) -> Result<Option<ProtocolMessage>, GraphqlError> {
    while let Some(frame) = ws.next().await {
        match frame.map_err(|e| GraphqlError::NetworkError(e.to_string()))? {
            Message::Text(text) => {
                return serde_json::from_str(&text)
                    .map(Some)
                    .map_err(|e| GraphqlError::ProtocolError(e.to_string()));
            }
            Message::Close(_) => return Ok(None),
            _ => continue,
        }
    }
    Ok(None)
}

/// error 载荷是 GraphQL 错误数组
fn error_messages(payload: &Value) -> Vec<String> {
    match payload.as_array() {
        Some(errors) => errors
            .iter()
            .map(|e| {
                e.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string())
            })
            .collect(),
        None => vec![payload.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_message_wire_format() {
        let message = ProtocolMessage::Subscribe {
            id: "1".to_string(),
            payload: SubscribePayload {
                query: "subscription { x }".to_string(),
                variables: serde_json::json!({ "chatId": "c1" }),
            },
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "subscribe");
        assert_eq!(json["id"], "1");
        assert_eq!(json["payload"]["variables"]["chatId"], "c1");
    }

    #[test]
    fn test_pong_omits_empty_payload() {
        let json = serde_json::to_string(&ProtocolMessage::Pong { payload: None }).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_parse_server_frames() {
        let ack: ProtocolMessage = serde_json::from_str(r#"{"type":"connection_ack"}"#).unwrap();
        assert_eq!(ack, ProtocolMessage::ConnectionAck { payload: None });

        let next: ProtocolMessage = serde_json::from_str(
            r#"{"type":"next","id":"1","payload":{"data":{"messages":[]}}}"#,
        )
        .unwrap();
        match next {
            ProtocolMessage::Next { id, payload } => {
                assert_eq!(id, "1");
                assert!(payload["data"]["messages"].is_array());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_error_payload_messages() {
        let payload = serde_json::json!([{ "message": "permission denied" }, { "code": 1 }]);
        let messages = error_messages(&payload);

        assert_eq!(messages[0], "permission denied");
        assert_eq!(messages[1], r#"{"code":1}"#);
    }
}
