use serde::{Deserialize, Serialize};
use std::fmt;

/// 消息发送方标签
///
/// 后端以字符串存储：`"user"` 表示用户，其余任何值都视为机器人
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl From<&str> for Sender {
    fn from(s: &str) -> Self {
        if s == "user" {
            Sender::User
        } else {
            Sender::Bot
        }
    }
}

impl From<String> for Sender {
    fn from(s: String) -> Self {
        Sender::from(s.as_str())
    }
}

impl From<Sender> for String {
    fn from(sender: Sender) -> Self {
        sender.as_str().to_string()
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
