// GraphQL documents
//
// 字段名跟随后端 schema：会话表名为 chats，动作名为 sendMessage

pub const GET_CHATS: &str = r#"
query GetChats {
  chats(orderBy: { createdAt: desc }) {
    id
    createdAt
    messages(limit: 1, orderBy: { createdAt: desc }) {
      content
    }
  }
}
"#;

pub const GET_MESSAGES: &str = r#"
subscription GetMessages($chatId: uuid!) {
  messages(where: { chatId: { _eq: $chatId } }, orderBy: { createdAt: asc }) {
    id
    content
    sender
    createdAt
  }
}
"#;

pub const INSERT_CHAT: &str = r#"
mutation InsertChat($userId: String!) {
  insert_chats_one(object: { userId: $userId }) {
    id
  }
}
"#;

pub const INSERT_MESSAGE: &str = r#"
mutation InsertMessage($chatId: uuid!, $content: String!) {
  insert_messages_one(object: { chatId: $chatId, content: $content, sender: "user" }) {
    id
  }
}
"#;

pub const SEND_MESSAGE_ACTION: &str = r#"
mutation SendMessageAction($chatId: uuid!, $message: String!) {
  sendMessage(chatId: $chatId, message: $message) {
    response
  }
}
"#;
