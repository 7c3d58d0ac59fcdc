use std::fmt::Write;

use super::auth_form::{AuthFormView, LOADING_LABEL};
use super::chat_list::{ChatListView, LOADING_CHATS};
use super::message_view::{MessageViewSnapshot, LOADING_MESSAGES};
use super::session_gate::Screen;
use super::workspace::{WorkspaceView, EMPTY_SELECTION};
use crate::modules::chat::{Sender, FALLBACK_TITLE};

const RULE: &str = "----------------------------------------";

/// 把界面渲染为终端文本
pub fn render(screen: &Screen) -> String {
    match screen {
        Screen::Loading => format!("{}\n", LOADING_LABEL),
        Screen::Auth(form) => render_auth_form(form),
        Screen::Workspace(workspace) => render_workspace(workspace),
    }
}

/// 错误信息不在这里显示
pub fn render_auth_form(form: &AuthFormView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", form.title);
    let _ = writeln!(out, "email:    {}", form.email);
    let _ = writeln!(out, "password: {}", "*".repeat(form.password_len));
    if form.action_enabled {
        let _ = writeln!(out, "[{}]", form.action_label);
    } else {
        let _ = writeln!(out, "({})", form.action_label);
    }
    let _ = writeln!(out, "{}", form.toggle_prompt);
    out
}

pub fn render_workspace(workspace: &WorkspaceView) -> String {
    let mut out = render_chat_list(&workspace.list);
    out.push_str(RULE);
    out.push('\n');
    match &workspace.conversation {
        Some(conversation) => out.push_str(&render_messages(conversation)),
        None => {
            let _ = writeln!(out, "{}", EMPTY_SELECTION);
        }
    }
    out
}

pub fn render_chat_list(list: &ChatListView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Chats  [{}]  [Sign Out]", FALLBACK_TITLE);
    if list.loading {
        let _ = writeln!(out, "{}", LOADING_CHATS);
        return out;
    }
    for (index, item) in list.items.iter().enumerate() {
        let marker = if item.active { '>' } else { ' ' };
        let _ = writeln!(out, "{} {:>2}. {}", marker, index + 1, item.title);
    }
    out
}

pub fn render_messages(conversation: &MessageViewSnapshot) -> String {
    let mut out = String::new();
    let feed = match &conversation.feed {
        Some(feed) => feed,
        None => {
            let _ = writeln!(out, "{}", LOADING_MESSAGES);
            return out;
        }
    };

    for message in feed.messages() {
        let who = match message.sender() {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        let _ = writeln!(out, "{}: {}", who, message.content());
    }
    let _ = writeln!(out, "> {}", conversation.composer);
    out
}
