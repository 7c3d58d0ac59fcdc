use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;

use super::render::render;
use super::session_gate::{GateView, SessionGate};
use crate::infrastructure::AppState;
use crate::modules::auth::AuthStatus;
use crate::modules::chat::{ChatEvent, ConversationId, MessageFeed};
use crate::shared::AppResult;

const HELP: &str = "\
commands:
  :email <address>     set email
  :password <secret>   set password
  :toggle              switch between sign in and sign up
  :submit              sign in / sign up
  :new                 start a new chat
  :open <n>            open the n-th chat
  :refresh             reload the chat list
  :signout             sign out
  :say <text>          send text as a message
  :quit                exit
  ::text               send \":text\" as a message
  anything else is sent as a message";

/// 一行输入解析出的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Email(String),
    Password(String),
    Toggle,
    Submit,
    NewChat,
    Open(usize),
    Refresh,
    SignOut,
    Help,
    Quit,
    Text(String),
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if !trimmed.starts_with(':') {
            return Command::Text(line.to_string());
        }
        // 双冒号转义，去掉一个后原样发送
        if let Some(rest) = trimmed.strip_prefix("::") {
            return Command::Text(format!(":{}", rest));
        }

        let (name, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (trimmed, ""),
        };
        match name {
            ":email" => Command::Email(arg.to_string()),
            ":password" => Command::Password(arg.to_string()),
            ":toggle" => Command::Toggle,
            ":submit" => Command::Submit,
            ":new" => Command::NewChat,
            ":open" => match arg.parse::<usize>() {
                Ok(n) if n > 0 => Command::Open(n - 1),
                _ => Command::Unknown(trimmed.to_string()),
            },
            ":refresh" => Command::Refresh,
            ":signout" => Command::SignOut,
            ":say" => Command::Text(arg.to_string()),
            ":help" => Command::Help,
            ":quit" | ":q" => Command::Quit,
            _ => Command::Unknown(trimmed.to_string()),
        }
    }
}

/// 终端外壳
///
/// 读取行命令分发给当前界面；每次输入、认证状态变化、消息推送和后台请求结束后重新渲染。
/// 访问后端的命令在后台任务中执行，等待期间照常读取输入和推送
pub struct Shell {
    gate: SessionGate,
    status: watch::Receiver<AuthStatus>,
    events: broadcast::Receiver<ChatEvent>,
    tasks: JoinSet<()>,
}

impl Shell {
    pub async fn new(app: AppState) -> Self {
        let status = app.auth.status();
        let events = app.chat.event_bus().subscribe();
        Self {
            gate: SessionGate::mount(app).await,
            status,
            events,
            tasks: JoinSet::new(),
        }
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub async fn run<R, W>(mut self, input: R, mut output: W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut feed: Option<(ConversationId, watch::Receiver<Option<MessageFeed>>)> = None;

        self.draw(&mut output).await?;
        loop {
            self.track_feed(&mut feed).await;

            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        tracing::info!("input closed, waiting for {} requests", self.tasks.len());
                        while self.tasks.join_next().await.is_some() {}
                        break;
                    };
                    match Command::parse(&line) {
                        Command::Quit => {
                            self.tasks.shutdown().await;
                            break;
                        }
                        Command::Help => {
                            output.write_all(HELP.as_bytes()).await?;
                            output.write_all(b"\n").await?;
                            output.flush().await?;
                            continue;
                        }
                        command => self.dispatch(command).await,
                    }
                    self.gate.sync().await;
                }
                changed = self.status.changed() => {
                    if changed.is_err() {
                        tracing::warn!("auth status channel closed");
                        break;
                    }
                    self.gate.sync().await;
                }
                _ = feed_changed(&mut feed) => {}
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!("background request failed: {}", e);
                    }
                    self.gate.sync().await;
                }
                event = self.events.recv() => {
                    match event {
                        Ok(event) => {
                            tracing::info!(
                                "{} in {}",
                                event.event_type(),
                                event.conversation_id()
                            );
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!("skipped {} chat events", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => {}
                    }
                    continue;
                }
            }

            self.draw(&mut output).await?;
        }

        Ok(())
    }

    /// 本地状态就地修改，后端请求交给后台任务
    async fn dispatch(&mut self, command: Command) {
        match self.gate.view().await {
            GateView::Loading => {
                tracing::debug!("ignoring {:?} while loading", command);
            }
            GateView::Auth(form) => match command {
                Command::Email(email) => form.set_email(email).await,
                Command::Password(password) => form.set_password(password).await,
                Command::Toggle => {
                    form.toggle_mode().await;
                }
                Command::Submit => {
                    // 先进入提交状态，下一帧就能画出 Loading
                    if let Some(request) = form.begin_submit().await {
                        self.spawn(async move {
                            // 失败已在表单内记录
                            let _ = form.finish_submit(request).await;
                        });
                    }
                }
                other => tracing::debug!("{:?} is not available on the auth form", other),
            },
            GateView::Workspace(workspace) => match command {
                Command::NewChat => self.spawn(async move {
                    if let Err(e) = workspace.new_chat().await {
                        tracing::warn!("failed to create chat: {}", e);
                    }
                }),
                Command::Open(index) => {
                    if workspace.select_index(index).await.is_none() {
                        tracing::debug!("no chat at position {}", index + 1);
                    }
                }
                Command::Refresh => self.spawn(async move {
                    if let Err(e) = workspace.refresh().await {
                        tracing::warn!("failed to refresh chats: {}", e);
                    }
                }),
                Command::SignOut => self.spawn(async move {
                    let _ = workspace.sign_out().await;
                }),
                Command::Text(text) => match workspace.message_view().await {
                    Some(view) => {
                        view.set_composer(text).await;
                        if let Some(content) = view.take_composer().await {
                            self.spawn(async move {
                                let _ = view.deliver(content).await;
                            });
                        }
                    }
                    None => tracing::debug!("no chat selected"),
                },
                other => tracing::debug!("{:?} is not available in the workspace", other),
            },
        }
    }

    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(request);
    }

    /// 当前会话变化时换成新视图的快照通道
    async fn track_feed(
        &self,
        feed: &mut Option<(ConversationId, watch::Receiver<Option<MessageFeed>>)>,
    ) {
        let view = match self.gate.view().await {
            GateView::Workspace(workspace) => workspace.message_view().await,
            GateView::Loading | GateView::Auth(_) => None,
        };

        match view {
            Some(view) => {
                let bound = feed.as_ref().map(|(id, _)| *id);
                if bound != Some(view.conversation_id()) {
                    let mut rx = view.watch_feed();
                    let _ = rx.borrow_and_update();
                    *feed = Some((view.conversation_id(), rx));
                }
            }
            None => *feed = None,
        }
    }

    async fn draw<W>(&self, output: &mut W) -> AppResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let screen = render(&self.gate.screen().await);
        output.write_all(screen.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
        Ok(())
    }
}

/// 没有绑定会话或订阅已结束时永不返回
async fn feed_changed(feed: &mut Option<(ConversationId, watch::Receiver<Option<MessageFeed>>)>) {
    match feed {
        Some((_, rx)) => {
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}
