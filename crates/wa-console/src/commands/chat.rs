//! Chat command - chat list, message view with media downloads, chat actions.

use crate::commands::{fill_recipient, unknown_action, CommandHandler};
use crate::error::{AppError, AppResult};
use crate::input::CommandLine;
use crate::session::{ChatList, OpenChat, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recipient_actions::forms::{DisappearingForm, MarkReadForm, PinChatForm, ReactionForm};
use recipient_actions::media::download_table;
use recipient_actions::presenter::local_filter;
use recipient_actions::{
    ActionForm, ChatFilter, DownloadStatus, MessageFilter, RecipientIdentifier, SubmissionController,
    Table, TriState, SELECTED_CHAT_KEY,
};
use std::sync::Arc;
use tracing::info;

pub struct ChatHandler {
    session: Arc<Session>,
    controller: SubmissionController,
}

impl ChatHandler {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            controller: session.controller(),
            session,
        }
    }

    async fn list(&self, line: &CommandLine) -> AppResult<String> {
        let filter = ChatFilter {
            search: line.get_or_default("search"),
            has_media: line.flag("has_media", false)?,
        };

        let mut chats = self.session.chats().await;
        chats.filter = filter;
        chats.pager.rewind();
        self.fetch_chats(&mut chats, line.get("filter")).await
    }

    async fn turn_chat_page(&self, line: &CommandLine, forward: bool) -> AppResult<String> {
        let mut chats = self.session.chats().await;
        let moved = if forward {
            chats.pager.next_page()
        } else {
            chats.pager.prev_page()
        };
        if !moved {
            let edge = if forward { "last" } else { "first" };
            return Ok(self.session.error(format!("Already on the {} page", edge)));
        }
        self.fetch_chats(&mut chats, line.get("filter")).await
    }

    async fn fetch_chats(&self, chats: &mut ChatList, needle: Option<&str>) -> AppResult<String> {
        let mut query = chats.pager.query_params();
        query.extend(chats.filter.query_params());

        let page = self.session.client().await.chats(query).await?;
        chats.pager.set_total(page.total());
        chats.rows = page.data;

        let mut table = Table::new(["#", "Chat", "Name", "Last message"]);
        for (index, chat) in chats.rows.iter().enumerate() {
            if !local_filter(std::slice::from_ref(chat), needle.unwrap_or_default()).is_empty() {
                table.push([
                    (index + 1).to_string(),
                    chat.jid.clone(),
                    chat.name.clone().unwrap_or_default(),
                    format_time(chat.last_message_time),
                ]);
            }
        }
        Ok(self.session.presenter().page(&table, &chats.pager))
    }

    /// Hand a chat over to the message view.
    async fn select(&self, line: &CommandLine) -> AppResult<String> {
        let jid = match (line.get("jid"), line.parse_value::<usize>("row")?) {
            (Some(jid), _) => RecipientIdentifier::parse(jid)?.canonical(),
            (None, Some(row)) => {
                let chats = self.session.chats().await;
                row.checked_sub(1)
                    .and_then(|i| chats.rows.get(i))
                    .map(|chat| chat.jid.clone())
                    .ok_or_else(|| AppError::Usage(format!("no row {} in the chat list", row)))?
            }
            (None, None) => return Err(AppError::Usage("missing jid=... or row=...".into())),
        };

        self.session.handoff().put(SELECTED_CHAT_KEY, &jid).await?;
        info!(chat = %jid, "Chat selected");
        Ok(self
            .session
            .success(format!("Selected {}, open it with chat messages", jid)))
    }

    async fn messages(&self, line: &CommandLine) -> AppResult<String> {
        let filter = MessageFilter {
            search: line.get_or_default("search"),
            start_time: parse_time(line, "start")?,
            end_time: parse_time(line, "end")?,
            is_from_me: line.parse_value::<TriState>("from_me")?.unwrap_or_default(),
            media_only: line.flag("media_only", false)?,
        };

        let jid = match line.get("jid") {
            Some(jid) => RecipientIdentifier::parse(jid)?.canonical(),
            None => self
                .session
                .handoff()
                .take(SELECTED_CHAT_KEY)
                .await?
                .ok_or_else(|| {
                    AppError::Usage("no chat selected, use chat select or pass jid=...".into())
                })?,
        };

        let mut open = self.session.open(&jid).await;
        let chat = open
            .as_mut()
            .ok_or_else(|| AppError::Usage("no chat open".into()))?;
        chat.filter = filter;
        self.fetch_messages(chat).await
    }

    async fn more(&self) -> AppResult<String> {
        let mut open = self.session.open_chat().await;
        let chat = open
            .as_mut()
            .ok_or_else(|| AppError::Usage("no chat open, use chat messages".into()))?;
        if !chat.pager.next_page() {
            return Ok(self.session.error("No more messages"));
        }
        self.fetch_messages(chat).await
    }

    async fn fetch_messages(&self, chat: &mut OpenChat) -> AppResult<String> {
        let mut query = chat.pager.query_params();
        query.extend(chat.filter.query_params());

        let page = self
            .session
            .client()
            .await
            .chat_messages(&chat.jid, query)
            .await?;
        chat.pager.set_total(page.total());
        chat.messages = page.data;

        let queued = chat
            .media
            .download_all_pending(&chat.messages, &chat.jid)
            .await;

        let mut table = Table::new(["Message", "Time", "From", "Content", "Media"]);
        for message in &chat.messages {
            let from = if message.is_from_me {
                "me".to_string()
            } else {
                message
                    .push_name
                    .clone()
                    .or_else(|| message.sender_jid.clone())
                    .unwrap_or_default()
            };
            table.push([
                message.id.clone(),
                format_time(message.timestamp),
                from,
                message.content.clone().unwrap_or_default(),
                message.media_type.clone().unwrap_or_default(),
            ]);
        }

        let mut output = self.session.presenter().page(&table, &chat.pager);
        if queued > 0 {
            output.push_str(&format!(
                "\n{} media download(s) queued, see chat downloads",
                queued
            ));
        }
        Ok(output)
    }

    async fn downloads(&self) -> AppResult<String> {
        let open = self.session.open_chat().await;
        let chat = open
            .as_ref()
            .ok_or_else(|| AppError::Usage("no chat open, use chat messages".into()))?;
        let records = chat.media.records().await;
        Ok(self.session.presenter().table(&download_table(&records)))
    }

    /// Send a failed download back through the coordinator's retry channel.
    async fn retry(&self, line: &CommandLine) -> AppResult<String> {
        let id = line.require("id")?;
        let open = self.session.open_chat().await;
        let chat = open
            .as_ref()
            .ok_or_else(|| AppError::Usage("no chat open, use chat messages".into()))?;

        match chat.media.record(id).await.map(|r| r.status) {
            Some(DownloadStatus::Failed(_)) => {
                chat.media.retry_handle().request(id);
                Ok(self.session.success(format!("Retrying download of {}", id)))
            }
            Some(status) => Ok(self
                .session
                .error(format!("Download {} is {}", id, status.label()))),
            None => Ok(self.session.error(format!("No download for message {}", id))),
        }
    }

    /// Chat actions default to the open chat when `to=` is missing.
    async fn chat_form(&self, form: &mut dyn ActionForm, line: &CommandLine) -> AppResult<()> {
        if line.get("to").is_none() {
            if let Some(chat) = self.session.open_chat().await.as_ref() {
                form.set_recipient_jid(&chat.jid)?;
            }
        }
        fill_recipient(form, line)
    }
}

fn parse_time(line: &CommandLine, key: &str) -> AppResult<Option<DateTime<Utc>>> {
    line.get(key)
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            DateTime::parse_from_rfc3339(v.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| AppError::Usage(format!("invalid {}: {}", key, e)))
        })
        .transpose()
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[async_trait]
impl CommandHandler for ChatHandler {
    fn name(&self) -> &str {
        "chat"
    }

    async fn execute(&self, line: &CommandLine) -> AppResult<String> {
        match line.action() {
            "list" => self.list(line).await,
            "next" => self.turn_chat_page(line, true).await,
            "prev" => self.turn_chat_page(line, false).await,
            "select" => self.select(line).await,
            "messages" => self.messages(line).await,
            "more" => self.more().await,
            "downloads" => self.downloads().await,
            "retry" => self.retry(line).await,
            "disappearing" => {
                let mut form = DisappearingForm::default();
                self.chat_form(&mut form, line).await?;
                if let Some(timer) = line.parse_value("timer")? {
                    form.timer_secs = timer;
                }
                Ok(self.session.submit(&self.controller, &mut form).await)
            }
            action @ ("pin" | "unpin") => {
                let mut form = PinChatForm::default();
                self.chat_form(&mut form, line).await?;
                form.pinned = line.flag("pinned", action == "pin")?;
                Ok(self.session.submit(&self.controller, &mut form).await)
            }
            "react" => {
                let mut form = ReactionForm::default();
                self.chat_form(&mut form, line).await?;
                form.message_id = line.get_or_default("id");
                form.emoji = line.get_or_default("emoji");
                Ok(self.session.submit(&self.controller, &mut form).await)
            }
            "read" => {
                let mut form = MarkReadForm::default();
                self.chat_form(&mut form, line).await?;
                form.message_id = line.get_or_default("id");
                Ok(self.session.submit(&self.controller, &mut form).await)
            }
            other => Err(unknown_action("chat", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionSettings;
    use bridge_client::BridgeClient;
    use recipient_actions::CoordinatorConfig;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handler(server: &MockServer) -> ChatHandler {
        let client = BridgeClient::new(server.uri()).unwrap();
        let settings = SessionSettings {
            chat_page_size: 2,
            media: CoordinatorConfig {
                max_concurrent: 2,
                dispatch_delay: Duration::from_millis(1),
            },
            ..SessionSettings::default()
        };
        ChatHandler::new(Arc::new(Session::new(client, settings)))
    }

    fn line(input: &str) -> CommandLine {
        CommandLine::parse(input).unwrap().unwrap()
    }

    async fn mount_chats(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/chats"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "ok",
                "results": {
                    "data": [
                        {"jid": "12036342@g.us", "name": "Family"},
                        {"jid": "5511999999999@s.whatsapp.net", "name": "Ann"}
                    ],
                    "pagination": {"offset": 0, "limit": 2, "total": 3}
                }
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "ok",
                "results": {
                    "data": [{"jid": "5511888888888@s.whatsapp.net", "name": "Bob"}],
                    "pagination": {"offset": 2, "limit": 2, "total": 3}
                }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_chat_list_pages() {
        let server = MockServer::start().await;
        mount_chats(&server).await;
        let handler = handler(&server);

        let first = handler.execute(&line("chat list")).await.unwrap();
        assert!(first.contains("Family"));
        assert!(first.ends_with("Page 1 of 2 (3 total)"));

        let second = handler.execute(&line("chat next")).await.unwrap();
        assert!(second.contains("Bob"));
        assert!(second.ends_with("Page 2 of 2 (3 total)"));

        let edge = handler.execute(&line("chat next")).await.unwrap();
        assert_eq!(edge, "[error] Already on the last page");
    }

    #[tokio::test]
    async fn test_local_filter_hides_rows() {
        let server = MockServer::start().await;
        mount_chats(&server).await;

        let output = handler(&server)
            .execute(&line("chat list filter=ann"))
            .await
            .unwrap();
        assert!(output.contains("Ann"));
        assert!(!output.contains("Family"));
    }

    #[tokio::test]
    async fn test_select_then_open_messages_once() {
        let server = MockServer::start().await;
        mount_chats(&server).await;
        Mock::given(method("GET"))
            .and(path("/chat/12036342@g.us/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "ok",
                "results": {
                    "data": [
                        {"id": "M1", "content": "hello", "push_name": "Ann"},
                        {"id": "M2", "media_type": "image", "url": "https://mmg.whatsapp.net/2"}
                    ],
                    "pagination": {"offset": 0, "limit": 20, "total": 2}
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/message/M2/download"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "media expired"
            })))
            .mount(&server)
            .await;
        let handler = handler(&server);

        handler.execute(&line("chat list")).await.unwrap();
        let selected = handler.execute(&line("chat select row=1")).await.unwrap();
        assert_eq!(selected, "[ok] Selected 12036342@g.us, open it with chat messages");

        let messages = handler.execute(&line("chat messages")).await.unwrap();
        assert!(messages.contains("hello"));
        assert!(messages.ends_with("1 media download(s) queued, see chat downloads"));

        let again = handler.execute(&line("chat messages")).await.unwrap_err();
        assert!(matches!(again, AppError::Usage(_)));

        {
            let open = handler.session.open_chat().await;
            open.as_ref().unwrap().media.wait_idle().await;
        }
        let downloads = handler.execute(&line("chat downloads")).await.unwrap();
        assert!(downloads.contains("media expired (retry: chat retry id=M2)"));

        let retry = handler.execute(&line("chat retry id=M2")).await.unwrap();
        assert_eq!(retry, "[ok] Retrying download of M2");
        let unknown = handler.execute(&line("chat retry id=M9")).await.unwrap();
        assert_eq!(unknown, "[error] No download for message M9");
    }

    #[tokio::test]
    async fn test_pin_defaults_to_open_chat() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chat/12036342@g.us/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "ok",
                "results": {"data": []}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/12036342@g.us/pin"))
            .and(body_json(serde_json::json!({"pinned": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Chat unpinned"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let handler = handler(&server);

        handler
            .execute(&line("chat messages jid=12036342@g.us"))
            .await
            .unwrap();
        let output = handler.execute(&line("chat unpin")).await.unwrap();
        assert_eq!(output, "[ok] Chat unpinned");
    }

    #[tokio::test]
    async fn test_invalid_time_filter() {
        let server = MockServer::start().await;
        let err = handler(&server)
            .execute(&line("chat messages jid=12036342@g.us start=yesterday"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));
    }
}
