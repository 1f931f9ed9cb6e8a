//! Account command - contacts, profile lookups and newsletters.

use crate::commands::{fill_recipient, unknown_action, CommandHandler};
use crate::error::AppResult;
use crate::input::CommandLine;
use crate::session::Session;
use async_trait::async_trait;
use recipient_actions::forms::{
    AvatarForm, BusinessProfileForm, NewsletterUnfollowForm, UserCheckForm,
};
use recipient_actions::{write_contacts_csv, ErrorRemapTable, SubmissionController, Table};
use std::sync::Arc;

pub struct AccountHandler {
    session: Arc<Session>,
    controller: SubmissionController,
    business: SubmissionController,
}

impl AccountHandler {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            controller: session.controller(),
            business: session
                .controller()
                .with_remap(ErrorRemapTable::business_profile()),
            session,
        }
    }

    async fn contacts(&self) -> AppResult<String> {
        let contacts = self.session.client().await.contacts().await?;

        let mut table = Table::new(["Phone Number", "Name", "JID"]);
        for contact in &contacts {
            table.push([
                contact.jid.split('@').next().unwrap_or_default().to_string(),
                contact.name.clone().unwrap_or_default(),
                contact.jid.clone(),
            ]);
        }
        Ok(self.session.presenter().table(&table))
    }

    async fn export(&self) -> AppResult<String> {
        let contacts = self.session.client().await.contacts().await?;
        let path = write_contacts_csv(self.session.export_dir(), &contacts).await?;
        Ok(self.session.success(format!(
            "Exported {} contacts to {}",
            contacts.len(),
            path.display()
        )))
    }

    async fn privacy(&self) -> AppResult<String> {
        let settings = self.session.client().await.privacy().await?;
        let mut table = Table::new(["Setting", "Value"]);
        if let Some(map) = settings.as_object() {
            for (key, value) in map {
                let value = value
                    .as_str()
                    .map(String::from)
                    .unwrap_or_else(|| value.to_string());
                table.push([key.clone(), value]);
            }
        }
        Ok(self.session.presenter().table(&table))
    }

    async fn newsletters(&self) -> AppResult<String> {
        let newsletters = self.session.client().await.newsletters().await?;
        let mut table = Table::new(["Newsletter", "Name"]);
        for newsletter in &newsletters {
            table.push([
                newsletter.id.clone(),
                newsletter.name().unwrap_or_default().to_string(),
            ]);
        }
        Ok(self.session.presenter().table(&table))
    }
}

#[async_trait]
impl CommandHandler for AccountHandler {
    fn name(&self) -> &str {
        "account"
    }

    async fn execute(&self, line: &CommandLine) -> AppResult<String> {
        match line.action() {
            "contacts" => self.contacts().await,
            "export" => self.export().await,
            "privacy" => self.privacy().await,
            "newsletters" => self.newsletters().await,
            "avatar" => {
                let mut form = AvatarForm::default();
                fill_recipient(&mut form, line)?;
                form.is_preview = line.flag("preview", false)?;
                form.is_community = line.flag("community", false)?;
                Ok(self.session.submit(&self.controller, &mut form).await)
            }
            "business" => {
                let mut form = BusinessProfileForm::default();
                fill_recipient(&mut form, line)?;
                Ok(self.session.submit(&self.business, &mut form).await)
            }
            "check" => {
                let mut form = UserCheckForm::default();
                fill_recipient(&mut form, line)?;
                Ok(self.session.submit(&self.controller, &mut form).await)
            }
            "unfollow" => {
                let mut form = NewsletterUnfollowForm::default();
                fill_recipient(&mut form, line)?;
                Ok(self.session.submit(&self.controller, &mut form).await)
            }
            other => Err(unknown_action("account", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionSettings;
    use bridge_client::BridgeClient;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handler(server: &MockServer, export_dir: &std::path::Path) -> AccountHandler {
        let client = BridgeClient::new(server.uri()).unwrap();
        let settings = SessionSettings {
            export_dir: export_dir.to_path_buf(),
            ..SessionSettings::default()
        };
        AccountHandler::new(Arc::new(Session::new(client, settings)))
    }

    fn line(input: &str) -> CommandLine {
        CommandLine::parse(input).unwrap().unwrap()
    }

    async fn mount_contacts(server: &MockServer, contacts: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/user/my/contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "ok",
                "results": {"data": contacts}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_export_writes_csv() {
        let server = MockServer::start().await;
        mount_contacts(
            &server,
            serde_json::json!([
                {"jid": "5511999999999@s.whatsapp.net", "name": "Ann \"Annie\""},
                {"jid": "5511888888888@s.whatsapp.net"}
            ]),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();

        let output = handler(&server, dir.path())
            .execute(&line("account export"))
            .await
            .unwrap();

        assert!(output.starts_with("[ok] Exported 2 contacts to "));
        let csv = tokio::fs::read_to_string(dir.path().join("contacts.csv"))
            .await
            .unwrap();
        assert_eq!(
            csv,
            "Phone Number,Name\n5511999999999,\"Ann \"\"Annie\"\"\"\n5511888888888,\"\"\n"
        );
    }

    #[tokio::test]
    async fn test_export_without_contacts() {
        let server = MockServer::start().await;
        mount_contacts(&server, serde_json::json!([])).await;
        let dir = tempfile::tempdir().unwrap();

        let err = handler(&server, dir.path())
            .execute(&line("account export"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Nothing to export");
    }

    #[tokio::test]
    async fn test_business_profile_uses_remap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/business-profile"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "message": "profile data is corrupted"
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let output = handler(&server, dir.path())
            .execute(&line("account business to=5511999999999"))
            .await
            .unwrap();
        assert_eq!(
            output,
            "[error] The business profile data is corrupted. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_unfollow_newsletter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/newsletter/unfollow"))
            .and(body_json(serde_json::json!({
                "newsletter_id": "120363024@newsletter"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Unfollowed"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let output = handler(&server, dir.path())
            .execute(&line("account unfollow to=120363024"))
            .await
            .unwrap();
        assert_eq!(output, "[ok] Unfollowed");
    }
}
