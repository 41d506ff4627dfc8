//! SMTP email channel

use super::{Alert, Notifier};
use crate::config::EmailConfig;
use crate::error::{Result, WatcherError};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipients: Vec<Mailbox>,
    /// One SMTP conversation at a time, even with several monitors firing.
    send_lock: Mutex<()>,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let credentials =
            Credentials::new(config.smtp_user.clone(), config.smtp_password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .credentials(credentials)
            .build();

        let sender = parse_mailbox(&config.sender)?;
        let recipients = config
            .recipients
            .iter()
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<_>>>()?;
        if recipients.is_empty() {
            return Err(WatcherError::Config(
                "email.recipients must not be empty".into(),
            ));
        }

        Ok(Self {
            transport,
            sender,
            recipients,
            send_lock: Mutex::new(()),
        })
    }

    async fn build_message(&self, to: &Mailbox, alert: &Alert) -> Result<Message> {
        let builder = Message::builder()
            .from(self.sender.clone())
            .to(to.clone())
            .subject(alert.subject.clone());
        let text = SinglePart::plain(alert.body.clone());

        let message = match &alert.photo {
            Some(path) => {
                let bytes = tokio::fs::read(path).await?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "photo.jpg".to_string());
                let attachment =
                    Attachment::new(file_name).body(bytes, photo_content_type(path));
                builder.multipart(MultiPart::mixed().singlepart(text).singlepart(attachment))?
            }
            None => builder.singlepart(text)?,
        };
        Ok(message)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn notify(&self, alert: &Alert) -> Result<()> {
        let _guard = self.send_lock.lock().await;
        for recipient in &self.recipients {
            let message = self.build_message(recipient, alert).await?;
            self.transport.send(message).await?;
            debug!("notification sent to {recipient}");
        }
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|_| WatcherError::Config(format!("invalid email address '{address}'")))
}

fn photo_content_type(path: &Path) -> ContentType {
    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    ContentType::parse(mime).expect("static mime type")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_invalid_addresses() {
        let config = EmailConfig {
            smtp_host: "smtp.gmail.com".into(),
            smtp_user: "watcher".into(),
            smtp_password: "secret".into(),
            sender: "not an address".into(),
            recipients: vec!["me@example.com".into()],
        };
        assert!(matches!(
            EmailNotifier::new(&config),
            Err(WatcherError::Config(_))
        ));
    }

    #[tokio::test]
    async fn rejects_an_empty_recipient_list() {
        let config = EmailConfig {
            smtp_host: "smtp.gmail.com".into(),
            smtp_user: "watcher".into(),
            smtp_password: "secret".into(),
            sender: "watcher@example.com".into(),
            recipients: vec![],
        };
        assert!(matches!(
            EmailNotifier::new(&config),
            Err(WatcherError::Config(_))
        ));
    }

    #[test]
    fn content_type_follows_the_photo_extension() {
        assert_eq!(
            photo_content_type(Path::new("/tmp/a.png")),
            ContentType::parse("image/png").unwrap()
        );
        assert_eq!(
            photo_content_type(Path::new("/tmp/a.jpg")),
            ContentType::parse("image/jpeg").unwrap()
        );
        assert_eq!(
            photo_content_type(Path::new("/tmp/photo")),
            ContentType::parse("image/jpeg").unwrap()
        );
    }
}
