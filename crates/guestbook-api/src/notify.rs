//! Best-effort moderation email for new entries.
//!
//! The notifier runs as a post-commit hook: the submit handler persists the
//! entry first and then hands it over here. Delivery happens on a tracked
//! background task bounded by a timeout, and its outcome only ever reaches
//! the logs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use maud::html;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use url::Url;

use guestbook_types::models::Entry;

use crate::config::{Config, MailConfig};

/// A rendered moderation email.
#[derive(Debug, Clone)]
pub struct Notification {
    pub subject: String,
    pub text: String,
    pub html: String,
    pub approve_url: String,
    pub reject_url: String,
}

/// Delivers a notification somewhere. Implementations report failures as
/// errors; the notifier decides what to do with them.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// SMTP delivery through lettre's tokio transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn new(mail: &MailConfig, timeout: Duration) -> Result<Self> {
        let builder = if mail.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&mail.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&mail.host)
                .tls(Tls::Opportunistic(TlsParameters::new(mail.host.clone())?))
        };

        let transport = builder
            .port(mail.port)
            .credentials(Credentials::new(mail.user.clone(), mail.pass.clone()))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            transport,
            from: mail.from.parse()?,
            to: mail.to.parse()?,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(notification.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                notification.text.clone(),
                notification.html.clone(),
            ))?;

        self.transport.send(message).await?;
        Ok(())
    }
}

struct NotifierInner {
    transport: Arc<dyn MailTransport>,
    base_url: String,
    admin_token: String,
    timeout: Duration,
}

/// Cheap to clone; clones share the same delivery tasks. A disabled
/// notifier turns `notify` into a no-op.
#[derive(Clone)]
pub struct Notifier {
    inner: Option<Arc<NotifierInner>>,
    tasks: TaskTracker,
}

impl Notifier {
    pub fn disabled() -> Self {
        Self {
            inner: None,
            tasks: TaskTracker::new(),
        }
    }

    pub fn new(
        transport: Arc<dyn MailTransport>,
        base_url: impl Into<String>,
        admin_token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Some(Arc::new(NotifierInner {
                transport,
                base_url: base_url.into(),
                admin_token: admin_token.into(),
                timeout,
            })),
            tasks: TaskTracker::new(),
        }
    }

    /// SMTP notifier when mail is configured, disabled otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.mail {
            Some(mail) => {
                let mailer = SmtpMailer::new(mail, config.notify_timeout)?;
                info!(host = %mail.host, port = mail.port, to = %mail.to, "moderation emails enabled");
                Ok(Self::new(
                    Arc::new(mailer),
                    config.base_url.clone(),
                    config.admin_token.clone(),
                    config.notify_timeout,
                ))
            }
            None => {
                info!("SMTP not configured, moderation emails disabled");
                Ok(Self::disabled())
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Number of deliveries still in flight.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Fire-and-forget delivery of the moderation email for `entry`. The
    /// task is tracked so `shutdown` can wait for it.
    pub fn notify(&self, entry: &Entry) {
        let Some(inner) = self.inner.clone() else {
            debug!(entry_id = entry.id, "mail not configured, skipping notification");
            return;
        };

        let notification = match build_notification(&inner.base_url, &inner.admin_token, entry) {
            Ok(notification) => notification,
            Err(e) => {
                error!(entry_id = entry.id, error = %e, "failed to build notification");
                return;
            }
        };

        let entry_id = entry.id;
        self.tasks.spawn(async move {
            match tokio::time::timeout(inner.timeout, inner.transport.send(&notification)).await {
                Ok(Ok(())) => info!(entry_id, "moderation email sent"),
                Ok(Err(e)) => warn!(entry_id, error = %e, "moderation email failed"),
                Err(_) => warn!(
                    entry_id,
                    timeout_secs = inner.timeout.as_secs_f64(),
                    "moderation email timed out"
                ),
            }
        });
    }

    /// Wait up to `grace` for in-flight deliveries. Returns `false` if some
    /// were still running when the grace period ran out.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tasks.close();
        let pending = self.tasks.len();
        if pending == 0 {
            return true;
        }

        info!(pending, "waiting for moderation emails to finish");
        match tokio::time::timeout(grace, self.tasks.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    abandoned = self.tasks.len(),
                    "moderation emails still pending at shutdown"
                );
                false
            }
        }
    }
}

/// Render the moderation email for `entry`. All entry fields are untrusted;
/// the HTML body relies on maud's escaping for them.
pub fn build_notification(base_url: &str, admin_token: &str, entry: &Entry) -> Result<Notification> {
    let approve_url = action_link(base_url, "approve", entry.id, admin_token)?;
    let reject_url = action_link(base_url, "reject", entry.id, admin_token)?;

    let subject = format!("New guestbook entry from {}", entry.name);

    let text = format!(
        "New guestbook entry #{id}\n\n\
         Name: {name}\n\
         Submitted: {created_at}\n\n\
         {message}\n\n\
         Approve: {approve_url}\n\
         Reject: {reject_url}\n",
        id = entry.id,
        name = entry.name,
        created_at = entry.created_at,
        message = entry.message,
    );

    let html = html! {
        h2 { "New guestbook entry #" (entry.id) }
        p { strong { "Name: " } (entry.name) }
        p { strong { "Submitted: " } (entry.created_at) }
        blockquote { (entry.message) }
        p {
            a href=(approve_url) { "Approve" }
            " | "
            a href=(reject_url) { "Reject" }
        }
    }
    .into_string();

    Ok(Notification {
        subject,
        text,
        html,
        approve_url,
        reject_url,
    })
}

fn action_link(base_url: &str, action: &str, id: i64, token: &str) -> Result<String> {
    let mut url = Url::parse(&format!("{base_url}/admin/{action}"))?;
    url.query_pairs_mut()
        .append_pair("id", &id.to_string())
        .append_pair("token", token);
    Ok(url.into())
}
