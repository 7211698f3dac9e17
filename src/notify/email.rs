// src/notify/email.rs
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use metrics::counter;

use super::render::{render_summary, Summary};
use super::{refilter, Notifier};
use crate::config::NotificationConfig;
use crate::error::MonitorError;
use crate::model::{Announcement, KeywordSet};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

/// SMTP (implicit TLS) delivery. Built even when disabled or misconfigured so
/// the caller never has to special-case; `notify` then just reports false.
pub struct EmailNotifier {
    mailer: Option<Mailer>,
    subject_prefix: Option<String>,
}

impl EmailNotifier {
    pub fn from_config(cfg: &NotificationConfig) -> Self {
        let subject_prefix = cfg.email.subject_prefix.clone();
        if !cfg.enabled {
            tracing::info!("email notification disabled");
            return Self {
                mailer: None,
                subject_prefix,
            };
        }
        match Self::build_mailer(cfg) {
            Ok(mailer) => Self {
                mailer: Some(mailer),
                subject_prefix,
            },
            Err(e) => {
                tracing::error!(error = %e, "email notification unavailable");
                Self {
                    mailer: None,
                    subject_prefix,
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.mailer.is_some()
    }

    fn build_mailer(cfg: &NotificationConfig) -> std::result::Result<Mailer, MonitorError> {
        let email = &cfg.email;
        let missing = email.missing_fields();
        if !missing.is_empty() {
            return Err(MonitorError::Configuration(format!(
                "email settings incomplete, missing: {}",
                missing.join(", ")
            )));
        }

        let creds = Credentials::new(email.username.clone(), email.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&email.smtp_server)
            .map_err(|e| MonitorError::Configuration(format!("smtp relay {}: {e}", email.smtp_server)))?
            .port(email.smtp_port)
            .credentials(creds)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        let from = email
            .username
            .parse()
            .map_err(|e| MonitorError::Configuration(format!("sender address: {e}")))?;
        let to = email
            .recipient
            .parse()
            .map_err(|e| MonitorError::Configuration(format!("recipient address: {e}")))?;

        Ok(Mailer {
            transport,
            from,
            to,
        })
    }

    async fn send(mailer: &Mailer, summary: Summary) -> Result<()> {
        let msg = Message::builder()
            .from(mailer.from.clone())
            .to(mailer.to.clone())
            .subject(summary.subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(summary.body)
            .context("build email")?;

        mailer.transport.send(msg).await.context("send email")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, items: &[Announcement], keywords: &KeywordSet) -> bool {
        let Some(mailer) = &self.mailer else {
            tracing::info!("email notification inactive, skipping send");
            return false;
        };

        let items = refilter(items, keywords);
        if items.is_empty() {
            tracing::info!("no matching new announcements to mail");
            return false;
        }

        let summary = render_summary(&items, self.subject_prefix.as_deref(), Local::now());
        match Self::send(mailer, summary).await {
            Ok(()) => {
                tracing::info!(to = %mailer.to, count = items.len(), "notification mail sent");
                true
            }
            Err(e) => {
                counter!("monitor_notify_failures_total").increment(1);
                tracing::error!(error = ?e, "sending notification mail failed");
                false
            }
        }
    }
}
