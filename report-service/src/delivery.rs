//! Hand-off of finished reports to download and email collaborators.

use anyhow::anyhow;

use crate::{
    error::{ReportError, ReportResult},
    grid::xlsx::CONTENT_TYPE,
    orchestrator::Report,
};

/// A rendered report ready to be sent as a file download.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn from_report(report: &Report) -> ReportResult<Self> {
        Ok(Self {
            filename: report.filename.clone(),
            content_type: CONTENT_TYPE,
            bytes: report.to_bytes()?,
        })
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Recipients::One(to) => vec![to],
            Recipients::Many(to) => to,
        }
    }
}

impl From<&str> for Recipients {
    fn from(to: &str) -> Self {
        Recipients::One(to.to_string())
    }
}

impl From<String> for Recipients {
    fn from(to: String) -> Self {
        Recipients::One(to)
    }
}

impl From<Vec<String>> for Recipients {
    fn from(to: Vec<String>) -> Self {
        Recipients::Many(to)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachment: Download,
}

/// Outbound email transport.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()>;
}

/// Render `report` and send it as an attachment.
pub async fn deliver_by_email(
    mailer: &dyn Mailer,
    report: &Report,
    to: impl Into<Recipients>,
    subject: &str,
    body: &str,
) -> ReportResult<()> {
    let to: Vec<String> = to
        .into()
        .into_vec()
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if to.is_empty() {
        return Err(ReportError::Delivery(anyhow!("no recipients given")));
    }

    let message = EmailMessage {
        to,
        subject: subject.to_string(),
        body: body.to_string(),
        attachment: Download::from_report(report)?,
    };
    let recipients = message.to.len();

    mailer.send(message).await.map_err(ReportError::Delivery)?;
    tracing::info!(recipients, filename = %report.filename, "report emailed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grid::Template,
        orchestrator::ReportPeriod,
    };
    use parking_lot::Mutex;
    use time::macros::date;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("smtp unavailable");
            }
            self.sent.lock().push(message);
            Ok(())
        }
    }

    fn report() -> Report {
        let period = ReportPeriod::Day(date!(2024 - 01 - 01));
        Report {
            period,
            title: period.title(),
            filename: period.filename(),
            days: vec![date!(2024 - 01 - 01)],
            feeders: Vec::new(),
            rows: Vec::new(),
            analyses: Vec::new(),
            document: Template::standard().instantiate(),
        }
    }

    #[test]
    fn download_carries_spreadsheet_content_type() {
        let d = Download::from_report(&report()).unwrap();
        assert_eq!(d.filename, "feeder-report-2024-01-01.xlsx");
        assert_eq!(d.content_type, CONTENT_TYPE);
        assert_eq!(
            d.content_disposition(),
            "attachment; filename=\"feeder-report-2024-01-01.xlsx\""
        );
        assert!(d.bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn email_goes_to_every_recipient() {
        let mailer = RecordingMailer::default();
        let to = vec!["ops@example.com".to_string(), " lead@example.com ".to_string()];

        deliver_by_email(&mailer, &report(), to, "Daily report", "Attached.")
            .await
            .unwrap();

        let sent = mailer.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["ops@example.com", "lead@example.com"]);
        assert_eq!(sent[0].attachment.filename, "feeder-report-2024-01-01.xlsx");
    }

    #[tokio::test]
    async fn empty_recipient_is_rejected() {
        let mailer = RecordingMailer::default();
        let res = deliver_by_email(&mailer, &report(), "  ", "s", "b").await;
        assert!(matches!(res, Err(ReportError::Delivery(_))));
        assert!(mailer.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let mailer = RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        };
        let res = deliver_by_email(&mailer, &report(), "ops@example.com", "s", "b").await;
        assert!(matches!(res, Err(ReportError::Delivery(_))));
    }
}
