use crate::config::{MailSettings, OwnerRecord};
use crate::logbook::RunLog;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use lettre::message::Mailbox;
use lettre::{Message, SmtpTransport, Transport};

/// A plain-text message ready for the relay: headers plus body, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub from: String,
    pub to: String,
    pub cc: Option<String>,
    pub subject: String,
    pub body: String,
}

pub trait Mailer {
    fn send(&self, mail: &OutboundMail) -> Result<()>;
}

/// Delivers through the local mail transfer agent on port 25, no auth.
pub struct SmtpRelay {
    host: String,
}

impl SmtpRelay {
    #[must_use]
    pub fn new(host: &str) -> Self {
        SmtpRelay {
            host: host.to_string(),
        }
    }
}

impl Mailer for SmtpRelay {
    fn send(&self, mail: &OutboundMail) -> Result<()> {
        let mut builder = Message::builder()
            .from(
                mail.from
                    .parse::<Mailbox>()
                    .context("invalid sender address")?,
            )
            .to(mail
                .to
                .parse::<Mailbox>()
                .context("invalid recipient address")?);
        if let Some(cc) = &mail.cc {
            builder = builder.cc(cc.parse::<Mailbox>().context("invalid CC address")?);
        }
        let message = builder
            .subject(mail.subject.clone())
            .body(mail.body.clone())
            .context("failed to build message")?;

        let transport = SmtpTransport::builder_dangerous(self.host.as_str())
            .port(25)
            .build();
        transport
            .send(&message)
            .with_context(|| format!("relay {} refused the message", self.host))?;
        Ok(())
    }
}

/// Builds the notice telling a folder's owner their upload is verified.
#[must_use]
pub fn owner_notice(owner: &OwnerRecord, dest: &str, settings: &MailSettings) -> OutboundMail {
    let first_name = owner
        .display_name
        .split_whitespace()
        .next()
        .unwrap_or(&owner.display_name);

    OutboundMail {
        from: settings.sender.clone(),
        to: owner.recipient.clone(),
        cc: Some(settings.ops.clone()),
        subject: format!("{} data uploaded to {}", owner.folder, owner.remote_display),
        body: format!(
            "Hi {first_name},\n\n\
             The {} data has been archived and uploaded to {} ({dest}).\n\
             The upload was verified against the local archive, which has\n\
             been removed from the staging area.\n\n\
             This is an automated message from the backup service.\n",
            owner.folder, owner.remote_display
        ),
    }
}

/// Builds the end-of-run summary for the operations address.
#[must_use]
pub fn run_summary(log: &RunLog, date: NaiveDate, settings: &MailSettings) -> OutboundMail {
    let status = if log.error_count() == 0 {
        "OK"
    } else {
        "ERRORS"
    };
    OutboundMail {
        from: settings.sender.clone(),
        to: settings.ops.clone(),
        cc: None,
        subject: format!("Backup run for {date}: {status}"),
        body: log.render(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> OwnerRecord {
        OwnerRecord {
            label: "kHzLPA/".to_string(),
            recipient: "Hao.Ding@lbl.gov".to_string(),
            display_name: "Hao Ding".to_string(),
            remote_display: "Google Drive".to_string(),
            folder: "kHz LPA".to_string(),
        }
    }

    #[test]
    fn test_owner_notice_headers() {
        let settings = MailSettings::default();
        let mail = owner_notice(&owner(), "bellakhz:data/kHzLPA/Y2021/08-Aug", &settings);

        assert_eq!(mail.from, settings.sender);
        assert_eq!(mail.to, "Hao.Ding@lbl.gov");
        assert_eq!(mail.cc.as_deref(), Some(settings.ops.as_str()));
        assert!(mail.subject.contains("kHz LPA"));
        assert!(mail.subject.contains("Google Drive"));
    }

    #[test]
    fn test_owner_notice_greets_first_name() {
        let mail = owner_notice(
            &owner(),
            "bellakhz:data/kHzLPA/Y2021/08-Aug",
            &MailSettings::default(),
        );
        assert!(mail.body.starts_with("Hi Hao,"));
        assert!(mail.body.contains("bellakhz:data/kHzLPA/Y2021/08-Aug"));
    }

    #[test]
    fn test_run_summary_carries_whole_log() {
        let mut log = RunLog::new();
        log.info("Processing /netapp/Y2021/04-Apr/21_0406");
        log.error("Failed to upload");

        let date = NaiveDate::from_ymd_opt(2021, 4, 6).unwrap();
        let mail = run_summary(&log, date, &MailSettings::default());

        assert_eq!(mail.to, MailSettings::default().ops);
        assert!(mail.cc.is_none());
        assert!(mail.subject.contains("2021-04-06"));
        assert!(mail.subject.ends_with("ERRORS"));
        assert!(mail.body.contains("Processing /netapp"));
        assert!(mail.body.contains("Failed to upload"));
    }

    #[test]
    fn test_clean_run_summary_is_ok() {
        let mut log = RunLog::new();
        log.info("all done");
        let date = NaiveDate::from_ymd_opt(2021, 8, 19).unwrap();
        let mail = run_summary(&log, date, &MailSettings::default());
        assert!(mail.subject.ends_with("OK"));
    }
}
