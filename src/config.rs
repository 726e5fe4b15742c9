use anyhow::{Result, bail};
use std::collections::HashMap;
use std::fs;

/// Optional KEY=VALUE override file for mail delivery settings.
const MAIL_CONF: &str = "/etc/bella_backup/mail.conf";

/// One mounted file server and the labelled data trees beneath it.
#[derive(Debug, Clone)]
pub struct MountEntry {
    /// Local mount point, with trailing slash.
    pub mount: String,
    /// rclone remote alias the data under this mount uploads to.
    pub remote: String,
    /// Subdirectory labels between the mount and the `Yyyyy/` tree.
    /// An empty string means the date tree sits directly under the mount.
    pub labels: Vec<String>,
}

/// The deploy-time mount table, processed in order.
#[must_use]
pub fn mount_table() -> Vec<MountEntry> {
    vec![
        MountEntry {
            mount: "/netapp/".to_string(),
            remote: "bella".to_string(),
            labels: vec![String::new()],
        },
        MountEntry {
            mount: "/bella/htw/".to_string(),
            remote: "bellahtw".to_string(),
            labels: vec!["Undulator/".to_string(), "PWlaserData/".to_string()],
        },
        MountEntry {
            mount: "/bella/khz/".to_string(),
            remote: "bellakhz".to_string(),
            labels: vec!["kHzLPA/".to_string()],
        },
    ]
}

/// Who gets told when their folder's upload has been verified.
///
/// Labels without a record simply produce no owner notice; not every source
/// directory has a designated external owner.
#[derive(Debug, Clone)]
pub struct OwnerRecord {
    pub label: String,
    pub recipient: String,
    pub display_name: String,
    pub remote_display: String,
    pub folder: String,
}

pub type OwnerTable = HashMap<String, OwnerRecord>;

/// Builds the label -> owner map, failing fast on bad deploy config.
pub fn owner_table() -> Result<OwnerTable> {
    let records = vec![
        OwnerRecord {
            label: "Undulator/".to_string(),
            recipient: "Alex.Hartman@lbl.gov".to_string(),
            display_name: "Alex Hartman".to_string(),
            remote_display: "Google Drive".to_string(),
            folder: "Undulator".to_string(),
        },
        OwnerRecord {
            label: "kHzLPA/".to_string(),
            recipient: "Hao.Ding@lbl.gov".to_string(),
            display_name: "Hao Ding".to_string(),
            remote_display: "Google Drive".to_string(),
            folder: "kHz LPA".to_string(),
        },
    ];
    validate_owners(records)
}

fn validate_owners(records: Vec<OwnerRecord>) -> Result<OwnerTable> {
    let mut table = OwnerTable::new();
    for rec in records {
        if rec.label.is_empty()
            || rec.recipient.is_empty()
            || rec.display_name.is_empty()
            || rec.remote_display.is_empty()
            || rec.folder.is_empty()
        {
            bail!("owner record for label {:?} has an empty field", rec.label);
        }
        if table.insert(rec.label.clone(), rec).is_some() {
            bail!("duplicate owner record label");
        }
    }
    Ok(table)
}

/// Mail delivery settings: local relay plus the fixed identities.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub relay: String,
    pub sender: String,
    pub ops: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        MailSettings {
            relay: "localhost".to_string(),
            sender: "bella-backup@lbl.gov".to_string(),
            ops: "bella-data-ops@lbl.gov".to_string(),
        }
    }
}

impl MailSettings {
    /// Loads settings, applying any overrides found in the conf file.
    #[must_use]
    pub fn load() -> Self {
        let mut settings = MailSettings::default();
        let Ok(content) = fs::read_to_string(MAIL_CONF) else {
            return settings;
        };

        for line in content.lines() {
            if let Some((k, v)) = line.split_once('=') {
                let val = v.trim().trim_matches('"').to_string();
                match k.trim() {
                    "RELAY_HOST" => settings.relay = val,
                    "SENDER" => settings.sender = val,
                    "OPS_EMAIL" => settings.ops = val,
                    _ => {}
                }
            }
        }
        settings
    }
}
