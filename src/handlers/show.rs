use std::fmt;
use std::path::Path;

use crate::settings::{StoredSecret, StoredSettings};

fn secret_state(secret: &StoredSecret) -> &'static str {
    match secret {
        StoredSecret::Encrypted(_) => "<encrypted>",
        StoredSecret::Plain(value) if value.trim().is_empty() => "<empty>",
        StoredSecret::Plain(_) => "<set>",
    }
}

fn text_or_empty(value: &str) -> &str {
    if value.trim().is_empty() { "<empty>" } else { value }
}

/// Settings as the `show` command prints them; API keys never appear.
pub struct SettingsReport<'a> {
    pub stored: &'a StoredSettings,
    pub path: &'a Path,
}

impl fmt::Display for SettingsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stored = self.stored;
        let flags = &stored.flags;

        writeln!(f, "settings file:      {}", self.path.display())?;
        writeln!(f, "company_id:         {}", text_or_empty(&stored.company_id))?;
        writeln!(f, "public_key:         {}", secret_state(&stored.public_key))?;
        writeln!(f, "private_key:        {}", secret_state(&stored.private_key))?;
        writeln!(f, "site_url:           {}", text_or_empty(&stored.site_url))?;
        writeln!(f, "member_id:          {}", text_or_empty(&stored.member_id))?;
        writeln!(f, "work_type:          {}", text_or_empty(&stored.work_type))?;
        writeln!(f, "billable_option:    {}", stored.billable_option)?;
        writeln!(f, "client_id:          {}", text_or_empty(&stored.client_id))?;
        writeln!(f, "timezone_offset:    {:+}", stored.timezone_offset)?;
        writeln!(f, "detail_description: {}", flags.detail_description)?;
        writeln!(f, "internal_analysis:  {}", flags.internal_analysis)?;
        writeln!(f, "resolution:         {}", flags.resolution)?;
        writeln!(f, "email_resource:     {}", flags.email_resource)?;
        writeln!(f, "email_contact:      {}", flags.email_contact)?;
        writeln!(f, "email_cc:           {}", flags.email_cc)?;

        let lock = if stored.is_locked() {
            "locked (PIN required)"
        } else {
            "plain text"
        };
        writeln!(f, "credentials:        {lock}")?;

        let missing = stored.missing_fields();
        if missing.is_empty() {
            writeln!(f, "ready to submit")
        } else {
            writeln!(f, "missing:            {}", missing.join(", "))
        }
    }
}

pub fn render_settings(stored: &StoredSettings, path: &Path) -> String {
    SettingsReport { stored, path }.to_string()
}
