use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::settings::{BillableOption, Settings};
use crate::types::entry::{TimeEntry, format_timestamp};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IdentifierRef {
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NameRef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ChargeToType {
    ServiceTicket,
}

/// Body of `POST /time/entries`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryPayload {
    pub company: IdentifierRef,
    pub charge_to_id: u64,
    pub charge_to_type: ChargeToType,
    pub member: IdentifierRef,
    pub actual_hours: f64,
    pub billable_option: BillableOption,
    pub work_type: NameRef,
    pub notes: String,
    pub time_start: String,
    pub time_end: String,
    pub add_to_detail_description_flag: bool,
    pub add_to_internal_analysis_flag: bool,
    pub add_to_resolution_flag: bool,
    pub email_resource_flag: bool,
    pub email_contact_flag: bool,
    pub email_cc_flag: bool,
}

impl TimeEntryPayload {
    pub fn build(
        settings: &Settings,
        entry: &TimeEntry,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        let flags = settings.flags;
        Self {
            company: IdentifierRef {
                identifier: settings.company_id.clone(),
            },
            charge_to_id: entry.ticket_id,
            charge_to_type: ChargeToType::ServiceTicket,
            member: IdentifierRef {
                identifier: settings.member_id.clone(),
            },
            actual_hours: entry.hours,
            billable_option: settings.billable_option,
            work_type: NameRef {
                name: settings.work_type.clone(),
            },
            notes: entry.notes.clone(),
            time_start: format_timestamp(start),
            time_end: format_timestamp(end),
            add_to_detail_description_flag: flags.detail_description,
            add_to_internal_analysis_flag: flags.internal_analysis,
            add_to_resolution_flag: flags.resolution,
            email_resource_flag: flags.email_resource,
            email_contact_flag: flags.email_contact,
            email_cc_flag: flags.email_cc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::entry::utc_window;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn serializes_with_connectwise_field_names() {
        let settings = Settings {
            member_id: "amora".into(),
            public_key: "p".into(),
            private_key: "q".into(),
            ..Settings::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let entry = TimeEntry {
            id: "abcd1234".into(),
            ticket_id: 98765,
            hours: 1.5,
            notes: "Replaced switch".into(),
            date,
        };
        let (start, end) = utc_window(date, 8.0, 1.5, -4.0).unwrap();

        let value = serde_json::to_value(TimeEntryPayload::build(&settings, &entry, start, end))
            .unwrap();

        assert_eq!(
            value,
            json!({
                "company": {"identifier": "Intwo"},
                "chargeToId": 98765,
                "chargeToType": "ServiceTicket",
                "member": {"identifier": "amora"},
                "actualHours": 1.5,
                "billableOption": "DoNotBill",
                "workType": {"name": "Remote-Standard"},
                "notes": "Replaced switch",
                "timeStart": "2024-03-14T12:00:00Z",
                "timeEnd": "2024-03-14T13:30:00Z",
                "addToDetailDescriptionFlag": false,
                "addToInternalAnalysisFlag": true,
                "addToResolutionFlag": false,
                "emailResourceFlag": false,
                "emailContactFlag": false,
                "emailCcFlag": false
            })
        );
    }
}
