use std::io::Write;

use crate::error::TimecardError;
use crate::service::{SubmitReport, TimeEntryService};
use crate::types::EntryForm;

pub fn print_report<W: Write>(report: &SubmitReport, out: &mut W) -> Result<(), TimecardError> {
    let mark = if report.success { "ok" } else { "failed" };
    writeln!(out, "[{mark}] {}", report.notice)?;
    writeln!(out, "  {}", report.log_line)?;
    if let Some(start) = &report.start {
        writeln!(out, "  started at {start}")?;
    }
    if let Some(next) = &report.next_start {
        writeln!(out, "  next entry starts at {next}")?;
    }
    Ok(())
}

/// Submit one entry and print the outcome. Returns whether it was accepted.
pub async fn submit_once<W: Write>(
    service: &mut TimeEntryService,
    form: &EntryForm,
    out: &mut W,
) -> Result<bool, TimecardError> {
    let report = service.submit(form).await;
    print_report(&report, out)?;
    Ok(report.success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_report_omits_missing_times() {
        let report = SubmitReport {
            success: false,
            notice: "Please enter a description".into(),
            log_line: "Error on ticket #7: Please enter a description".into(),
            start: None,
            next_start: None,
        };
        let mut out = Vec::new();
        print_report(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "[failed] Please enter a description\n  Error on ticket #7: Please enter a description\n"
        );
    }

    #[test]
    fn success_report_shows_next_start() {
        let report = SubmitReport {
            success: true,
            notice: "Entry registered successfully".into(),
            log_line: "Ticket #7 (1.5h) - Time entry created".into(),
            start: Some("08:00".into()),
            next_start: Some("09:30".into()),
        };
        let mut out = Vec::new();
        print_report(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[ok] Entry registered successfully\n"));
        assert!(text.contains("started at 08:00"));
        assert!(text.ends_with("next entry starts at 09:30\n"));
    }
}
