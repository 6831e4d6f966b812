//! CSV exports of [`Timesheet`]s.
//!
//! Fields are separated with `;`. Text fields are always quoted (with inner
//! quotes doubled), while numbers and dates are written as is.

use std::fmt::Display;

use common::DateTimeOf;

use crate::domain::{timesheet::Entry, Timesheet};

/// Header of the [`Timesheet`] row in a [`timesheet()`] export.
const TIMESHEET_HEADER: &str = "Id;EmployeeId;PeriodStart;PeriodEnd;Status;\
                                SubmittedAt;ApprovedAt;Notes;TotalHours;\
                                TotalKm;TotalPieces;TotalPay";

/// Header of [`Entry`] rows in a [`timesheet()`] export.
const ENTRY_HEADER: &str = "WorkDate;Project;Task;Hours;Km;Pieces;HourRate;\
                            KmRate;PieceRate;EntryPay;Comment";

/// Header of an [`export()`].
const EXPORT_HEADER: &str = "TimesheetId;PeriodStart;PeriodEnd;Status;\
                             WorkDate;Project;Task;Hours;Km;Pieces;HourRate;\
                             KmRate;PieceRate;EntryPay;Comment";

/// Renders a single [`Timesheet`] with all its [`Entry`]s.
#[must_use]
pub fn timesheet(timesheet: &Timesheet) -> String {
    let totals = timesheet.totals();

    let mut out = String::new();
    line(&mut out, [TIMESHEET_HEADER.to_owned()]);
    line(
        &mut out,
        [
            timesheet.id().to_string(),
            text(timesheet.employee_id()),
            timesheet.period().start().to_string(),
            timesheet.period().end().to_string(),
            text(timesheet.status()),
            text(timestamp(timesheet.submitted_at())),
            text(timestamp(timesheet.approved_at())),
            text(timesheet.notes().map_or("", AsRef::as_ref)),
            totals.hours.to_string(),
            totals.km.to_string(),
            totals.pieces.to_string(),
            totals.pay.to_string(),
        ],
    );
    out.push('\n');
    line(&mut out, ["Entries:".to_owned()]);
    line(&mut out, [ENTRY_HEADER.to_owned()]);
    for e in timesheet.entries() {
        line(&mut out, entry_fields(e));
    }
    out
}

/// Renders an export of the provided [`Timesheet`]s with one row per
/// [`Entry`] and a summary row per [`Timesheet`].
///
/// [`Timesheet`]s are rendered in ascending order of their period start,
/// regardless of the provided order.
#[must_use]
pub fn export<'t>(
    timesheets: impl IntoIterator<Item = &'t Timesheet>,
) -> String {
    let mut timesheets = timesheets.into_iter().collect::<Vec<_>>();
    timesheets.sort_by_key(|t| t.period().start());

    let mut out = String::new();
    line(&mut out, [EXPORT_HEADER.to_owned()]);
    for t in timesheets {
        let prefix = [
            t.id().to_string(),
            t.period().start().to_string(),
            t.period().end().to_string(),
        ];

        if t.entries().is_empty() {
            let placeholder =
                ["", "", "", "0", "0", "0", "0", "0", "0", "0", ""];
            line(
                &mut out,
                prefix
                    .iter()
                    .cloned()
                    .chain([text(t.status())])
                    .chain(placeholder.map(str::to_owned)),
            );
            continue;
        }

        for e in t.entries() {
            line(
                &mut out,
                prefix
                    .iter()
                    .cloned()
                    .chain([text(t.status())])
                    .chain(entry_fields(e)),
            );
        }

        let totals = t.totals();
        line(
            &mut out,
            prefix.iter().cloned().chain([
                text(format!("TOTAL_{}", t.status())),
                String::new(),
                String::new(),
                String::new(),
                totals.hours.to_string(),
                totals.km.to_string(),
                totals.pieces.to_string(),
                String::new(),
                String::new(),
                String::new(),
                totals.pay.to_string(),
                String::new(),
            ]),
        );
    }
    out
}

/// Returns fields of the provided [`Entry`] row.
fn entry_fields(e: &Entry) -> [String; 11] {
    let d = &e.details;
    [
        d.work_date.to_string(),
        text(&d.project),
        text(&d.task),
        d.hours.to_string(),
        d.km.to_string(),
        d.pieces.to_string(),
        d.hour_rate.to_string(),
        d.km_rate.to_string(),
        d.piece_rate.to_string(),
        e.pay().to_string(),
        text(d.comment.as_ref().map_or("", AsRef::as_ref)),
    ]
}

/// Appends a row of the provided fields to the `out`put.
fn line(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (i, f) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push_str(&f);
    }
    out.push('\n');
}

/// Quotes the provided text field.
fn text(value: impl Display) -> String {
    format!("\"{}\"", value.to_string().replace('"', "\"\""))
}

/// Formats the provided optional timestamp in RFC 3339 format.
fn timestamp<Of: ?Sized>(at: Option<DateTimeOf<Of>>) -> String {
    at.map(|at| at.to_rfc3339()).unwrap_or_default()
}
