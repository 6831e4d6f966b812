//! [`Timesheet`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{
        timesheet::{self, entry, Entry, Snapshot},
        user, Timesheet, User,
    },
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
    read,
};

impl<C, IDs> Database<Select<By<HashMap<timesheet::Id, Timesheet>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[timesheet::Id]>,
{
    type Ok = HashMap<timesheet::Id, Timesheet>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<timesheet::Id, Timesheet>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[timesheet::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        const ENTRIES_SQL: &str = "\
            SELECT id, timesheet_id, \
                   work_date, project, task, \
                   hours, km, pieces, \
                   hour_rate, km_rate, piece_rate, \
                   comment \
            FROM timesheet_entries \
            WHERE timesheet_id = ANY($1::UUID[]) \
            ORDER BY work_date, id";
        let mut entries = self
            .query(ENTRIES_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let timesheet_id: timesheet::Id = row.get("timesheet_id");
                let entry = Entry {
                    id: row.get("id"),
                    details: entry::Details {
                        work_date: row.get("work_date"),
                        project: row.get("project"),
                        task: row.get("task"),
                        hours: row.get("hours"),
                        km: row.get("km"),
                        pieces: row.get("pieces"),
                        hour_rate: row.get("hour_rate"),
                        km_rate: row.get("km_rate"),
                        piece_rate: row.get("piece_rate"),
                        comment: row.get("comment"),
                    },
                };
                (timesheet_id, entry)
            })
            .into_group_map();

        const SQL: &str = "\
            SELECT id, employee_id, \
                   period_start, period_end, \
                   status, notes, version, \
                   created_at, submitted_at, approved_at \
            FROM timesheets \
            WHERE id = ANY($1::UUID[])";
        self.query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id: timesheet::Id = row.get("id");
                let period = timesheet::Period::new(
                    row.get("period_start"),
                    row.get("period_end"),
                )
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)?;
                let timesheet = Timesheet::restore(Snapshot {
                    id,
                    employee_id: row.get("employee_id"),
                    period,
                    status: row.get("status"),
                    entries: entries.remove(&id).unwrap_or_default(),
                    notes: row.get("notes"),
                    version: row.get("version"),
                    created_at: row.get("created_at"),
                    submitted_at: row.get("submitted_at"),
                    approved_at: row.get("approved_at"),
                });
                Ok((id, timesheet))
            })
            .collect()
    }
}

impl<C> Database<Select<By<Option<Timesheet>, timesheet::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<timesheet::Id, Timesheet>, [timesheet::Id; 1]>>,
        Ok = HashMap<timesheet::Id, Timesheet>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Timesheet>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Timesheet>, timesheet::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<Timesheet>, read::timesheet::mine::Selector>>>
    for Postgres<C>
where
    C: Connection,
    Self: for<'i> Database<
        Select<By<HashMap<timesheet::Id, Timesheet>, &'i [timesheet::Id]>>,
        Ok = HashMap<timesheet::Id, Timesheet>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Timesheet>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Timesheet>, read::timesheet::mine::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::timesheet::mine::Selector {
            employee_id,
            filter,
        } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&employee_id];
        let filtering = filtering(&filter, &mut ps);

        let sql = format!(
            "SELECT id \
             FROM timesheets \
             WHERE employee_id = $1::UUID \
                   {filtering} \
             ORDER BY period_start DESC, id",
        );
        let ids = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect::<Vec<timesheet::Id>>();

        let mut found = self
            .execute(Select(By::new(ids.as_slice())))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }
}

impl<C>
    Database<
        Select<
            By<read::timesheet::list::Page, read::timesheet::list::Selector>,
        >,
    > for Postgres<C>
where
    C: Connection,
    Self: for<'i> Database<
            Select<
                By<HashMap<timesheet::Id, Timesheet>, &'i [timesheet::Id]>,
            >,
            Ok = HashMap<timesheet::Id, Timesheet>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<user::Id, User>, Vec<user::Id>>>,
            Ok = HashMap<user::Id, User>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = read::timesheet::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::timesheet::list::Page, read::timesheet::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::timesheet::list::Selector {
            arguments,
            filter:
                read::timesheet::list::Filter {
                    timesheet: filter,
                    employee_id,
                },
        } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let employee_idx = employee_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });
        let filtering = format!(
            "{employee} {rest}",
            employee = employee_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND employee_id = ${idx}::UUID"))
            }),
            rest = filtering(&filter, &mut ps),
        );

        let count_sql = format!(
            "SELECT COUNT(*)::INT8 AS count \
             FROM timesheets \
             WHERE TRUE {filtering}",
        );
        let total_count = self
            .query_opt(&count_sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i64>("count"));
        let total_count = u64::try_from(total_count).unwrap_or_default();

        let limit = i64::from(arguments.size());
        let offset = i64::try_from(arguments.offset()).unwrap_or(i64::MAX);
        ps.push(&limit);
        let limit_idx = ps.len();
        ps.push(&offset);
        let offset_idx = ps.len();

        let sql = format!(
            "SELECT id, employee_id \
             FROM timesheets \
             WHERE TRUE {filtering} \
             ORDER BY period_start DESC, id \
             LIMIT ${limit_idx}::INT8 \
             OFFSET ${offset_idx}::INT8",
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;
        let ids = rows
            .iter()
            .map(|row| row.get("id"))
            .collect::<Vec<timesheet::Id>>();
        let employee_ids = rows
            .iter()
            .map(|row| row.get("employee_id"))
            .unique()
            .collect::<Vec<user::Id>>();

        let mut timesheets = self
            .execute(Select(By::new(ids.as_slice())))
            .await
            .map_err(tracerr::wrap!())?;
        let employees = self
            .execute(Select(By::new(employee_ids)))
            .await
            .map_err(tracerr::wrap!())?;

        let items = ids
            .iter()
            .filter_map(|id| {
                let timesheet = timesheets.remove(id)?;
                let employee =
                    employees.get(&timesheet.employee_id())?.clone();
                Some(read::timesheet::list::Item {
                    timesheet,
                    employee,
                })
            })
            .collect::<Vec<_>>();

        Ok(read::timesheet::list::Page::new(
            arguments,
            items,
            total_count,
        ))
    }
}

impl<C> Database<Lock<By<Timesheet, timesheet::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Timesheet, timesheet::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: timesheet::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM timesheets \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<Timesheet>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Timesheet>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(timesheet): Insert<Timesheet>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(timesheet))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Timesheet>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(timesheet): Update<Timesheet>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = timesheet.id();
        let period = timesheet.period();
        let totals = timesheet.totals();

        const SQL: &str = "\
            INSERT INTO timesheets (\
                id, employee_id, \
                period_start, period_end, \
                status, notes, \
                total_hours, total_km, total_pieces, total_pay, \
                version, \
                created_at, submitted_at, approved_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::DATE, $4::DATE, \
                $5::INT2, $6::VARCHAR, \
                $7::NUMERIC, $8::NUMERIC, $9::INT8, $10::NUMERIC, \
                $11::INT4, \
                $12::TIMESTAMPTZ, $13::TIMESTAMPTZ, $14::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                notes = EXCLUDED.notes, \
                total_hours = EXCLUDED.total_hours, \
                total_km = EXCLUDED.total_km, \
                total_pieces = EXCLUDED.total_pieces, \
                total_pay = EXCLUDED.total_pay, \
                version = EXCLUDED.version, \
                submitted_at = EXCLUDED.submitted_at, \
                approved_at = EXCLUDED.approved_at";
        self.exec(
            SQL,
            &[
                &id,
                &timesheet.employee_id(),
                &period.start(),
                &period.end(),
                &timesheet.status(),
                &timesheet.notes(),
                &totals.hours,
                &totals.km,
                &totals.pieces,
                &totals.pay,
                &timesheet.version(),
                &timesheet.created_at(),
                &timesheet.submitted_at(),
                &timesheet.approved_at(),
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

        let entry_ids =
            timesheet.entries().iter().map(|e| e.id).collect::<Vec<_>>();
        const DELETE_SQL: &str = "\
            DELETE FROM timesheet_entries \
            WHERE timesheet_id = $1::UUID \
              AND id <> ALL($2::UUID[])";
        self.exec(DELETE_SQL, &[&id, &entry_ids])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        const UPSERT_SQL: &str = "\
            INSERT INTO timesheet_entries (\
                id, timesheet_id, \
                work_date, project, task, \
                hours, km, pieces, \
                hour_rate, km_rate, piece_rate, \
                entry_pay, comment\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::DATE, $4::VARCHAR, $5::VARCHAR, \
                $6::NUMERIC, $7::NUMERIC, $8::INT4, \
                $9::NUMERIC, $10::NUMERIC, $11::NUMERIC, \
                $12::NUMERIC, $13::VARCHAR\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET work_date = EXCLUDED.work_date, \
                project = EXCLUDED.project, \
                task = EXCLUDED.task, \
                hours = EXCLUDED.hours, \
                km = EXCLUDED.km, \
                pieces = EXCLUDED.pieces, \
                hour_rate = EXCLUDED.hour_rate, \
                km_rate = EXCLUDED.km_rate, \
                piece_rate = EXCLUDED.piece_rate, \
                entry_pay = EXCLUDED.entry_pay, \
                comment = EXCLUDED.comment";
        for e in timesheet.entries() {
            let d = &e.details;
            self.exec(
                UPSERT_SQL,
                &[
                    &e.id,
                    &id,
                    &d.work_date,
                    &d.project,
                    &d.task,
                    &d.hours,
                    &d.km,
                    &d.pieces,
                    &d.hour_rate,
                    &d.km_rate,
                    &d.piece_rate,
                    &e.pay(),
                    &d.comment,
                ],
            )
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
        }

        Ok(())
    }
}

/// Renders SQL conditions of the provided [`read::timesheet::Filter`],
/// pushing its parameters into `ps`.
fn filtering<'p>(
    filter: &'p read::timesheet::Filter,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let from_idx = filter.period_from.as_ref().map(|d| {
        ps.push(d);
        ps.len()
    });
    let to_idx = filter.period_to.as_ref().map(|d| {
        ps.push(d);
        ps.len()
    });
    let status_idx = filter.status.as_ref().map(|s| {
        ps.push(s);
        ps.len()
    });

    format!(
        "{from} {to} {status}",
        from = from_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!("AND period_start >= ${idx}::DATE"))
        }),
        to = to_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!("AND period_end <= ${idx}::DATE"))
        }),
        status = status_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!("AND status = ${idx}::INT2"))
        }),
    )
}
