// libs/doctor-cell/src/services/availability.rs

use std::collections::HashSet;

use anyhow::Result;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, TableQuery};

use crate::models::{
    AppointmentSlot, BookedTime, DoctorDetail, DoctorError, DoctorSchedule, WeeklySlots,
};

/// Weekday keys used in `available_hours`, indexed from Sunday.
pub const WEEKDAY_KEYS: [&str; 7] = [
    "Domingo",
    "Lunes",
    "Martes",
    "Miercoles",
    "Jueves",
    "Viernes",
    "Sabado",
];

/// 0 = Sunday .. 6 = Saturday, or `None` for an unknown key.
pub fn weekday_index(name: &str) -> Option<i64> {
    WEEKDAY_KEYS
        .iter()
        .position(|key| *key == name)
        .map(|idx| idx as i64)
}

/// Leading hour of an "HH:MM" string. Minutes are dropped.
fn whole_hour(time: &str) -> Option<u32> {
    time.split(':').next()?.trim().parse().ok()
}

/// Open hourly slots of the week that contains `week_start`.
///
/// Each schedule day lands on `week_start` shifted by the weekday difference,
/// so the result spans Sunday..Saturday of that calendar week. Days before
/// `now`'s date are dropped whole; earlier hours of the current day are not.
/// Slots present in `booked` are skipped. Unknown weekday keys and
/// unparseable ranges contribute nothing.
pub fn compute_available_slots(
    schedule: &DoctorSchedule,
    booked: &HashSet<DateTime<Utc>>,
    week_start: NaiveDate,
    now: DateTime<FixedOffset>,
) -> Vec<AppointmentSlot> {
    let offset = *now.offset();
    let today = now.date_naive();
    let start_index = week_start.weekday().num_days_from_sunday() as i64;

    let mut slots = Vec::new();

    for (day_name, ranges) in schedule {
        let Some(day_index) = weekday_index(day_name) else {
            debug!("Ignoring unknown weekday key '{}'", day_name);
            continue;
        };

        let date = week_start + Duration::days(day_index - start_index);
        if date < today {
            continue;
        }

        for range in ranges {
            let (Some(start_hour), Some(end_hour)) =
                (whole_hour(&range.start_time), whole_hour(&range.end_time))
            else {
                continue;
            };

            for hour in start_hour..end_hour.min(24) {
                let Some(local) = NaiveTime::from_hms_opt(hour, 0, 0).map(|t| date.and_time(t)) else {
                    continue;
                };
                let Some(instant) = offset.from_local_datetime(&local).single() else {
                    continue;
                };
                let starts_at = instant.with_timezone(&Utc);

                if booked.contains(&starts_at) {
                    continue;
                }

                slots.push(AppointmentSlot {
                    starts_at,
                    date,
                    time: format!("{:02}:00", hour),
                });
            }
        }
    }

    slots.sort_by_key(|slot| slot.starts_at);
    slots.dedup_by_key(|slot| slot.starts_at);
    slots
}

/// Sunday and Saturday of the calendar week containing `week_start`.
pub fn week_bounds(week_start: NaiveDate) -> (NaiveDate, NaiveDate) {
    let sunday = week_start - Duration::days(week_start.weekday().num_days_from_sunday() as i64);
    (sunday, sunday + Duration::days(6))
}

/// Moves the displayed week forward (`direction > 0`) or back.
pub fn shift_week(week_start: NaiveDate, direction: i64) -> NaiveDate {
    week_start + Duration::days(7 * direction)
}

pub struct AvailabilityService {
    supabase: SupabaseClient,
    offset: FixedOffset,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            offset: config.clinic_offset(),
        }
    }

    /// Open slots for the doctor's week starting at `week_start`
    /// (today in clinic time when absent).
    pub async fn get_week_slots(
        &self,
        doctor_id: &str,
        week_start: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<WeeklySlots, DoctorError> {
        let now = Utc::now().with_timezone(&self.offset);
        self.get_week_slots_at(doctor_id, week_start, now, auth_token)
            .await
    }

    pub async fn get_week_slots_at(
        &self,
        doctor_id: &str,
        week_start: Option<NaiveDate>,
        now: DateTime<FixedOffset>,
        auth_token: &str,
    ) -> Result<WeeklySlots, DoctorError> {
        let week_start = week_start.unwrap_or_else(|| now.date_naive());
        debug!("Computing slots for doctor {} in week of {}", doctor_id, week_start);

        let doctor: DoctorDetail = self
            .supabase
            .select_one(
                &TableQuery::table("doctor_details")
                    .select("profile_id,available_hours")
                    .eq("profile_id", doctor_id),
                auth_token,
            )
            .await?
            .ok_or(DoctorError::NotFound)?;

        let (first_day, last_day) = week_bounds(week_start);
        let booked = self
            .get_booked_times(doctor_id, first_day, last_day, auth_token)
            .await?;

        let slots = compute_available_slots(&doctor.schedule(), &booked, week_start, now);
        debug!("Found {} open slots", slots.len());

        Ok(WeeklySlots {
            doctor_id: doctor_id.to_string(),
            week_start,
            previous_week: shift_week(week_start, -1),
            next_week: shift_week(week_start, 1),
            first_day,
            last_day,
            total_slots: slots.len(),
            slots,
        })
    }

    async fn get_booked_times(
        &self,
        doctor_id: &str,
        first_day: NaiveDate,
        last_day: NaiveDate,
        auth_token: &str,
    ) -> Result<HashSet<DateTime<Utc>>> {
        let from = self.local_instant(first_day, NaiveTime::MIN);
        let to = self.local_instant(last_day, NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN));

        let rows: Vec<BookedTime> = self
            .supabase
            .select(
                &TableQuery::table("appointments")
                    .select("scheduled_at")
                    .eq("doctor_id", doctor_id)
                    .gte("scheduled_at", from.to_rfc3339_opts(SecondsFormat::Millis, true))
                    .lte("scheduled_at", to.to_rfc3339_opts(SecondsFormat::Millis, true)),
                auth_token,
            )
            .await?;

        Ok(rows.into_iter().map(|row| row.scheduled_at).collect())
    }

    fn local_instant(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        // Fixed offsets never produce ambiguous local times.
        self.offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| date.and_time(time).and_utc())
    }
}
