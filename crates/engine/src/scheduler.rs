//! Cron-style scheduler.
//!
//! A minute tick drives everything time-based: delayed-job execution every
//! tick, review events at midnight, triage passes every half hour, the
//! milestone sweeps and report runs at the morning report hour, and the
//! model-retraining invocation markers. All boundaries are evaluated in
//! the configured local timezone.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde_json::json;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use deciframe_core::report::ReportFrequency;
use deciframe_core::workflow::events;
use deciframe_db::repositories::{OrganizationRepository, ReportRepository};

use crate::dispatch::NotificationDispatcher;
use crate::pipeline::ReportPipeline;
use crate::triggers::EventPublisher;

const REPORT_HOUR: u32 = 7;
const DELAYED_JOB_BATCH: u64 = 100;

/// The background scheduler loop.
pub struct Scheduler {
    organizations: OrganizationRepository,
    reports: ReportRepository,
    dispatcher: NotificationDispatcher,
    pipeline: ReportPipeline,
    publisher: Arc<dyn EventPublisher>,
    timezone: Tz,
}

impl Scheduler {
    /// Creates a scheduler evaluating boundaries in `timezone`.
    #[must_use]
    pub fn new(
        organizations: OrganizationRepository,
        reports: ReportRepository,
        dispatcher: NotificationDispatcher,
        pipeline: ReportPipeline,
        publisher: Arc<dyn EventPublisher>,
        timezone: Tz,
    ) -> Self {
        Self {
            organizations,
            reports,
            dispatcher,
            pipeline,
            publisher,
            timezone,
        }
    }

    /// Ticks once a minute until cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        info!(timezone = %self.timezone, "scheduler started");
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_boundary = None;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let now = Utc::now().with_timezone(&self.timezone);
            let boundary = (now.date_naive(), now.hour(), now.minute());
            // Interval drift must not double-fire a minute boundary.
            if last_boundary == Some(boundary) {
                continue;
            }
            last_boundary = Some(boundary);

            self.tick(now).await;
        }
        info!("scheduler stopped");
    }

    async fn tick(&self, now: DateTime<Tz>) {
        self.dispatcher
            .process_due_jobs(self.publisher.as_ref(), DELAYED_JOB_BATCH)
            .await;

        let today = now.date_naive();
        let (hour, minute) = (now.hour(), now.minute());

        if hour == 0 && minute == 0 {
            self.raise_review_events(today).await;
        }

        if minute % 30 == 0 {
            debug!("triage pass");
        }

        if hour == REPORT_HOUR && minute == 0 {
            self.dispatcher
                .sweep_milestones_due_soon(self.publisher.as_ref(), today)
                .await;
            self.dispatcher
                .sweep_milestones_overdue(self.publisher.as_ref(), today)
                .await;
            self.run_due_reports(now).await;
        }

        // Model retraining runs out of process; these mark the invocations.
        if now.weekday() == chrono::Weekday::Sun && hour == 2 && minute == 0 {
            info!("weekly model retraining invoked");
        }
        if today.day() == 1 && hour == 3 && minute == 0 {
            info!("monthly model retraining invoked");
        }
    }

    async fn raise_review_events(&self, today: NaiveDate) {
        let organizations = match self.organizations.list().await {
            Ok(orgs) => orgs,
            Err(e) => {
                error!(error = %e, "could not list organizations for review events");
                return;
            }
        };
        let review_events = review_events_for(today);
        for org in &organizations {
            for event_name in &review_events {
                self.publisher.publish(crate::queue::Event::new(
                    *event_name,
                    org.id,
                    json!({ "date": today.to_string() }),
                ));
            }
        }
    }

    async fn run_due_reports(&self, now: DateTime<Tz>) {
        // Gate against the start of the local day so a template already run
        // today is skipped even after a restart.
        let start_of_day = self
            .timezone
            .from_local_datetime(&now.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default())
            .earliest()
            .map_or_else(|| now.with_timezone(&Utc), |dt| dt.with_timezone(&Utc));

        for frequency in report_frequencies_for(now.date_naive()) {
            let templates = match self.reports.due_templates(frequency, start_of_day).await {
                Ok(templates) => templates,
                Err(e) => {
                    error!(frequency = frequency.as_str(), error = %e, "report template scan failed");
                    continue;
                }
            };
            for template in templates {
                let pipeline = self.pipeline.clone();
                tokio::spawn(async move {
                    pipeline.run(&template).await;
                });
            }
        }
    }
}

/// The review events due at the midnight boundary of `date`.
fn review_events_for(date: NaiveDate) -> Vec<&'static str> {
    let mut due = vec![events::DAILY_REVIEW];
    if date.weekday() == chrono::Weekday::Mon {
        due.push(events::WEEKLY_REVIEW);
    }
    if date.day() == 1 {
        due.push(events::MONTHLY_REVIEW);
        if matches!(date.month(), 1 | 4 | 7 | 10) {
            due.push(events::QUARTERLY_REVIEW);
        }
    }
    due
}

/// The report frequencies that fire on `date`.
fn report_frequencies_for(date: NaiveDate) -> Vec<ReportFrequency> {
    let mut due = vec![ReportFrequency::Daily];
    if date.weekday() == chrono::Weekday::Mon {
        due.push(ReportFrequency::Weekly);
    }
    if date.day() == 1 {
        due.push(ReportFrequency::Monthly);
    }
    due
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ordinary_weekday_fires_daily_only() {
        // 2026-08-27 is a Thursday.
        assert_eq!(review_events_for(date(2026, 8, 27)), vec!["daily_review"]);
        assert_eq!(
            report_frequencies_for(date(2026, 8, 27)),
            vec![ReportFrequency::Daily]
        );
    }

    #[test]
    fn test_monday_adds_weekly() {
        // 2026-08-24 is a Monday.
        assert_eq!(
            review_events_for(date(2026, 8, 24)),
            vec!["daily_review", "weekly_review"]
        );
        assert_eq!(
            report_frequencies_for(date(2026, 8, 24)),
            vec![ReportFrequency::Daily, ReportFrequency::Weekly]
        );
    }

    #[test]
    fn test_first_of_quarter_adds_monthly_and_quarterly() {
        // 2026-10-01 opens a quarter.
        assert_eq!(
            review_events_for(date(2026, 10, 1)),
            vec!["daily_review", "monthly_review", "quarterly_review"]
        );
    }

    #[test]
    fn test_first_of_ordinary_month_adds_monthly_only() {
        assert_eq!(
            review_events_for(date(2026, 9, 1)),
            vec!["daily_review", "monthly_review"]
        );
        assert_eq!(
            report_frequencies_for(date(2026, 9, 1)),
            vec![ReportFrequency::Daily, ReportFrequency::Monthly]
        );
    }
}
