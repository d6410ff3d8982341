//! Notification repository: inbox rows, per-event settings, and templates.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use deciframe_core::notify::{Channels, Frequency};

use crate::entities::{notification_settings, notification_templates, notifications};

/// Update payload for a per-event setting row.
#[derive(Debug, Clone)]
pub struct SettingUpdate {
    /// Delivery frequency.
    pub frequency: Frequency,
    /// Escalation delay in hours; `None` disables escalation.
    pub threshold_hours: Option<i32>,
    /// Email channel enabled.
    pub channel_email: bool,
    /// In-app channel enabled.
    pub channel_in_app: bool,
    /// Push channel enabled (reserved; no transport yet).
    pub channel_push: bool,
}

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ---- inbox rows ----

    /// Persists an in-app notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        organization_id: i32,
        user_id: i32,
        message: &str,
        link: Option<&str>,
        event_type: Option<&str>,
        is_escalation: bool,
    ) -> Result<notifications::Model, DbErr> {
        notifications::ActiveModel {
            organization_id: Set(organization_id),
            user_id: Set(user_id),
            message: Set(message.to_string()),
            link: Set(link.map(ToString::to_string)),
            event_type: Set(event_type.map(ToString::to_string)),
            is_read: Set(false),
            is_escalation: Set(is_escalation),
            email_sent: Set(false),
            email_sent_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Looks up one notification row by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        notification_id: i32,
    ) -> Result<Option<notifications::Model>, DbErr> {
        notifications::Entity::find_by_id(notification_id)
            .one(&self.db)
            .await
    }

    /// Lists a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        organization_id: i32,
        user_id: i32,
        unread_only: bool,
        limit: u64,
    ) -> Result<Vec<notifications::Model>, DbErr> {
        let mut query = notifications::Entity::find()
            .filter(notifications::Column::OrganizationId.eq(organization_id))
            .filter(notifications::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notifications::Column::IsRead.eq(false));
        }
        query
            .order_by_desc(notifications::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    /// Count of unread notifications for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_count(&self, organization_id: i32, user_id: i32) -> Result<u64, DbErr> {
        notifications::Entity::find()
            .filter(notifications::Column::OrganizationId.eq(organization_id))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.db)
            .await
    }

    /// Marks one notification read.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_read(
        &self,
        organization_id: i32,
        user_id: i32,
        notification_id: i32,
    ) -> Result<bool, DbErr> {
        let Some(notification) = notifications::Entity::find_by_id(notification_id)
            .filter(notifications::Column::OrganizationId.eq(organization_id))
            .filter(notifications::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
        else {
            return Ok(false);
        };

        let mut active: notifications::ActiveModel = notification.into();
        active.is_read = Set(true);
        active.update(&self.db).await?;
        Ok(true)
    }

    /// Marks all of a user's notifications read.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_all_read(&self, organization_id: i32, user_id: i32) -> Result<u64, DbErr> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, true.into())
            .filter(notifications::Column::OrganizationId.eq(organization_id))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Records the email send outcome on a notification row.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn record_email_result(
        &self,
        notification_id: i32,
        sent: bool,
    ) -> Result<(), DbErr> {
        let Some(notification) = notifications::Entity::find_by_id(notification_id)
            .one(&self.db)
            .await?
        else {
            return Ok(());
        };

        let mut active: notifications::ActiveModel = notification.into();
        active.email_sent = Set(sent);
        active.email_sent_at = Set(sent.then(|| chrono::Utc::now().into()));
        active.update(&self.db).await?;
        Ok(())
    }

    // ---- per-event settings ----

    /// Looks up the setting row for (tenant, event).
    ///
    /// A missing row means the event is muted for the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_setting(
        &self,
        organization_id: i32,
        event_name: &str,
    ) -> Result<Option<notification_settings::Model>, DbErr> {
        notification_settings::Entity::find()
            .filter(notification_settings::Column::OrganizationId.eq(organization_id))
            .filter(notification_settings::Column::EventName.eq(event_name))
            .one(&self.db)
            .await
    }

    /// Lists all setting rows for a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_settings(
        &self,
        organization_id: i32,
    ) -> Result<Vec<notification_settings::Model>, DbErr> {
        notification_settings::Entity::find()
            .filter(notification_settings::Column::OrganizationId.eq(organization_id))
            .order_by_asc(notification_settings::Column::EventName)
            .all(&self.db)
            .await
    }

    /// Creates or updates the setting row for (tenant, event).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_setting(
        &self,
        organization_id: i32,
        event_name: &str,
        update: SettingUpdate,
    ) -> Result<notification_settings::Model, DbErr> {
        let now = chrono::Utc::now().into();
        match self.get_setting(organization_id, event_name).await? {
            Some(existing) => {
                let mut active: notification_settings::ActiveModel = existing.into();
                active.frequency = Set(update.frequency.as_str().to_string());
                active.threshold_hours = Set(update.threshold_hours);
                active.channel_email = Set(update.channel_email);
                active.channel_in_app = Set(update.channel_in_app);
                active.channel_push = Set(update.channel_push);
                active.updated_at = Set(now);
                active.update(&self.db).await
            }
            None => {
                notification_settings::ActiveModel {
                    organization_id: Set(organization_id),
                    event_name: Set(event_name.to_string()),
                    frequency: Set(update.frequency.as_str().to_string()),
                    threshold_hours: Set(update.threshold_hours),
                    channel_email: Set(update.channel_email),
                    channel_in_app: Set(update.channel_in_app),
                    channel_push: Set(update.channel_push),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
            }
        }
    }

    // ---- message templates ----

    /// Looks up the message template for (tenant, event).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_template(
        &self,
        organization_id: i32,
        event_name: &str,
    ) -> Result<Option<notification_templates::Model>, DbErr> {
        notification_templates::Entity::find()
            .filter(notification_templates::Column::OrganizationId.eq(organization_id))
            .filter(notification_templates::Column::EventName.eq(event_name))
            .one(&self.db)
            .await
    }

    /// Creates or updates the message template for (tenant, event).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upsert_template(
        &self,
        organization_id: i32,
        event_name: &str,
        subject_template: &str,
        body_template: &str,
        email_enabled: bool,
        in_app_enabled: bool,
    ) -> Result<notification_templates::Model, DbErr> {
        let now = chrono::Utc::now().into();
        match self.get_template(organization_id, event_name).await? {
            Some(existing) => {
                let mut active: notification_templates::ActiveModel = existing.into();
                active.subject_template = Set(subject_template.to_string());
                active.body_template = Set(body_template.to_string());
                active.email_enabled = Set(email_enabled);
                active.in_app_enabled = Set(in_app_enabled);
                active.updated_at = Set(now);
                active.update(&self.db).await
            }
            None => {
                notification_templates::ActiveModel {
                    organization_id: Set(organization_id),
                    event_name: Set(event_name.to_string()),
                    subject_template: Set(subject_template.to_string()),
                    body_template: Set(body_template.to_string()),
                    email_enabled: Set(email_enabled),
                    in_app_enabled: Set(in_app_enabled),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
            }
        }
    }
}

/// Decodes the channel booleans of a setting row.
#[must_use]
pub fn channels_of(setting: &notification_settings::Model) -> Channels {
    Channels {
        in_app: setting.channel_in_app,
        email: setting.channel_email,
        push: setting.channel_push,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting(in_app: bool, email: bool, push: bool) -> notification_settings::Model {
        let now = chrono::Utc::now().into();
        notification_settings::Model {
            id: 1,
            organization_id: 1,
            event_name: "problem_created".to_string(),
            frequency: "immediate".to_string(),
            threshold_hours: None,
            channel_email: email,
            channel_in_app: in_app,
            channel_push: push,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_channels_of_decodes_all_flags() {
        let channels = channels_of(&setting(true, false, false));
        assert!(channels.in_app && !channels.email && !channels.push);
        assert!(!channels.is_muted());
    }

    #[test]
    fn test_push_only_setting_is_not_muted() {
        let channels = channels_of(&setting(false, false, true));
        assert!(!channels.is_muted());
        assert!(channels.wants_inbox());
    }

    #[test]
    fn test_all_channels_off_is_muted() {
        assert!(channels_of(&setting(false, false, false)).is_muted());
    }
}
