//! Per-barcode popup notifications

use serde::Deserialize;
use wms_core::import::read_notification_rows;
use wms_core::messages;
use wms_core::model::{Barcode, PopupType, SoundEvent, ValidationError};

use super::{ServiceContext, ServiceError};
use crate::db::repos::{NewNotification, Notification, NotificationRepo};

const MAX_TITLE: usize = 255;
const MAX_MESSAGE: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationInput {
    pub barcode: String,
    pub event_type: Option<String>,
    pub popup_type: Option<String>,
    pub title: Option<String>,
    pub message: String,
}

impl NotificationInput {
    fn into_new(self, created_by: &str) -> Result<NewNotification, ValidationError> {
        let barcode = Barcode::new(&self.barcode)?;

        let event_type = match self.event_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse::<SoundEvent>()?,
            None => SoundEvent::Warning,
        };
        let popup_type = match self.popup_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse::<PopupType>()?,
            None => PopupType::default(),
        };

        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        if title.as_ref().is_some_and(|t| t.chars().count() > MAX_TITLE) {
            return Err(ValidationError::TooLong {
                field: "หัวข้อ",
                max: MAX_TITLE,
            });
        }

        let message = self.message.trim();
        if message.is_empty() {
            return Err(ValidationError::Empty { field: "ข้อความ" });
        }
        if message.chars().count() > MAX_MESSAGE {
            return Err(ValidationError::TooLong {
                field: "ข้อความ",
                max: MAX_MESSAGE,
            });
        }

        Ok(NewNotification {
            barcode: barcode.into_string(),
            event_type: event_type.as_str().to_string(),
            popup_type: popup_type.as_str().to_string(),
            title,
            message: message.to_string(),
            created_by: created_by.to_string(),
        })
    }
}

pub struct NotificationService<'a> {
    ctx: ServiceContext<'a>,
}

impl<'a> NotificationService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self { ctx }
    }

    pub async fn for_barcode(&self, barcode: &str) -> Result<Option<Notification>, ServiceError> {
        let barcode = Barcode::new(barcode)?;
        Ok(NotificationRepo::new(self.ctx.pool)
            .for_barcode(barcode.as_str())
            .await?)
    }

    pub async fn list(&self) -> Result<Vec<Notification>, ServiceError> {
        Ok(NotificationRepo::new(self.ctx.pool).list().await?)
    }

    pub async fn create(
        &self,
        input: NotificationInput,
        user: &str,
    ) -> Result<Notification, ServiceError> {
        let new = input.into_new(user)?;
        let created = NotificationRepo::new(self.ctx.pool).create(&new).await?;
        tracing::info!(id = created.id, barcode = %created.barcode, "notification created");
        Ok(created)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if NotificationRepo::new(self.ctx.pool).delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found(messages::record_not_found(
                "notification",
                &id.to_string(),
            )))
        }
    }

    pub async fn toggle(&self, id: i64) -> Result<Notification, ServiceError> {
        Ok(NotificationRepo::new(self.ctx.pool).toggle(id).await?)
    }

    pub async fn clear(&self) -> Result<u64, ServiceError> {
        let removed = NotificationRepo::new(self.ctx.pool).clear().await?;
        tracing::info!(removed, "notifications cleared");
        Ok(removed)
    }

    /// Replace every rule with the contents of a CSV file. Any invalid row
    /// rejects the whole file.
    pub async fn import_csv(&self, bytes: &[u8], user: &str) -> Result<u64, ServiceError> {
        let rows = read_notification_rows(bytes)?;
        if rows.is_empty() {
            return Err(ServiceError::bad_input(messages::NO_IMPORT_DATA));
        }

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            let line = row.line;
            let input = NotificationInput {
                barcode: row.barcode,
                event_type: Some(row.event_type),
                popup_type: Some(row.popup_type),
                title: Some(row.title),
                message: row.message,
            };
            let rule = input
                .into_new(user)
                .map_err(|e| ServiceError::bad_input(format!("แถว {}: {}", line, e)))?;
            rules.push(rule);
        }

        let inserted = NotificationRepo::new(self.ctx.pool)
            .replace_all(&rules)
            .await?;
        tracing::info!(inserted, user, "notifications replaced from CSV");
        Ok(inserted)
    }
}
