//! Sound feedback resolution and settings

use serde::{Deserialize, Serialize};
use wms_core::messages;
use wms_core::model::SoundEvent;
use wms_core::ValidationError;

use super::{ServiceContext, ServiceError};
use crate::db::repos::{JobTypeRepo, NewSoundSetting, SoundRepo, SoundSetting, SubJobRepo};

/// Where a resolved sound came from, most specific first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundSource {
    SubJob,
    Job,
    Database,
    Config,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSound {
    pub event: SoundEvent,
    pub sound_file: String,
    pub volume: f32,
    pub source: SoundSource,
}

/// Pick the most specific candidate: sub job, then job, then site default.
pub fn pick_setting(
    candidates: &[SoundSetting],
    job_id: Option<i64>,
    sub_job_id: Option<i64>,
) -> Option<(&SoundSetting, SoundSource)> {
    let by_sub = sub_job_id.and_then(|sub| {
        candidates
            .iter()
            .find(|s| s.is_enabled && s.sub_job_id == Some(sub))
            .map(|s| (s, SoundSource::SubJob))
    });
    let by_job = || {
        job_id.and_then(|job| {
            candidates
                .iter()
                .find(|s| s.is_enabled && s.sub_job_id.is_none() && s.job_id == Some(job))
                .map(|s| (s, SoundSource::Job))
        })
    };
    let site_default = || {
        candidates
            .iter()
            .find(|s| s.is_enabled && s.job_id.is_none() && s.sub_job_id.is_none())
            .map(|s| (s, SoundSource::Database))
    };
    by_sub.or_else(by_job).or_else(site_default)
}

/// Request body for creating or replacing a setting
#[derive(Debug, Clone, Deserialize)]
pub struct SoundSettingInput {
    pub job_id: Option<i64>,
    pub sub_job_id: Option<i64>,
    pub event_type: String,
    pub sound_file: String,
    pub volume: Option<f32>,
    pub is_enabled: Option<bool>,
}

pub struct SoundService<'a> {
    ctx: ServiceContext<'a>,
}

impl<'a> SoundService<'a> {
    pub fn new(ctx: ServiceContext<'a>) -> Self {
        Self { ctx }
    }

    /// Sound for an event, or `None` when sound is switched off.
    pub async fn resolve(
        &self,
        job_id: Option<i64>,
        sub_job_id: Option<i64>,
        event: SoundEvent,
    ) -> Result<Option<ResolvedSound>, ServiceError> {
        let sound = &self.ctx.config.sound;
        if !sound.enabled {
            return Ok(None);
        }

        let candidates = SoundRepo::new(self.ctx.pool)
            .candidates(job_id, sub_job_id, event.as_str())
            .await?;

        let resolved = match pick_setting(&candidates, job_id, sub_job_id) {
            Some((setting, source)) => ResolvedSound {
                event,
                sound_file: setting.sound_file.clone(),
                volume: setting.volume,
                source,
            },
            None => ResolvedSound {
                event,
                sound_file: sound.defaults.for_event(event).to_string(),
                volume: sound.default_volume,
                source: SoundSource::Config,
            },
        };
        Ok(Some(resolved))
    }

    /// Like [`resolve`](Self::resolve) but never fails; a lookup error
    /// falls back to the configured default.
    pub async fn resolve_or_default(
        &self,
        job_id: Option<i64>,
        sub_job_id: Option<i64>,
        event: SoundEvent,
    ) -> Option<ResolvedSound> {
        match self.resolve(job_id, sub_job_id, event).await {
            Ok(sound) => sound,
            Err(e) => {
                tracing::warn!(error = %e, event = %event, "sound lookup failed, using default");
                let sound = &self.ctx.config.sound;
                sound.enabled.then(|| ResolvedSound {
                    event,
                    sound_file: sound.defaults.for_event(event).to_string(),
                    volume: sound.default_volume,
                    source: SoundSource::Config,
                })
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<SoundSetting>, ServiceError> {
        Ok(SoundRepo::new(self.ctx.pool).list().await?)
    }

    pub async fn upsert(&self, input: SoundSettingInput) -> Result<SoundSetting, ServiceError> {
        let event: SoundEvent = input.event_type.parse()?;

        let sound_file = input.sound_file.trim();
        if sound_file.is_empty() {
            return Err(ValidationError::Empty { field: "ไฟล์เสียง" }.into());
        }
        if sound_file.chars().count() > 255 {
            return Err(ValidationError::TooLong {
                field: "ไฟล์เสียง",
                max: 255,
            }
            .into());
        }

        let volume = input.volume.unwrap_or(self.ctx.config.sound.default_volume);
        if !(0.0..=1.0).contains(&volume) {
            return Err(ValidationError::OutOfRange {
                field: "ระดับเสียง",
                value: volume.to_string(),
            }
            .into());
        }

        let mut job_id = input.job_id;
        if let Some(id) = job_id {
            JobTypeRepo::new(self.ctx.pool)
                .find(id)
                .await?
                .ok_or_else(|| ServiceError::not_found(messages::job_not_found(id)))?;
        }
        if let Some(sub_id) = input.sub_job_id {
            let sub = SubJobRepo::new(self.ctx.pool)
                .find(sub_id)
                .await?
                .ok_or_else(|| ServiceError::not_found(messages::sub_job_not_found(sub_id)))?;
            match job_id {
                Some(id) if id != sub.main_job_id => {
                    return Err(ServiceError::bad_input(messages::sub_job_not_in_job(
                        sub_id, id,
                    )))
                }
                _ => job_id = Some(sub.main_job_id),
            }
        }

        let setting = SoundRepo::new(self.ctx.pool)
            .upsert(&NewSoundSetting {
                job_id,
                sub_job_id: input.sub_job_id,
                event_type: event.as_str().to_string(),
                sound_file: sound_file.to_string(),
                volume,
                is_enabled: input.is_enabled.unwrap_or(true),
            })
            .await?;

        tracing::info!(id = setting.id, event = %event, ?job_id, sub_job_id = ?input.sub_job_id, "sound setting saved");
        Ok(setting)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !SoundRepo::new(self.ctx.pool).delete(id).await? {
            return Err(ServiceError::not_found(messages::record_not_found(
                "sound setting",
                &id.to_string(),
            )));
        }
        Ok(())
    }

    pub async fn toggle(&self, id: i64) -> Result<SoundSetting, ServiceError> {
        Ok(SoundRepo::new(self.ctx.pool).toggle(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setting(id: i64, job: Option<i64>, sub: Option<i64>, file: &str) -> SoundSetting {
        SoundSetting {
            id,
            job_id: job,
            sub_job_id: sub,
            event_type: "success".into(),
            sound_file: file.into(),
            volume: 0.5,
            is_enabled: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sub_job_beats_job_beats_default() {
        let candidates = vec![
            setting(1, None, None, "default.mp3"),
            setting(2, Some(4), None, "job.mp3"),
            setting(3, Some(4), Some(40), "sub.mp3"),
        ];

        let (s, src) = pick_setting(&candidates, Some(4), Some(40)).unwrap();
        assert_eq!((s.sound_file.as_str(), src), ("sub.mp3", SoundSource::SubJob));

        let (s, src) = pick_setting(&candidates, Some(4), Some(41)).unwrap();
        assert_eq!((s.sound_file.as_str(), src), ("job.mp3", SoundSource::Job));

        let (s, src) = pick_setting(&candidates, Some(5), None).unwrap();
        assert_eq!((s.sound_file.as_str(), src), ("default.mp3", SoundSource::Database));
    }

    #[test]
    fn nothing_configured() {
        assert!(pick_setting(&[], Some(1), Some(2)).is_none());
    }

    #[test]
    fn disabled_settings_skipped() {
        let mut sub = setting(3, Some(4), Some(40), "sub.mp3");
        sub.is_enabled = false;
        let candidates = vec![sub, setting(2, Some(4), None, "job.mp3")];
        let (s, _) = pick_setting(&candidates, Some(4), Some(40)).unwrap();
        assert_eq!(s.sound_file, "job.mp3");
    }
}
