//! Terminal scan station
//!
//! With `--barcode` given, each one is scanned once. Without,
//! the station reads one barcode per line from stdin (a keyboard-wedge
//! scanner types the code followed by Enter) until `:quit` or EOF.
//!
//! Station commands:
//!   :notes <text>   attach notes to the following scans
//!   :clear          drop the current notes
//!   :summary        today's count for the selected job
//!   :quit           leave the station

use std::io::Write;

use anyhow::{bail, Result};
use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use wms_core::model::SoundEvent;
use wms_server::services::scan::{ScanOutcome, ScanRequest};
use wms_server::services::{ResolvedSound, ScanService, ServiceError, SoundService};

use super::Context;

#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Main job id the scans are recorded against
    #[arg(long, short = 'j')]
    pub job: i64,

    /// Sub job id
    #[arg(long, short = 's')]
    pub sub_job: Option<i64>,

    /// Notes attached to every scan
    #[arg(long, short = 'n')]
    pub notes: Option<String>,

    /// Operator recorded on the scans (default: scanning.default_user)
    #[arg(long, short = 'u', env = "WMS_USER")]
    pub user: Option<String>,

    /// Barcode to scan (repeatable); reads stdin interactively when absent
    #[arg(long = "barcode", short = 'b')]
    pub barcodes: Vec<String>,
}

/// One line typed at the station
#[derive(Debug, PartialEq, Eq)]
enum StationInput {
    Barcode(String),
    Notes(String),
    ClearNotes,
    Summary,
    Quit,
    Blank,
    Unknown(String),
}

impl StationInput {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Blank;
        }
        let Some(command) = line.strip_prefix(':') else {
            return Self::Barcode(line.to_string());
        };
        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map(|(n, r)| (n, r.trim()))
            .unwrap_or((command, ""));
        match name {
            "notes" | "n" if !rest.is_empty() => Self::Notes(rest.to_string()),
            "notes" | "n" | "clear" => Self::ClearNotes,
            "summary" | "s" => Self::Summary,
            "quit" | "q" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

pub async fn run_scan(args: ScanArgs, ctx: &Context) -> Result<()> {
    let user = ctx.user(args.user.as_deref()).to_string();
    let mut station = Station {
        ctx,
        job_id: args.job,
        sub_job_id: args.sub_job,
        notes: args.notes.filter(|n| !n.trim().is_empty()),
        user,
        rejected: 0,
    };

    if !args.barcodes.is_empty() {
        for barcode in &args.barcodes {
            station.scan(barcode).await?;
        }
        if station.rejected > 0 {
            bail!("{} of {} scans rejected", station.rejected, args.barcodes.len());
        }
        return Ok(());
    }

    station.interactive().await
}

struct Station<'a> {
    ctx: &'a Context,
    job_id: i64,
    sub_job_id: Option<i64>,
    notes: Option<String>,
    user: String,
    rejected: usize,
}

impl Station<'_> {
    async fn interactive(&mut self) -> Result<()> {
        self.summary().await?;
        if !self.ctx.out.is_json() {
            println!("Scan a barcode (:notes <text>, :clear, :summary, :quit)");
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            self.prompt();
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match StationInput::parse(&line) {
                StationInput::Barcode(code) => self.scan(&code).await?,
                StationInput::Notes(text) => {
                    println!("notes: {}", text);
                    self.notes = Some(text);
                }
                StationInput::ClearNotes => {
                    println!("notes cleared");
                    self.notes = None;
                }
                StationInput::Summary => self.summary().await?,
                StationInput::Quit => break,
                StationInput::Blank => {}
                StationInput::Unknown(cmd) => println!("unknown command :{}", cmd),
            }
        }

        tracing::info!(user = %self.user, rejected = self.rejected, "scan station closed");
        Ok(())
    }

    fn prompt(&self) {
        if self.ctx.out.is_json() {
            return;
        }
        match &self.notes {
            Some(notes) => print!("[{}] scan> ", notes),
            None => print!("scan> "),
        }
        std::io::stdout().flush().ok();
    }

    /// Scan one barcode. Only infrastructure failures end the station.
    async fn scan(&mut self, barcode: &str) -> Result<()> {
        let ctx = self.ctx;
        let services = ctx.services()?;
        let request = ScanRequest {
            barcode: barcode.to_string(),
            job_id: Some(self.job_id),
            sub_job_id: self.sub_job_id,
            notes: self.notes.clone(),
        };

        match ScanService::new(services).process(&request, &self.user).await {
            Ok(outcome) => self.accepted(&outcome)?,
            Err(ServiceError::Db(e)) => return Err(ServiceError::Db(e).into()),
            Err(err) => {
                self.rejected += 1;
                let sound = match &err {
                    ServiceError::Duplicate(d) => d.sound.clone(),
                    ServiceError::MissingDependencies(m) => m.sound.clone(),
                    _ => {
                        SoundService::new(services)
                            .resolve_or_default(Some(self.job_id), self.sub_job_id, SoundEvent::Error)
                            .await
                    }
                };
                self.refused(barcode, &err, sound.as_ref())?;
            }
        }
        Ok(())
    }

    fn accepted(&self, outcome: &ScanOutcome) -> Result<()> {
        self.ctx.out.emit(&json!({ "success": true, "data": outcome }), |_| {
            println!("✓ {}  [{}]", outcome.message, outcome.scan_date_local);
            if let Some(n) = &outcome.notification {
                match &n.title {
                    Some(title) => println!("  ⚠ {} ({}): {}", title, n.popup_type, n.message),
                    None => println!("  ⚠ ({}) {}", n.popup_type, n.message),
                }
            }
            print_sound(outcome.sound.as_ref());
        })
    }

    fn refused(&self, barcode: &str, err: &ServiceError, sound: Option<&ResolvedSound>) -> Result<()> {
        let data = match err {
            ServiceError::Duplicate(d) => serde_json::to_value(d)?,
            ServiceError::MissingDependencies(m) => serde_json::to_value(m)?,
            _ => json!({ "barcode": barcode, "sound": sound }),
        };
        self.ctx.out.emit(
            &json!({ "success": false, "message": err.to_string(), "data": data }),
            |_| {
                println!("✗ {}", err);
                if let ServiceError::Duplicate(d) = err {
                    println!(
                        "  first scan #{} at {} by {}",
                        d.existing.id, d.existing.scan_date_local, d.existing.user_id
                    );
                }
                print_sound(sound);
            },
        )
    }

    async fn summary(&self) -> Result<()> {
        let summary = ScanService::new(self.ctx.services()?)
            .today_summary(self.job_id, self.sub_job_id, self.notes.as_deref())
            .await?;
        self.ctx.out.emit(&summary, |s| {
            println!(
                "{} > {} on {}: {} scans today",
                s.job_name, s.sub_job_name, s.date, s.count
            )
        })
    }
}

fn print_sound(sound: Option<&ResolvedSound>) {
    if let Some(s) = sound {
        println!("  ♪ {} ({:.0}%)", s.sound_file, s.volume * 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_barcodes() {
        assert_eq!(
            StationInput::parse("  BC001 \r"),
            StationInput::Barcode("BC001".into())
        );
        assert_eq!(StationInput::parse("   "), StationInput::Blank);
    }

    #[test]
    fn station_commands() {
        assert_eq!(
            StationInput::parse(":notes pallet 7"),
            StationInput::Notes("pallet 7".into())
        );
        assert_eq!(StationInput::parse(":notes"), StationInput::ClearNotes);
        assert_eq!(StationInput::parse(":clear"), StationInput::ClearNotes);
        assert_eq!(StationInput::parse(":summary"), StationInput::Summary);
        assert_eq!(StationInput::parse(":q"), StationInput::Quit);
        assert_eq!(
            StationInput::parse(":bogus x"),
            StationInput::Unknown("bogus".into())
        );
    }
}
