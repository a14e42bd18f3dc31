use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::systems::population_alerts::{AlertEvent, AlertKind};

/// One persisted alert, as written to the log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub timestamp_ms: u64,
    pub kind: AlertKind,
    pub message: String,
}

/// Appends alerts as JSON lines to any writer (a file in the binary).
pub struct AlertLog<W: Write> {
    writer: W,
    written: usize,
}

impl AlertLog<BufWriter<File>> {
    pub fn append_to_file(path: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open alert log {}", path))?;
        info!("Appending alerts to {}", path);
        Ok(AlertLog::new(BufWriter::new(file)))
    }
}

impl<W: Write> AlertLog<W> {
    pub fn new(writer: W) -> Self {
        AlertLog { writer, written: 0 }
    }

    pub fn record(&mut self, at: SystemTime, alerts: &[AlertEvent]) -> Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }
        let timestamp_ms = at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        for alert in alerts {
            let record = AlertRecord {
                timestamp_ms,
                kind: alert.kind,
                message: alert.message.clone(),
            };
            serde_json::to_writer(&mut self.writer, &record)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush().context("failed to flush alert log")?;
        self.written += alerts.len();
        info!("Logged {} new alert(s)", alerts.len());
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
