use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, TimeZone};

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn from_epoch_secs(value: i64, field: &str) -> Result<DateTime<Local>> {
    Local
        .timestamp_opt(value, 0)
        .single()
        .with_context(|| format!("{field} holds out-of-range epoch seconds {value}"))
}

pub fn decode_list(raw: &str, field: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).with_context(|| format!("failed to decode {field}"))
}
