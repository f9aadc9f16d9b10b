pub mod platform;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use std::time::Duration;

use wifi_sta::{Station, StationConfig, WakeCondition};

use crate::platform::{ScriptEvent, SimPlatform, StorageMode};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WakeArg {
    Terminal,
    Any,
}

impl From<WakeArg> for WakeCondition {
    fn from(arg: WakeArg) -> Self {
        match arg {
            WakeArg::Terminal => WakeCondition::Terminal,
            WakeArg::Any => WakeCondition::AnySignal,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StorageArg {
    Healthy,
    Full,
    Broken,
}

impl From<StorageArg> for StorageMode {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::Healthy => StorageMode::Healthy,
            StorageArg::Full => StorageMode::Full,
            StorageArg::Broken => StorageMode::Broken,
        }
    }
}

/// Drives a station through a scripted sequence of raw platform events and
/// prints every notification.
#[derive(Parser, Debug)]
#[command(name = "wifi-sta-sim")]
#[command(version, about)]
struct Args {
    /// Network name (overrides WIFI_SSID)
    #[arg(long)]
    ssid: Option<String>,

    /// Network secret (overrides WIFI_PASSWORD)
    #[arg(long)]
    password: Option<String>,

    /// Reconnect budget (overrides WIFI_MAX_RETRIES)
    #[arg(long)]
    max_retries: Option<u32>,

    /// Which pending signals wake the supervisor
    #[arg(long, value_enum, default_value_t = WakeArg::Any)]
    wake_on: WakeArg,

    /// Simulated storage partition state
    #[arg(long, value_enum, default_value_t = StorageArg::Healthy)]
    storage: StorageArg,

    /// Delay between scripted events; 0 delivers them in one burst
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,

    /// Events to deliver, in order (default: start got-ip)
    #[arg(value_enum)]
    events: Vec<ScriptEvent>,
}

pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = StationConfig::from_env()?.with_wake_on(args.wake_on.into());
    if let Some(ssid) = args.ssid {
        config = config.with_ssid(ssid);
    }
    if let Some(password) = args.password {
        config = config.with_password(password);
    }
    if let Some(max_retries) = args.max_retries {
        config = config.with_max_retries(max_retries);
    }

    let sim = SimPlatform::new(args.storage.into());
    let station = Station::init(sim.platform(), config, |state| {
        println!("wifi: {state}");
    })
    .context("failed to bring up station")?;

    let script = if args.events.is_empty() {
        vec![ScriptEvent::Start, ScriptEvent::GotIp]
    } else {
        args.events
    };
    let interval = Duration::from_millis(args.interval_ms);

    for (i, event) in script.into_iter().enumerate() {
        info!("-> {event:?}");
        sim.emit(event.to_raw((i % 250) as u8 + 2));
        tokio::time::sleep(interval).await;
    }
    // Let the supervisor drain whatever the last event raised.
    tokio::time::sleep(Duration::from_millis(20)).await;

    info!(
        "retries used: {}/{}, connect requests: {}, unconsumed signals: {:?}",
        station.adapter().retry_count(),
        station.adapter().max_retries(),
        sim.connect_requests(),
        station.pending_signals()
    );

    station.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_script_and_options() {
        let args = Args::try_parse_from([
            "wifi-sta-sim",
            "--ssid",
            "Lab",
            "--max-retries",
            "1",
            "--wake-on",
            "terminal",
            "--storage",
            "full",
            "start",
            "disconnect",
            "got-ip",
        ])
        .unwrap();

        assert_eq!(args.ssid.as_deref(), Some("Lab"));
        assert_eq!(args.max_retries, Some(1));
        assert_eq!(WakeCondition::from(args.wake_on), WakeCondition::Terminal);
        assert_eq!(StorageMode::from(args.storage), StorageMode::Full);
        assert_eq!(
            args.events,
            vec![ScriptEvent::Start, ScriptEvent::Disconnect, ScriptEvent::GotIp]
        );
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["wifi-sta-sim"]).unwrap();
        assert!(args.events.is_empty());
        assert_eq!(args.interval_ms, 50);
        assert_eq!(WakeCondition::from(args.wake_on), WakeCondition::AnySignal);
    }

    #[test]
    fn rejects_unknown_event() {
        assert!(Args::try_parse_from(["wifi-sta-sim", "reboot"]).is_err());
    }
}
