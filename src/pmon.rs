//! Optical power monitoring (OPM)
//!
//! Monitors exist in a forward and a reverse direction; every query and
//! configuration call takes a `reverse` flag selecting the `-rev` command
//! variant.

use crate::commands::{self, AlarmType, ThresholdSettings};
use crate::error::{Result, Tl1Error};
use crate::policy::ErrorPolicy;
use crate::portspec::PortSpec;
use crate::response::{strip_quoted, ResponseBlock};
use crate::session::Session;

/// A port with a power monitor fitted, and how it is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedPort {
    /// Port number
    pub port: u32,
    /// Monitor mode string as reported by the switch
    pub mode: String,
}

/// Power monitor configuration for one port.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Port number
    pub port: u32,
    /// Configured wavelength in nm
    pub wavelength: f64,
    /// Reported-power offset in dB
    pub offset: f64,
    /// Averaging-time code (1..=8)
    pub averaging_time: u32,
}

/// Measured power on one port.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerReading {
    /// Port number
    pub port: u32,
    /// Measured power in dBm
    pub dbm: f64,
}

/// Alarm threshold state for one port. `high` is absent for DEGRADED
/// alarms, where only the low threshold is relevant.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmThreshold {
    /// Port number
    pub port: u32,
    /// Arming mode: `OFF`, `SINGLE` or `CONT`
    pub mode: String,
    /// Trigger edge
    pub edge: String,
    /// High threshold in dBm
    pub high: Option<f64>,
    /// Low threshold in dBm
    pub low: f64,
}

/// Alarm state reported for one port, e.g. `CONT` or `CONT,TRIGGERED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmState {
    /// Port number
    pub port: u32,
    /// Raw state string
    pub state: String,
}

/// Power-monitor operations on an authenticated session.
///
/// Construction probes both directions; a switch without monitors fails
/// the probe with a classified error.
pub struct PowerMonitor<'a> {
    session: &'a mut Session,
    policy: ErrorPolicy,
}

impl<'a> PowerMonitor<'a> {
    /// Probe power-monitor support in both directions and build the facade.
    pub fn new(session: &'a mut Session) -> Result<Self> {
        let mut monitor = Self {
            session,
            policy: ErrorPolicy::interactive(),
        };
        monitor.ports(false)?;
        monitor.ports(true)?;
        Ok(monitor)
    }

    /// Which ports have monitors fitted in the given direction.
    pub fn ports(&mut self, reverse: bool) -> Result<Vec<FittedPort>> {
        let target = if reverse { "revpmon" } else { "pmon" };
        let block = self.session.exchange(&commands::rtrv_eqpt(target), self.policy)?;
        parse_fitted_block(&block)
    }

    /// Configure the monitors on `ports` with wavelength (nm), offset (dB)
    /// and averaging-time code.
    pub fn set_config(
        &mut self,
        ports: &PortSpec,
        wavelength: f64,
        offset: f64,
        averaging_time: u8,
        reverse: bool,
    ) -> Result<()> {
        let cmd = commands::set_port_pmon(ports, wavelength, offset, averaging_time, reverse);
        self.session.exchange(&cmd, self.policy)?;
        Ok(())
    }

    /// Query monitor configuration; `None` queries every monitored port.
    pub fn config(&mut self, ports: Option<&PortSpec>, reverse: bool) -> Result<Vec<MonitorConfig>> {
        let cmd = commands::rtrv_port_pmon(ports, reverse);
        let block = self.session.exchange(&cmd, self.policy)?;
        parse_config_block(&block)
    }

    /// Query measured power; `None` queries every monitored port.
    pub fn power(&mut self, ports: Option<&PortSpec>, reverse: bool) -> Result<Vec<PowerReading>> {
        let cmd = commands::rtrv_port_power(ports, reverse);
        let block = self.session.exchange(&cmd, self.policy)?;
        parse_power_block(&block)
    }

    /// Set alarm threshold parameters on `ports`; at least one parameter
    /// must be given.
    pub fn set_alarm_threshold(
        &mut self,
        ports: &PortSpec,
        settings: &ThresholdSettings,
        reverse: bool,
    ) -> Result<()> {
        if settings.is_empty() {
            return Err(Tl1Error::InvalidArgument(
                "at least one threshold parameter must be provided".to_string(),
            ));
        }
        let cmd = commands::set_th_pmon(ports, settings, reverse);
        self.session.exchange(&cmd, self.policy)?;
        Ok(())
    }

    /// Query alarm thresholds for the given alarm type.
    pub fn alarm_threshold(
        &mut self,
        ports: Option<&PortSpec>,
        alarm_type: AlarmType,
        reverse: bool,
    ) -> Result<Vec<AlarmThreshold>> {
        let cmd = commands::rtrv_th_pmon(ports, alarm_type, reverse);
        let block = self.session.exchange(&cmd, self.policy)?;
        parse_threshold_block(&block, alarm_type)
    }

    /// Query alarm state for the given alarm type.
    pub fn alarm_state(
        &mut self,
        ports: Option<&PortSpec>,
        alarm_type: AlarmType,
        reverse: bool,
    ) -> Result<Vec<AlarmState>> {
        let cmd = commands::rtrv_state_pmon(ports, alarm_type, reverse);
        let block = self.session.exchange(&cmd, self.policy)?;
        parse_state_block(&block)
    }

    /// Clear (re-arm) the alarms on `ports` for the given alarm type.
    pub fn clear_alarm_state(
        &mut self,
        ports: Option<&PortSpec>,
        alarm_type: AlarmType,
        reverse: bool,
    ) -> Result<()> {
        let cmd = commands::set_state_pmon(ports, alarm_type, reverse);
        self.session.exchange(&cmd, self.policy)?;
        Ok(())
    }
}

fn payload_lines(block: &ResponseBlock) -> impl Iterator<Item = (&String, &str)> {
    block
        .iter()
        .map(|line| (line, strip_quoted(line)))
        .filter(|(_, payload)| !payload.is_empty())
}

/// Parse `"port=1,mode=OPM"` fitted-port lines.
fn parse_fitted_block(block: &ResponseBlock) -> Result<Vec<FittedPort>> {
    let mut ports = Vec::with_capacity(block.len());
    for (line, payload) in payload_lines(block) {
        let bad = || Tl1Error::InvalidResponse(line.clone());
        let (port, mode) = payload.split_once(',').ok_or_else(bad)?;
        let port = port
            .split_once('=')
            .ok_or_else(bad)?
            .1
            .trim()
            .parse::<u32>()
            .map_err(|_| bad())?;
        let mode = mode.split_once('=').ok_or_else(bad)?.1.trim().to_string();
        ports.push(FittedPort { port, mode });
    }
    Ok(ports)
}

/// Parse `"port:wave,offset,atime"` configuration lines.
fn parse_config_block(block: &ResponseBlock) -> Result<Vec<MonitorConfig>> {
    let mut configs = Vec::with_capacity(block.len());
    for (line, payload) in payload_lines(block) {
        let bad = || Tl1Error::InvalidResponse(line.clone());
        let (port, data) = payload.split_once(':').ok_or_else(bad)?;
        let mut fields = data.split(',');
        let wavelength = fields.next().ok_or_else(bad)?;
        let offset = fields.next().ok_or_else(bad)?;
        let averaging_time = fields.next().ok_or_else(bad)?;
        configs.push(MonitorConfig {
            port: port.trim().parse().map_err(|_| bad())?,
            wavelength: wavelength.trim().parse().map_err(|_| bad())?,
            offset: offset.trim().parse().map_err(|_| bad())?,
            averaging_time: averaging_time.trim().parse().map_err(|_| bad())?,
        });
    }
    Ok(configs)
}

/// Parse `"port:dbm"` power lines.
fn parse_power_block(block: &ResponseBlock) -> Result<Vec<PowerReading>> {
    let mut readings = Vec::with_capacity(block.len());
    for (line, payload) in payload_lines(block) {
        let bad = || Tl1Error::InvalidResponse(line.clone());
        let (port, power) = payload.split_once(':').ok_or_else(bad)?;
        readings.push(PowerReading {
            port: port.trim().parse().map_err(|_| bad())?,
            dbm: power.trim().parse().map_err(|_| bad())?,
        });
    }
    Ok(readings)
}

/// Parse `"port:mode,edge,high,low"` threshold lines. The high value is
/// meaningless for DEGRADED alarms and dropped.
fn parse_threshold_block(
    block: &ResponseBlock,
    alarm_type: AlarmType,
) -> Result<Vec<AlarmThreshold>> {
    let mut thresholds = Vec::with_capacity(block.len());
    for (line, payload) in payload_lines(block) {
        let bad = || Tl1Error::InvalidResponse(line.clone());
        let (port, data) = payload.split_once(':').ok_or_else(bad)?;
        let mut fields = data.split(',');
        let mode = fields.next().ok_or_else(bad)?.trim().to_string();
        let edge = fields.next().ok_or_else(bad)?.trim().to_string();
        let high = fields.next().ok_or_else(bad)?;
        let low = fields.next().ok_or_else(bad)?;
        thresholds.push(AlarmThreshold {
            port: port.trim().parse().map_err(|_| bad())?,
            mode,
            edge,
            high: if alarm_type == AlarmType::Degraded {
                None
            } else {
                Some(high.trim().parse().map_err(|_| bad())?)
            },
            low: low.trim().parse().map_err(|_| bad())?,
        });
    }
    Ok(thresholds)
}

/// Parse `"port:STATE"` alarm-state lines.
fn parse_state_block(block: &ResponseBlock) -> Result<Vec<AlarmState>> {
    let mut states = Vec::with_capacity(block.len());
    for (line, payload) in payload_lines(block) {
        let bad = || Tl1Error::InvalidResponse(line.clone());
        let (port, state) = payload.split_once(':').ok_or_else(bad)?;
        states.push(AlarmState {
            port: port.trim().parse().map_err(|_| bad())?,
            state: state.trim().to_string(),
        });
    }
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&str]) -> ResponseBlock {
        ResponseBlock {
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_fitted_ports() {
        let block = block(&["   \"port=1,mode=OPM\"", "   \"port=2,mode=OPM\""]);
        assert_eq!(
            parse_fitted_block(&block).unwrap(),
            vec![
                FittedPort {
                    port: 1,
                    mode: "OPM".to_string(),
                },
                FittedPort {
                    port: 2,
                    mode: "OPM".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_config() {
        let block = block(&["   \"1:1550.0,0.0,5\""]);
        assert_eq!(
            parse_config_block(&block).unwrap(),
            vec![MonitorConfig {
                port: 1,
                wavelength: 1550.0,
                offset: 0.0,
                averaging_time: 5,
            }]
        );
    }

    #[test]
    fn test_parse_power() {
        let block = block(&["   \"1:-12.5\"", "   \"2:3.25\""]);
        assert_eq!(
            parse_power_block(&block).unwrap(),
            vec![
                PowerReading { port: 1, dbm: -12.5 },
                PowerReading { port: 2, dbm: 3.25 },
            ]
        );
    }

    #[test]
    fn test_parse_thresholds_los() {
        let block = block(&["   \"2:CONT,low,5.0,-20.0\""]);
        assert_eq!(
            parse_threshold_block(&block, AlarmType::Los).unwrap(),
            vec![AlarmThreshold {
                port: 2,
                mode: "CONT".to_string(),
                edge: "low".to_string(),
                high: Some(5.0),
                low: -20.0,
            }]
        );
    }

    #[test]
    fn test_parse_thresholds_degraded_drops_high() {
        let block = block(&["   \"2:CONT,low,0.0,-25.0\""]);
        let thresholds = parse_threshold_block(&block, AlarmType::Degraded).unwrap();
        assert_eq!(thresholds[0].high, None);
        assert_eq!(thresholds[0].low, -25.0);
    }

    #[test]
    fn test_parse_alarm_state() {
        let block = block(&["   \"1:CONT,TRIGGERED\""]);
        assert_eq!(
            parse_state_block(&block).unwrap(),
            vec![AlarmState {
                port: 1,
                state: "CONT,TRIGGERED".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        let garbage = block(&["   \"no separators here\""]);
        assert!(parse_power_block(&garbage).is_err());
        assert!(parse_config_block(&garbage).is_err());
        assert!(parse_fitted_block(&garbage).is_err());
    }
}
