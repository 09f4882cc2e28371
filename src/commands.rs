//! TL1 command builders
//!
//! Every outbound command shares one skeleton:
//!
//! ```text
//! <verb>::<aid>:<ctag>[:<field>...];\r\n
//! ```
//!
//! The doubled colon frames the omitted access-identifier-group field. The
//! fields after the ctag carry modifier flags (`frcd`, `ind`) and parameter
//! blocks of comma-joined `key=value` pairs, family by family. Builders are
//! pure string functions with no I/O.

use std::fmt;

use crate::portspec::PortSpec;

/// Correlation tag used on every command of a session.
///
/// The protocol associates responses with commands through this tag, but the
/// switch is driven strictly one-command-at-a-time, and the observed protocol
/// never increments it. Kept fixed on purpose.
pub const CTAG: u32 = 123;

/// Success status token on a completion line.
pub const COMPLD: &str = "COMPLD";

/// Shutter (port-flap) cycling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlapInterval {
    /// Time the shutter stays open, in milliseconds
    pub off_ms: u32,
    /// Time the shutter stays closed, in milliseconds
    pub on_ms: u32,
    /// Number of open/close cycles
    pub cycles: u32,
}

impl FlapInterval {
    fn wire(&self) -> String {
        format!("{}&{}&{}", self.off_ms, self.on_ms, self.cycles)
    }
}

/// Power-monitor alarm type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmType {
    /// Loss of service
    #[default]
    Los,
    /// Degraded signal
    Degraded,
}

impl fmt::Display for AlarmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmType::Los => f.write_str("LOS"),
            AlarmType::Degraded => f.write_str("DEGRADED"),
        }
    }
}

/// Variable optical attenuation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttenMode {
    /// Clear attenuation
    None,
    /// Freeze the attenuation currently in force
    Fix,
    /// Maximum attenuation
    Max,
    /// Absolute level
    Abs,
    /// Converged absolute level, then fixed
    Conv,
    /// Level relative to a reference port (VST 200 only)
    Rel,
}

impl fmt::Display for AttenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttenMode::None => "NONE",
            AttenMode::Fix => "FIX",
            AttenMode::Max => "MAX",
            AttenMode::Abs => "ABS",
            AttenMode::Conv => "CONV",
            AttenMode::Rel => "REL",
        };
        f.write_str(s)
    }
}

/// Alarm threshold parameters for `set-th-pmon`. All optional, but at least
/// one must be set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdSettings {
    /// Alarm type; the switch defaults to LOS when omitted
    pub alarm_type: Option<AlarmType>,
    /// Arming mode: `off`, `single` or `cont`
    pub mode: Option<String>,
    /// Trigger edge: `low` or `high` (not valid for DEGRADED)
    pub edge: Option<String>,
    /// High threshold level in dBm
    pub high: Option<f64>,
    /// Low threshold level in dBm
    pub low: Option<f64>,
}

impl ThresholdSettings {
    /// True when no parameter is set; such a command would be rejected.
    pub fn is_empty(&self) -> bool {
        self.alarm_type.is_none()
            && self.mode.is_none()
            && self.edge.is_none()
            && self.high.is_none()
            && self.low.is_none()
    }

    fn wire(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(t) = self.alarm_type {
            pairs.push(format!("type={}", t));
        }
        if let Some(m) = &self.mode {
            pairs.push(format!("mode={}", m));
        }
        if let Some(e) = &self.edge {
            pairs.push(format!("edge={}", e));
        }
        if let Some(low) = self.low {
            pairs.push(format!("low={}", threshold_level(low)));
        }
        if let Some(high) = self.high {
            pairs.push(format!("high={}", threshold_level(high)));
        }
        pairs.join(",")
    }
}

/// Render a float keeping a trailing `.0` on whole numbers, matching what
/// the switch emits on the wire.
fn decimal(value: f64) -> String {
    format!("{:?}", value)
}

/// Threshold levels parenthesize negatives on the wire.
fn threshold_level(value: f64) -> String {
    if value < 0.0 {
        format!("({})", decimal(value))
    } else {
        decimal(value)
    }
}

/// The `-rev` direction infix for power-monitor verbs and targets.
fn rev(reverse: bool) -> &'static str {
    if reverse { "rev" } else { "" }
}

fn aid_or_all(ports: Option<&PortSpec>) -> String {
    ports.map(PortSpec::wire).unwrap_or_else(|| "all".to_string())
}

/// Assemble the shared command skeleton.
fn encode(verb: &str, aid: &str, fields: &[&str]) -> String {
    let mut line = format!("{}::{}:{}", verb, aid, CTAG);
    for field in fields {
        line.push(':');
        line.push_str(field);
    }
    line.push_str(";\r\n");
    line
}

/// Build the `act-user` login command
pub fn act_user(username: &str, password: &str) -> String {
    encode("act-user", username, &["", password])
}

/// Build the `canc-user` logout command
pub fn canc_user(username: &str) -> String {
    encode("canc-user", username, &[""])
}

/// Build the equipment-state probe sent after login. Its reply is read
/// best-effort and never classified.
pub fn opr_arc_eqpt() -> String {
    encode("opr-arc-eqpt", "repmgr", &["", "ind"])
}

/// Build `ent-patch`: create cross-connections pairing ingress and egress
/// ports element-wise
pub fn ent_patch(ingress: &PortSpec, egress: &PortSpec, forced: bool) -> String {
    let aid = format!("{},{}", ingress.wire(), egress.wire());
    if forced {
        encode("ent-patch", &aid, &["", "frcd"])
    } else {
        encode("ent-patch", &aid, &[""])
    }
}

/// Build `dlt-patch`: delete cross-connections; `None` deletes all
pub fn dlt_patch(ports: Option<&PortSpec>, forced: bool) -> String {
    let aid = aid_or_all(ports);
    if forced {
        encode("dlt-patch", &aid, &["", "frcd"])
    } else {
        encode("dlt-patch", &aid, &[""])
    }
}

/// Build `rtrv-patch`: retrieve cross-connections; `None` retrieves all
pub fn rtrv_patch(ports: Option<&PortSpec>) -> String {
    let aid = ports.map(PortSpec::wire).unwrap_or_default();
    encode("rtrv-patch", &aid, &[""])
}

/// Build `ent-port-flap`: start shutter cycling on the given ports. The
/// trailing field always rides the wire, empty when not forced.
pub fn ent_port_flap(ports: &PortSpec, interval: &FlapInterval, forced: bool) -> String {
    let data = interval.wire();
    let flag = if forced { "frcd" } else { "" };
    encode("ent-port-flap", &ports.wire(), &["", &data, flag])
}

/// Build `rtrv-port-flap`: query shutter cycling state
pub fn rtrv_port_flap(ports: &PortSpec) -> String {
    encode("rtrv-port-flap", &ports.wire(), &["", ""])
}

/// Build `rtrv-eqpt` with the `parameter=config` query for a capability
/// target (`atten`, `pmon`, `revpmon`)
pub fn rtrv_eqpt(target: &str) -> String {
    encode("rtrv-eqpt", target, &["", "", "parameter=config"])
}

/// Build `set-port-atten`: configure attenuation on the given ports.
/// The level is always parenthesized with one decimal on the wire.
pub fn set_port_atten(
    ports: &PortSpec,
    mode: AttenMode,
    level: Option<f64>,
    refs: Option<&PortSpec>,
) -> String {
    let mut data = format!("mode={}", mode);
    if let Some(level) = level {
        data.push_str(&format!(",level=({:.1})", level));
    }
    if let Some(refs) = refs {
        data.push_str(&format!(",refs={}", refs.wire()));
    }
    encode("set-port-atten", &ports.wire(), &["", "", &data])
}

/// Build `rtrv-port-atten`: query attenuation settings
pub fn rtrv_port_atten(ports: &PortSpec) -> String {
    encode("rtrv-port-atten", &ports.wire(), &[""])
}

/// Build `set-port-pmon` / `set-port-revpmon`: configure power monitors
pub fn set_port_pmon(
    ports: &PortSpec,
    wavelength: f64,
    offset: f64,
    averaging_time: u8,
    reverse: bool,
) -> String {
    let verb = format!("set-port-{}pmon", rev(reverse));
    let data = format!(
        "wave={},offset={},atime={}",
        decimal(wavelength),
        decimal(offset),
        averaging_time
    );
    encode(&verb, &ports.wire(), &["", "", &data])
}

/// Build `rtrv-port-pmon` / `rtrv-port-revpmon`: query monitor configuration
pub fn rtrv_port_pmon(ports: Option<&PortSpec>, reverse: bool) -> String {
    let verb = format!("rtrv-port-{}pmon", rev(reverse));
    encode(&verb, &aid_or_all(ports), &[""])
}

/// Build `rtrv-port-power` / `rtrv-port-revpower`: query measured power
pub fn rtrv_port_power(ports: Option<&PortSpec>, reverse: bool) -> String {
    let verb = format!("rtrv-port-{}power", rev(reverse));
    encode(&verb, &aid_or_all(ports), &[""])
}

/// Build `set-th-pmon` / `set-th-revpmon`: set alarm thresholds
pub fn set_th_pmon(ports: &PortSpec, settings: &ThresholdSettings, reverse: bool) -> String {
    let verb = format!("set-th-{}pmon", rev(reverse));
    encode(&verb, &ports.wire(), &["", "", &settings.wire()])
}

/// Build `rtrv-th-pmon` / `rtrv-th-revpmon`: query alarm thresholds
pub fn rtrv_th_pmon(ports: Option<&PortSpec>, alarm_type: AlarmType, reverse: bool) -> String {
    let verb = format!("rtrv-th-{}pmon", rev(reverse));
    let data = format!("type={}", alarm_type);
    encode(&verb, &aid_or_all(ports), &["", "", &data])
}

/// Build `rtrv-state-pmon` / `rtrv-state-revpmon`: query alarm state
pub fn rtrv_state_pmon(ports: Option<&PortSpec>, alarm_type: AlarmType, reverse: bool) -> String {
    let verb = format!("rtrv-state-{}pmon", rev(reverse));
    let data = format!("type={}", alarm_type);
    encode(&verb, &aid_or_all(ports), &["", "", &data])
}

/// Build `set-state-pmon` / `set-state-revpmon`: clear (re-arm) alarm state
pub fn set_state_pmon(ports: Option<&PortSpec>, alarm_type: AlarmType, reverse: bool) -> String {
    let verb = format!("set-state-{}pmon", rev(reverse));
    let data = format!("type={}", alarm_type);
    encode(&verb, &aid_or_all(ports), &["", "", &data])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_act_user() {
        assert_eq!(act_user("admin", "secret"), "act-user::admin:123::secret;\r\n");
    }

    #[test]
    fn test_canc_user() {
        assert_eq!(canc_user("admin"), "canc-user::admin:123:;\r\n");
    }

    #[test]
    fn test_equipment_probe() {
        assert_eq!(opr_arc_eqpt(), "opr-arc-eqpt::repmgr:123::ind;\r\n");
    }

    #[test]
    fn test_ent_patch() {
        let ingress = PortSpec::List(vec![1, 2]);
        let egress = PortSpec::List(vec![49, 50]);
        assert_eq!(
            ent_patch(&ingress, &egress, false),
            "ent-patch::1&2,49&50:123:;\r\n"
        );
        assert_eq!(
            ent_patch(&ingress, &egress, true),
            "ent-patch::1&2,49&50:123::frcd;\r\n"
        );
    }

    #[test]
    fn test_dlt_patch() {
        assert_eq!(
            dlt_patch(Some(&PortSpec::Range(1, 4)), false),
            "dlt-patch::1&&4:123:;\r\n"
        );
        assert_eq!(dlt_patch(None, false), "dlt-patch::all:123:;\r\n");
        assert_eq!(dlt_patch(None, true), "dlt-patch::all:123::frcd;\r\n");
    }

    #[test]
    fn test_rtrv_patch() {
        assert_eq!(
            rtrv_patch(Some(&PortSpec::Single(1))),
            "rtrv-patch::1:123:;\r\n"
        );
        // Empty AID retrieves the whole patch table (export path)
        assert_eq!(rtrv_patch(None), "rtrv-patch:::123:;\r\n");
    }

    #[test]
    fn test_port_flap() {
        let interval = FlapInterval {
            off_ms: 10000,
            on_ms: 300,
            cycles: 1,
        };
        // The flag field is present either way; empty when not forced.
        assert_eq!(
            ent_port_flap(&PortSpec::Single(5), &interval, false),
            "ent-port-flap::5:123::10000&300&1:;\r\n"
        );
        assert_eq!(
            ent_port_flap(&PortSpec::Single(5), &interval, true),
            "ent-port-flap::5:123::10000&300&1:frcd;\r\n"
        );
        assert_eq!(
            rtrv_port_flap(&PortSpec::List(vec![5, 6])),
            "rtrv-port-flap::5&6:123::;\r\n"
        );
    }

    #[test]
    fn test_rtrv_eqpt() {
        assert_eq!(rtrv_eqpt("atten"), "rtrv-eqpt::atten:123:::parameter=config;\r\n");
        assert_eq!(
            rtrv_eqpt("revpmon"),
            "rtrv-eqpt::revpmon:123:::parameter=config;\r\n"
        );
    }

    #[test]
    fn test_set_port_atten() {
        assert_eq!(
            set_port_atten(&PortSpec::Single(3), AttenMode::Abs, Some(2.5), None),
            "set-port-atten::3:123:::mode=ABS,level=(2.5);\r\n"
        );
        assert_eq!(
            set_port_atten(&PortSpec::Single(3), AttenMode::Max, None, None),
            "set-port-atten::3:123:::mode=MAX;\r\n"
        );
        assert_eq!(
            set_port_atten(
                &PortSpec::List(vec![3, 4]),
                AttenMode::Rel,
                Some(1.0),
                Some(&PortSpec::List(vec![30, 31]))
            ),
            "set-port-atten::3&4:123:::mode=REL,level=(1.0),refs=30&31;\r\n"
        );
    }

    #[test]
    fn test_rtrv_port_atten() {
        assert_eq!(
            rtrv_port_atten(&PortSpec::Single(3)),
            "rtrv-port-atten::3:123:;\r\n"
        );
    }

    #[test]
    fn test_set_port_pmon() {
        assert_eq!(
            set_port_pmon(&PortSpec::Single(1), 1550.0, 0.0, 5, false),
            "set-port-pmon::1:123:::wave=1550.0,offset=0.0,atime=5;\r\n"
        );
        assert_eq!(
            set_port_pmon(&PortSpec::Single(1), 1310.5, -0.2, 3, true),
            "set-port-revpmon::1:123:::wave=1310.5,offset=-0.2,atime=3;\r\n"
        );
    }

    #[test]
    fn test_power_queries() {
        assert_eq!(
            rtrv_port_pmon(Some(&PortSpec::Single(1)), false),
            "rtrv-port-pmon::1:123:;\r\n"
        );
        assert_eq!(rtrv_port_power(None, true), "rtrv-port-revpower::all:123:;\r\n");
    }

    #[test]
    fn test_thresholds() {
        let settings = ThresholdSettings {
            alarm_type: Some(AlarmType::Los),
            mode: Some("cont".to_string()),
            low: Some(-20.0),
            high: Some(5.0),
            ..Default::default()
        };
        assert_eq!(
            set_th_pmon(&PortSpec::Single(2), &settings, false),
            "set-th-pmon::2:123:::type=LOS,mode=cont,low=(-20.0),high=5.0;\r\n"
        );
        // An edge parameter rides the wire when set
        let settings = ThresholdSettings {
            alarm_type: Some(AlarmType::Los),
            edge: Some("high".to_string()),
            low: Some(-20.0),
            ..Default::default()
        };
        assert_eq!(
            set_th_pmon(&PortSpec::Single(2), &settings, false),
            "set-th-pmon::2:123:::type=LOS,edge=high,low=(-20.0);\r\n"
        );
        assert_eq!(
            rtrv_th_pmon(None, AlarmType::Los, false),
            "rtrv-th-pmon::all:123:::type=LOS;\r\n"
        );
        assert_eq!(
            rtrv_th_pmon(Some(&PortSpec::Single(2)), AlarmType::Degraded, true),
            "rtrv-th-revpmon::2:123:::type=DEGRADED;\r\n"
        );
    }

    #[test]
    fn test_threshold_settings_empty() {
        assert!(ThresholdSettings::default().is_empty());
        let settings = ThresholdSettings {
            low: Some(-10.0),
            ..Default::default()
        };
        assert!(!settings.is_empty());
    }

    #[test]
    fn test_alarm_state() {
        assert_eq!(
            rtrv_state_pmon(None, AlarmType::Los, false),
            "rtrv-state-pmon::all:123:::type=LOS;\r\n"
        );
        assert_eq!(
            set_state_pmon(Some(&PortSpec::List(vec![1, 2])), AlarmType::Los, true),
            "set-state-revpmon::1&2:123:::type=LOS;\r\n"
        );
    }

    #[test]
    fn test_every_command_is_line_terminated() {
        let ports = PortSpec::Single(1);
        for cmd in [
            act_user("u", "p"),
            canc_user("u"),
            opr_arc_eqpt(),
            ent_patch(&ports, &PortSpec::Single(49), false),
            dlt_patch(None, false),
            rtrv_patch(None),
            rtrv_eqpt("pmon"),
            rtrv_port_atten(&ports),
            rtrv_port_power(None, false),
        ] {
            assert!(cmd.ends_with(";\r\n"), "{:?} must end with ;\\r\\n", cmd);
            assert!(cmd.contains(":123:"), "{:?} must carry the fixed ctag", cmd);
        }
    }
}
