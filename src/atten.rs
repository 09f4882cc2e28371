//! Variable optical attenuation (VOA)

use crate::commands::{self, AttenMode};
use crate::error::{Result, Tl1Error};
use crate::policy::ErrorPolicy;
use crate::portspec::PortSpec;
use crate::response::{strip_quoted, ResponseBlock};
use crate::session::Session;

/// Attenuation settings reported for one port. `level` and `reference` are
/// absent for modes where they are not relevant (e.g. MAX).
#[derive(Debug, Clone, PartialEq)]
pub struct AttenSetting {
    /// Port number
    pub port: u32,
    /// Mode string as reported by the switch
    pub mode: String,
    /// Attenuation level in dB
    pub level: Option<f64>,
    /// Reference port for relative attenuation
    pub reference: Option<u32>,
}

/// Attenuation operations on an authenticated session.
///
/// Construction probes the switch; switches without the VOA option report
/// mode `NONE` and fail with [`Tl1Error::CapabilityUnsupported`].
pub struct Attenuation<'a> {
    session: &'a mut Session,
    policy: ErrorPolicy,
    mode: String,
}

impl<'a> Attenuation<'a> {
    /// Probe attenuation support and build the facade.
    pub fn new(session: &'a mut Session) -> Result<Self> {
        let policy = ErrorPolicy::interactive();
        let block = session.exchange(&commands::rtrv_eqpt("atten"), policy)?;
        let mode = parse_eqpt_mode(&block)?;
        if mode == "NONE" {
            return Err(Tl1Error::CapabilityUnsupported(
                "attenuation not supported on this switch".to_string(),
            ));
        }
        Ok(Self {
            session,
            policy,
            mode,
        })
    }

    /// VOA mode the switch reported at construction.
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Configure attenuation on `ports`. `level` is required for ABS, CONV
    /// and REL; `refs` only applies to REL.
    pub fn set(
        &mut self,
        ports: &PortSpec,
        mode: AttenMode,
        level: Option<f64>,
        refs: Option<&PortSpec>,
    ) -> Result<()> {
        let cmd = commands::set_port_atten(ports, mode, level, refs);
        self.session.exchange(&cmd, self.policy)?;
        Ok(())
    }

    /// Query the attenuation settings on `ports`.
    pub fn settings(&mut self, ports: &PortSpec) -> Result<Vec<AttenSetting>> {
        let cmd = commands::rtrv_port_atten(ports);
        let block = self.session.exchange(&cmd, self.policy)?;
        parse_settings_block(&block)
    }
}

/// Extract the value of the single `key=value` payload of a
/// `rtrv-eqpt ... parameter=config` reply.
fn parse_eqpt_mode(block: &ResponseBlock) -> Result<String> {
    let line = block
        .iter()
        .find(|l| !strip_quoted(l).is_empty())
        .ok_or_else(|| Tl1Error::InvalidResponse("empty equipment reply".to_string()))?;
    strip_quoted(line)
        .split_once('=')
        .map(|(_, value)| value.trim().to_string())
        .ok_or_else(|| Tl1Error::InvalidResponse(line.clone()))
}

/// Parse `"port:mode,level,ref"` payload lines; empty level/ref fields map
/// to `None`.
fn parse_settings_block(block: &ResponseBlock) -> Result<Vec<AttenSetting>> {
    let mut settings = Vec::with_capacity(block.len());
    for line in block.iter() {
        let payload = strip_quoted(line);
        if payload.is_empty() {
            continue;
        }
        let bad = || Tl1Error::InvalidResponse(line.clone());

        let (port, data) = payload.split_once(':').ok_or_else(bad)?;
        let port = port.trim().parse::<u32>().map_err(|_| bad())?;

        let mut fields = data.split(',');
        let mode = fields.next().ok_or_else(bad)?.trim().to_string();
        let level = match fields.next().map(str::trim) {
            Some("") | None => None,
            Some(v) => Some(v.parse::<f64>().map_err(|_| bad())?),
        };
        let reference = match fields.next().map(str::trim) {
            Some("") | None => None,
            Some(v) => Some(v.parse::<u32>().map_err(|_| bad())?),
        };

        settings.push(AttenSetting {
            port,
            mode,
            level,
            reference,
        });
    }
    Ok(settings)
}
