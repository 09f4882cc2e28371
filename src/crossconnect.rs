//! Optical cross-connection (OXC) management
//!
//! Patches pair an ingress port with an egress port. The facade covers
//! creating, deleting and retrieving patches, shutter (port-flap) cycling,
//! and the JSON export/import of the whole connection table.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::commands::{self, FlapInterval};
use crate::error::{Result, Tl1Error};
use crate::policy::ErrorPolicy;
use crate::portspec::PortSpec;
use crate::response::{strip_quoted, ResponseBlock};
use crate::session::Session;

/// Single key of the export document.
const EXPORT_KEY: &str = "portconns";

/// Cross-connection operations on an authenticated session.
pub struct CrossConnect<'a> {
    session: &'a mut Session,
    policy: ErrorPolicy,
}

impl<'a> CrossConnect<'a> {
    /// Interactive cross-connection facade.
    pub fn new(session: &'a mut Session) -> Self {
        Self {
            session,
            policy: ErrorPolicy::interactive(),
        }
    }

    /// Create patches pairing `ingress` and `egress` element-wise. `forced`
    /// creates them even where APS would otherwise object.
    pub fn create(&mut self, ingress: &PortSpec, egress: &PortSpec, forced: bool) -> Result<()> {
        let cmd = commands::ent_patch(ingress, egress, forced);
        self.session.exchange(&cmd, self.policy)?;
        Ok(())
    }

    /// Delete the patches on `ports`; `None` deletes every patch.
    pub fn delete(&mut self, ports: Option<&PortSpec>, forced: bool) -> Result<()> {
        let cmd = commands::dlt_patch(ports, forced);
        self.session.exchange(&cmd, self.policy)?;
        Ok(())
    }

    /// Retrieve the patches on `ports` (`None` for all) as
    /// (ingress, egress) pairs.
    pub fn connections(&mut self, ports: Option<&PortSpec>) -> Result<Vec<(u32, u32)>> {
        let cmd = commands::rtrv_patch(ports);
        let block = self.session.exchange(&cmd, self.policy)?;
        parse_patch_block(&block)
    }

    /// Start shutter cycling on `ports` with the given interval.
    pub fn set_shutter(
        &mut self,
        ports: &PortSpec,
        interval: &FlapInterval,
        forced: bool,
    ) -> Result<()> {
        let cmd = commands::ent_port_flap(ports, interval, forced);
        self.session.exchange(&cmd, self.policy)?;
        Ok(())
    }

    /// Query shutter cycling state; returns the unquoted payload lines.
    pub fn shutter(&mut self, ports: &PortSpec) -> Result<Vec<String>> {
        let cmd = commands::rtrv_port_flap(ports);
        let block = self.session.exchange(&cmd, self.policy)?;
        Ok(block
            .iter()
            .map(|line| strip_quoted(line).to_string())
            .filter(|payload| !payload.is_empty())
            .collect())
    }
}

fn parse_patch_block(block: &ResponseBlock) -> Result<Vec<(u32, u32)>> {
    let mut connections = Vec::with_capacity(block.len());
    for line in block.iter() {
        let payload = strip_quoted(line);
        if payload.is_empty() {
            continue;
        }
        let (ingress, egress) = payload
            .split_once(',')
            .ok_or_else(|| Tl1Error::InvalidResponse(line.clone()))?;
        let ingress = ingress
            .trim()
            .parse::<u32>()
            .map_err(|_| Tl1Error::InvalidResponse(line.clone()))?;
        let egress = egress
            .trim()
            .parse::<u32>()
            .map_err(|_| Tl1Error::InvalidResponse(line.clone()))?;
        connections.push((ingress, egress));
    }
    Ok(connections)
}

/// Render the export document: a single `portconns` key holding ordered
/// `[ingress, egress]` string pairs, sorted keys, 4-space indentation.
fn render_export(pairs: &[(String, String)]) -> Result<String> {
    let rows: Vec<[&String; 2]> = pairs.iter().map(|(i, e)| [i, e]).collect();
    let mut doc = BTreeMap::new();
    doc.insert(EXPORT_KEY, rows);

    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    doc.serialize(&mut serializer)?;
    Ok(String::from_utf8(out)?)
}

/// Parse an export document back into parallel ingress/egress port lists.
fn parse_import(text: &str) -> Result<(Vec<u32>, Vec<u32>)> {
    let doc: BTreeMap<String, Vec<[String; 2]>> = serde_json::from_str(text)
        .map_err(|e| Tl1Error::ImportFile(format!("not a valid export file: {}", e)))?;

    let mut ingress = Vec::new();
    let mut egress = Vec::new();
    for [i, e] in doc.values().flatten() {
        let parse = |s: &str| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| Tl1Error::ImportFile(format!("invalid port number {:?}", s)))
        };
        ingress.push(parse(i)?);
        egress.push(parse(e)?);
    }
    if ingress.is_empty() {
        return Err(Tl1Error::ImportFile(
            "file has no connections; export a switch with patches first".to_string(),
        ));
    }
    Ok((ingress, egress))
}

/// Export the current connection table to `path` as JSON.
pub fn export_connections(session: &mut Session, path: &Path) -> Result<()> {
    let policy = ErrorPolicy::import_export();
    debug!("exporting connection table to {}", path.display());

    let block = session.exchange(&commands::rtrv_patch(None), policy)?;
    let mut pairs = Vec::with_capacity(block.len());
    for line in block.iter() {
        let payload = strip_quoted(line);
        if payload.is_empty() {
            continue;
        }
        let (ingress, egress) = payload
            .split_once(',')
            .ok_or_else(|| Tl1Error::InvalidResponse(line.clone()))?;
        pairs.push((ingress.trim().to_string(), egress.trim().to_string()));
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(render_export(&pairs)?.as_bytes())?;
    writer.flush()?;

    debug!("export operation completed, {} connections", pairs.len());
    Ok(())
}

/// Import a previously exported connection table: clear the switch, then
/// recreate every pair in one exchange.
///
/// File problems are typed errors; nothing is sent to the switch unless the
/// file is valid.
pub fn import_connections(session: &mut Session, path: &Path) -> Result<()> {
    let policy = ErrorPolicy::import_export();
    debug!("importing connection table from {}", path.display());

    if !path.is_file() {
        return Err(Tl1Error::ImportFile(format!(
            "{} does not exist",
            path.display()
        )));
    }
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(Tl1Error::ImportFile(format!(
            "{} is not a .json file",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path)?;
    let (ingress, egress) = parse_import(&text)?;

    session.exchange(&commands::dlt_patch(None, false), policy)?;
    let cmd = commands::ent_patch(&PortSpec::from(ingress), &PortSpec::from(egress), false);
    session.exchange(&cmd, policy)?;

    debug!("import operation completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_patch_block() {
        let block = ResponseBlock {
            lines: vec!["   \"1,49\"".to_string(), "   \"2,50\"".to_string()],
        };
        assert_eq!(parse_patch_block(&block).unwrap(), vec![(1, 49), (2, 50)]);
    }

    #[test]
    fn test_parse_patch_block_rejects_garbage() {
        let block = ResponseBlock {
            lines: vec!["   \"1;49\"".to_string()],
        };
        assert!(matches!(
            parse_patch_block(&block),
            Err(Tl1Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_export_document_shape() {
        let pairs = vec![
            ("1".to_string(), "49".to_string()),
            ("2".to_string(), "50".to_string()),
        ];
        let text = render_export(&pairs).unwrap();

        // 4-space indentation
        assert!(text.contains("\n    \"portconns\""));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"portconns": [["1", "49"], ["2", "50"]]})
        );
    }

    #[test]
    fn test_export_import_round_trip() {
        let pairs = vec![
            ("1".to_string(), "49".to_string()),
            ("2".to_string(), "50".to_string()),
        ];
        let text = render_export(&pairs).unwrap();
        let (ingress, egress) = parse_import(&text).unwrap();
        assert_eq!(ingress, vec![1, 2]);
        assert_eq!(egress, vec![49, 50]);
    }

    #[test]
    fn test_import_rejects_empty_document() {
        let err = parse_import(r#"{"portconns": []}"#).unwrap_err();
        assert!(matches!(err, Tl1Error::ImportFile(_)));
    }

    #[test]
    fn test_import_rejects_invalid_json() {
        assert!(matches!(
            parse_import("not json at all"),
            Err(Tl1Error::ImportFile(_))
        ));
        assert!(matches!(
            parse_import(r#"{"portconns": [["one", "49"]]}"#),
            Err(Tl1Error::ImportFile(_))
        ));
    }

    #[test]
    fn test_import_preserves_pair_order() {
        let text = r#"{"portconns": [["3", "51"], ["1", "49"], ["2", "50"]]}"#;
        let (ingress, egress) = parse_import(text).unwrap();
        assert_eq!(ingress, vec![3, 1, 2]);
        assert_eq!(egress, vec![51, 49, 50]);
    }
}
