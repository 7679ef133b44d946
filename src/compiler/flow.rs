//! Flow table strategy
//!
//! Flow fields correlate across a whole AND-group: an endpoint IP does not
//! get its own leaf but extends its virtual network's column range with a
//! second component, and ports ride on the protocol leaf. All terms of the
//! group are therefore collected into one `FlowTerms` context first,
//! validated as a unit, and only then turned into leaves.
//!
//! # Invariants (per AND-group)
//!
//! - sourceip/destip require sourcevn/destvn, whose operator must then be EQUAL
//! - sport/dport require protocol, whose operator must then be EQUAL

use std::net::{IpAddr, Ipv6Addr};

use crate::model::{KeyPart, MatchOp, Value};

use super::errors::{CompileError, CompileResult};
use super::slicer;
use super::spec::{cf, LeafScanSpec};
use super::table::field;

// Sorts after every assigned endpoint address, v4-mapped or v6.
const IP_HIGH: IpAddr = IpAddr::V6(Ipv6Addr::new(
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
));

/// String-valued flow term (vrouter, sourcevn, destvn).
#[derive(Debug, Clone)]
struct StrMatch {
    op: MatchOp,
    value: String,
}

/// Endpoint IP term; second address present only for IN_RANGE.
#[derive(Debug, Clone)]
struct IpMatch {
    op: MatchOp,
    addr: IpAddr,
    addr2: Option<IpAddr>,
}

/// Numeric flow term (protocol, ports); second value only for IN_RANGE.
#[derive(Debug, Clone)]
struct NumMatch<T> {
    op: MatchOp,
    value: T,
    value2: Option<T>,
}

/// All flow terms collected from one AND-group.
#[derive(Debug, Clone, Default)]
pub struct FlowTerms {
    vrouter: Option<StrMatch>,
    source_vn: Option<StrMatch>,
    dest_vn: Option<StrMatch>,
    source_ip: Option<IpMatch>,
    dest_ip: Option<IpMatch>,
    protocol: Option<NumMatch<u8>>,
    source_port: Option<NumMatch<u16>>,
    dest_port: Option<NumMatch<u16>>,
}

fn parse_str_match(name: &str, op: MatchOp, value: &str) -> CompileResult<StrMatch> {
    if !matches!(op, MatchOp::Equal | MatchOp::Prefix) {
        return Err(CompileError::bad_operator(name, op.name()));
    }
    Ok(StrMatch {
        op,
        value: value.to_string(),
    })
}

fn parse_ip_match(
    name: &str,
    op: MatchOp,
    value: &str,
    value2: Option<&str>,
) -> CompileResult<IpMatch> {
    let addr: IpAddr = value
        .parse()
        .map_err(|_| CompileError::bad_ip(name, value))?;
    let addr2 = match op {
        MatchOp::InRange => {
            let raw2 = value2.ok_or_else(|| {
                CompileError::invalid_term(format!("{}: IN_RANGE is missing value2", name))
            })?;
            Some(raw2.parse().map_err(|_| CompileError::bad_ip(name, raw2))?)
        }
        MatchOp::Equal => None,
        _ => return Err(CompileError::bad_operator(name, op.name())),
    };
    Ok(IpMatch { op, addr, addr2 })
}

fn parse_num_match<T>(
    name: &str,
    op: MatchOp,
    value: &str,
    value2: Option<&str>,
) -> CompileResult<NumMatch<T>>
where
    T: std::str::FromStr,
{
    let parse = |raw: &str| {
        raw.parse::<T>()
            .map_err(|_| CompileError::invalid_term(format!("{}: '{}' is not numeric", name, raw)))
    };
    let value = parse(value)?;
    let value2 = match op {
        MatchOp::InRange => {
            let raw2 = value2.ok_or_else(|| {
                CompileError::invalid_term(format!("{}: IN_RANGE is missing value2", name))
            })?;
            Some(parse(raw2)?)
        }
        MatchOp::Equal => None,
        _ => return Err(CompileError::bad_operator(name, op.name())),
    };
    Ok(NumMatch { op, value, value2 })
}

impl FlowTerms {
    /// Collects one term if it is a flow field; returns whether it was one.
    pub fn collect(
        &mut self,
        name: &str,
        op: MatchOp,
        value: &str,
        value2: Option<&str>,
    ) -> CompileResult<bool> {
        match name {
            field::FLOW_VROUTER => self.vrouter = Some(parse_str_match(name, op, value)?),
            field::FLOW_SOURCEVN => self.source_vn = Some(parse_str_match(name, op, value)?),
            field::FLOW_DESTVN => self.dest_vn = Some(parse_str_match(name, op, value)?),
            field::FLOW_SOURCEIP => self.source_ip = Some(parse_ip_match(name, op, value, value2)?),
            field::FLOW_DESTIP => self.dest_ip = Some(parse_ip_match(name, op, value, value2)?),
            field::FLOW_PROTOCOL => {
                // Protocol arrives as a 16-bit literal but keys as one byte
                let m = parse_num_match::<u16>(name, op, value, value2)?;
                self.protocol = Some(NumMatch {
                    op: m.op,
                    value: m.value as u8,
                    value2: m.value2.map(|v| v as u8),
                });
            }
            field::FLOW_SPORT => self.source_port = Some(parse_num_match(name, op, value, value2)?),
            field::FLOW_DPORT => self.dest_port = Some(parse_num_match(name, op, value, value2)?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Checks the cross-field correlation invariants for the group.
    pub fn validate(&self) -> CompileResult<()> {
        if self.source_ip.is_some() && self.source_vn.is_none() {
            return Err(CompileError::missing_correlate(
                "sourceip requires sourcevn in the same group",
            ));
        }
        if self.dest_ip.is_some() && self.dest_vn.is_none() {
            return Err(CompileError::missing_correlate(
                "destip requires destvn in the same group",
            ));
        }
        if (self.source_port.is_some() || self.dest_port.is_some()) && self.protocol.is_none() {
            return Err(CompileError::missing_correlate(
                "port terms require protocol in the same group",
            ));
        }
        if let (Some(_), Some(vn)) = (&self.source_ip, &self.source_vn) {
            if vn.op != MatchOp::Equal {
                return Err(CompileError::bad_operator(field::FLOW_SOURCEVN, vn.op.name()));
            }
        }
        if let (Some(_), Some(vn)) = (&self.dest_ip, &self.dest_vn) {
            if vn.op != MatchOp::Equal {
                return Err(CompileError::bad_operator(field::FLOW_DESTVN, vn.op.name()));
            }
        }
        if self.source_port.is_some() || self.dest_port.is_some() {
            if let Some(proto) = &self.protocol {
                if proto.op != MatchOp::Equal {
                    return Err(CompileError::bad_operator(
                        field::FLOW_PROTOCOL,
                        proto.op.name(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Builds the group's flow leaves. Call `validate` first.
    pub fn build_leaves(&self, direction: u8) -> CompileResult<Vec<LeafScanSpec>> {
        let mut leaves = Vec::new();

        if let Some(vr) = &self.vrouter {
            let (start, finish) = slicer::slice(vr.op, Value::Str(vr.value.clone()), None)?;
            let mut leaf = LeafScanSpec::new(cf::FLOW_TABLE_VROUTER);
            leaf.row_key_suffix.push(KeyPart::U8(direction));
            leaf.column_range.push(start.into(), finish.into());
            leaves.push(leaf);
        }

        if let Some(vn) = &self.source_vn {
            leaves.push(self.vn_leaf(cf::FLOW_TABLE_SVN_SIP, vn, self.source_ip.as_ref(), direction)?);
        }
        if let Some(vn) = &self.dest_vn {
            leaves.push(self.vn_leaf(cf::FLOW_TABLE_DVN_DIP, vn, self.dest_ip.as_ref(), direction)?);
        }

        if let Some(proto) = &self.protocol {
            if let Some(port) = &self.source_port {
                leaves.push(port_leaf(cf::FLOW_TABLE_PROT_SP, proto, port, direction));
            }
            if let Some(port) = &self.dest_port {
                leaves.push(port_leaf(cf::FLOW_TABLE_PROT_DP, proto, port, direction));
            }
            if self.source_port.is_none() && self.dest_port.is_none() {
                // Protocol alone: bound the port position at its max
                let mut leaf = LeafScanSpec::new(cf::FLOW_TABLE_PROT_DP);
                leaf.row_key_suffix.push(KeyPart::U8(direction));
                leaf.column_range.start.push(KeyPart::U8(proto.value));
                let hi = match proto.op {
                    MatchOp::Equal => proto.value,
                    MatchOp::InRange => proto.value2.unwrap_or(proto.value),
                    _ => unreachable!("protocol op checked at collect time"),
                };
                leaf.column_range.finish.push(KeyPart::U8(hi));
                leaf.column_range.finish.push(KeyPart::U16(0xffff));
                leaves.push(leaf);
            }
        }

        Ok(leaves)
    }

    fn vn_leaf(
        &self,
        cfname: &'static str,
        vn: &StrMatch,
        ip: Option<&IpMatch>,
        direction: u8,
    ) -> CompileResult<LeafScanSpec> {
        let (start, finish) = slicer::slice(vn.op, Value::Str(vn.value.clone()), None)?;
        let mut leaf = LeafScanSpec::new(cfname);
        leaf.row_key_suffix.push(KeyPart::U8(direction));
        leaf.column_range.push(start.into(), finish.into());

        match ip {
            Some(ip) => {
                leaf.column_range.start.push(KeyPart::Ip(ip.addr));
                let hi = match ip.op {
                    MatchOp::InRange => ip.addr2.unwrap_or(ip.addr),
                    _ => ip.addr,
                };
                leaf.column_range.finish.push(KeyPart::Ip(hi));
            }
            None => {
                // Open endpoint position: finish at the address ceiling
                leaf.column_range.finish.push(KeyPart::Ip(IP_HIGH));
            }
        }
        Ok(leaf)
    }

    /// Wildcard scan for an empty WHERE: the full protocol/port domain on
    /// the source-port family, keyed by direction.
    pub fn wildcard(direction: u8) -> LeafScanSpec {
        let mut leaf = LeafScanSpec::new(cf::FLOW_TABLE_PROT_SP);
        leaf.row_key_suffix.push(KeyPart::U8(direction));
        leaf.column_range.start.push(KeyPart::U8(0));
        leaf.column_range.finish.push(KeyPart::U8(0xff));
        leaf.column_range.finish.push(KeyPart::U16(0xffff));
        leaf
    }
}

fn port_leaf(
    cfname: &'static str,
    proto: &NumMatch<u8>,
    port: &NumMatch<u16>,
    direction: u8,
) -> LeafScanSpec {
    let mut leaf = LeafScanSpec::new(cfname);
    leaf.row_key_suffix.push(KeyPart::U8(direction));
    leaf.column_range.start.push(KeyPart::U8(proto.value));
    leaf.column_range.start.push(KeyPart::U16(port.value));
    match port.op {
        MatchOp::Equal => {
            leaf.column_range.finish = leaf.column_range.start.clone();
        }
        MatchOp::InRange => {
            // Validation pinned the protocol to EQUAL for ranged ports
            leaf.column_range.finish.push(KeyPart::U8(proto.value));
            leaf.column_range
                .finish
                .push(KeyPart::U16(port.value2.unwrap_or(port.value)));
        }
        _ => unreachable!("port op checked at collect time"),
    }
    leaf
}
