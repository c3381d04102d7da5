/*!

Rule synthesizer (spec §4.6): converts an accepted path into per-switch
match/action rules, plus endpoint-delivery rules, deduplicated into a
[`RuleSet`].

*/

use std::net::IpAddr;

use indexmap::IndexSet;
use itertools::Itertools;
use serde_json::{json, Value};

use crate::topology::{Location, Topology};

/// A single selector criterion. Variants distinguish IPv4 from IPv6 because the
/// wire encoding (ONOS criterion `type`) differs, even though both carry an
/// address and a prefix length.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Criterion
{
	EthType(u16),
	Ipv4Dst { addr: IpAddr, prefix: u8 },
	Ipv6Dst { addr: IpAddr, prefix: u8 },
	Ipv4Src { addr: IpAddr, prefix: u8 },
	Ipv6Src { addr: IpAddr, prefix: u8 },
}

impl Criterion
{
	fn dst(addr: IpAddr, prefix: u8) -> Self
	{
		if addr.is_ipv4() { Criterion::Ipv4Dst { addr, prefix } } else { Criterion::Ipv6Dst { addr, prefix } }
	}

	fn src(addr: IpAddr, prefix: u8) -> Self
	{
		if addr.is_ipv4() { Criterion::Ipv4Src { addr, prefix } } else { Criterion::Ipv6Src { addr, prefix } }
	}

	fn to_value(&self) -> Value
	{
		match self
		{
			Criterion::EthType(t) => json!({ "type": "ETH_TYPE", "ethType": format!("0x{:04x}", t) }),
			Criterion::Ipv4Dst { addr, prefix } => json!({ "type": "IPV4_DST", "ip": format!("{addr}/{prefix}") }),
			Criterion::Ipv6Dst { addr, prefix } => json!({ "type": "IPV6_DST", "ip": format!("{addr}/{prefix}") }),
			Criterion::Ipv4Src { addr, prefix } => json!({ "type": "IPV4_SRC", "ip": format!("{addr}/{prefix}") }),
			Criterion::Ipv6Src { addr, prefix } => json!({ "type": "IPV6_SRC", "ip": format!("{addr}/{prefix}") }),
		}
	}
}

/// A single treatment instruction. Only `OUTPUT` is needed by this system
/// (spec §3); the full ONOS instruction catalog is out of scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instruction
{
	Output { port: u32 },
}

impl Instruction
{
	fn to_value(&self) -> Value
	{
		match self
		{
			Instruction::Output { port } => json!({ "type": "OUTPUT", "port": port.to_string() }),
		}
	}
}

/// One installed (or installable) forwarding directive at a single switch.
/// Equality/hash are over every field because `priority`/`timeout`/`is_permanent`
/// are fully determined by rule shape (transit vs. endpoint) for any given
/// `(device_id, selector, treatment)` — collapsing on the full struct is
/// equivalent to the `(device_id, selector, treatment)` key spec §4.6 describes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Flow
{
	pub device_id: String,
	pub priority: u32,
	pub timeout: u32,
	pub is_permanent: bool,
	pub selector: Vec<Criterion>,
	pub treatment: Vec<Instruction>,
}

impl Flow
{
	/// Build one rule by hand, independent of path planning — e.g. to probe
	/// connectivity for a single device/port/destination (mirrors
	/// `scht_lab/cli/flows.py::add_flow`).
	pub fn single_hop(device_id: impl Into<String>, out_port: u32, destination: IpAddr) -> Self
	{
		Flow
		{
			device_id: device_id.into(),
			priority: 40000,
			timeout: 0,
			is_permanent: true,
			selector: vec![Criterion::EthType(if destination.is_ipv4() { 0x0800 } else { 0x86DD }), Criterion::dst(destination, if destination.is_ipv4() { 32 } else { 128 })],
			treatment: vec![Instruction::Output { port: out_port }],
		}
	}

	pub fn to_value(&self) -> Value
	{
		json!({
			"deviceId": self.device_id,
			"priority": self.priority,
			"timeout": self.timeout,
			"isPermanent": self.is_permanent,
			"selector": { "criteria": self.selector.iter().map(Criterion::to_value).collect::<Vec<_>>() },
			"treatment": { "instructions": self.treatment.iter().map(Instruction::to_value).collect::<Vec<_>>() },
		})
	}
}

/// The accumulated, deduplicated rule set for a planning run. Insertion order
/// is preserved for reproducible output files even though spec §4.6 leaves
/// emission order within a stream unspecified.
#[derive(Clone, Debug, Default)]
pub struct RuleSet
{
	flows: IndexSet<Flow>,
}

impl RuleSet
{
	pub fn new() -> Self
	{
		Self::default()
	}

	pub fn insert(&mut self, flow: Flow)
	{
		self.flows.insert(flow);
	}

	pub fn extend(&mut self, flows: impl IntoIterator<Item = Flow>)
	{
		self.flows.extend(flows);
	}

	pub fn len(&self) -> usize
	{
		self.flows.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.flows.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Flow>
	{
		self.flows.iter()
	}

	pub fn to_value(&self) -> Value
	{
		json!({ "flows": self.flows.iter().map(Flow::to_value).collect::<Vec<_>>() })
	}
}

/// Transit rules for every hop of `path` (ordered `src..=dst` Location
/// indices): one rule per switch along the way, matching on the path's overall
/// source and destination, outputting to the port facing the next hop.
pub fn transit_rules(path: &[usize], topology: &Topology) -> Vec<Flow>
{
	if path.len() < 2
	{
		return Vec::new();
	}
	let src = topology.location(path[0]);
	let dst = topology.location(*path.last().expect("checked len >= 2"));
	path.iter().tuple_windows().map(|(&current, &nexthop)|
	{
		let current_loc = topology.location(current);
		let port = topology.port_to(current, nexthop).expect("path edges come from the topology that produced them");
		Flow
		{
			device_id: current_loc.ofname.clone(),
			priority: 40000,
			timeout: 0,
			is_permanent: true,
			selector: vec![
				Criterion::EthType(dst.eth_type()),
				Criterion::dst(dst.addr(), dst.host_prefix_len()),
				Criterion::src(src.addr(), src.host_prefix_len()),
			],
			treatment: vec![Instruction::Output { port }],
		}
	}).collect()
}

/// The endpoint-delivery rule for a single switch: deliver any packet
/// addressed to the switch's own host out of port 1, regardless of path.
pub fn endpoint_rule(location: &Location) -> Flow
{
	Flow
	{
		device_id: location.ofname.clone(),
		priority: 65534,
		timeout: 0,
		is_permanent: true,
		selector: vec![Criterion::EthType(location.eth_type()), Criterion::dst(location.addr(), location.host_prefix_len())],
		treatment: vec![Instruction::Output { port: 1 }],
	}
}

/// Endpoint rules for every Location on `path`.
pub fn endpoint_rules(path: &[usize], topology: &Topology) -> Vec<Flow>
{
	path.iter().map(|&idx| endpoint_rule(topology.location(idx))).collect()
}
