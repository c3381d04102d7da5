/*!

A Topology defines the way switches (and their attached hosts) are connected.

See [`load`] for the JSON schema (§6, `{"CityA": {"population":..,"neighbors":{..}}}`)
and §3/§4.1 for the exact construction rules: insertion order assigns `index`,
duplicate unordered endpoint pairs collapse to a single Link, and `link_count` is
incremented on both endpoints before a Link's ports are recorded.

*/

pub mod metrics;

use std::collections::HashMap;
use std::net::IpAddr;

use indexmap::IndexMap;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, OnceCell};

use self::metrics::LinkMetrics;

/// One city entry as it appears in the topology file, in insertion order.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CityRecord
{
	pub population: u64,
	/// Carried for round-tripping only — no cost formula references it (spec §9).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub connectivity: Option<i64>,
	/// Insertion order matters: port numbers are assigned in neighbor-iteration
	/// order (`load`, below), so an order-discarding map would make port
	/// assignment for any city with 2+ neighbors nondeterministic across loads.
	pub neighbors: IndexMap<String, u32>,
}

/// The whole topology file: insertion order is significant (§4.1, §9).
pub type TopologyFile = IndexMap<String, CityRecord>;

/// A switch plus its attached host.
#[derive(Clone, Debug)]
pub struct Location
{
	pub name: String,
	pub index: usize,
	pub ip: IpNet,
	pub population: u64,
	pub connectivity: Option<i64>,
	pub lat: Option<f64>,
	pub lon: Option<f64>,
	/// 1 initially (the host's own port); incremented for every incident link.
	pub link_count: u32,
	pub ofname: String,
}

impl Location
{
	fn new(name: String, index: usize, population: u64, connectivity: Option<i64>) -> Self
	{
		let ofname = format!("of:{:016x}", index + 1);
		let ip = default_ip(index);
		Location { name, index, ip, population, connectivity, lat: None, lon: None, link_count: 1, ofname }
	}

	pub fn eth_type(&self) -> u16
	{
		match self.ip
		{
			IpNet::V4(_) => 0x0800,
			IpNet::V6(_) => 0x86DD,
		}
	}

	pub fn host_prefix_len(&self) -> u8
	{
		match self.ip
		{
			IpNet::V4(_) => 32,
			IpNet::V6(_) => 128,
		}
	}

	pub fn addr(&self) -> IpAddr
	{
		self.ip.addr()
	}
}

fn default_ip(index: usize) -> IpNet
{
	// 10.0.0.{index+1}/8
	let last = (index + 1) as u8;
	format!("10.0.0.{last}/8").parse().expect("default IP literal is always valid")
}

/// An undirected link between two Locations, identified by their stable indices.
/// `a` is always the endpoint inserted first into the Topology (the "storage
/// order" of spec §3), `b` the second; this is purely about which half of
/// `ports` belongs to which endpoint, not a direction of travel.
#[derive(Debug)]
pub struct Link
{
	pub a: usize,
	pub b: usize,
	pub distance: u32,
	/// `(port on a facing b, port on b facing a)`.
	pub ports: (u32, u32),
	utilization: Cell<f64>,
	metrics: OnceCell<LinkMetrics>,
}

impl Link
{
	pub fn utilization(&self) -> f64
	{
		self.utilization.get()
	}

	/// The port on `from` that faces `to`, if this link connects them.
	pub fn port_from(&self, from: usize) -> Option<u32>
	{
		if from == self.a
		{
			Some(self.ports.0)
		}
		else if from == self.b
		{
			Some(self.ports.1)
		}
		else
		{
			None
		}
	}

	pub fn other_end(&self, from: usize) -> Option<usize>
	{
		if from == self.a
		{
			Some(self.b)
		}
		else if from == self.b
		{
			Some(self.a)
		}
		else
		{
			None
		}
	}
}

/// Lazily-computed maxima across all links, captured once so that cost
/// normalization denominators stay constant across an entire planning run (§5).
#[derive(Clone, Copy, Debug, Default)]
pub struct Maxima
{
	pub max_delay: f64,
	pub max_jitter: f64,
	pub max_bandwidth: f64,
	pub max_loss: f64,
}

pub struct Topology
{
	locations: Vec<Location>,
	links: Vec<Link>,
	name_index: HashMap<String, usize>,
	link_index: HashMap<(usize, usize), usize>,
	/// Incident link indices per Location index, for neighbor iteration during search.
	adjacency: Vec<Vec<usize>>,
	maxima: OnceCell<Maxima>,
}

fn link_key(a: usize, b: usize) -> (usize, usize)
{
	if a <= b { (a, b) } else { (b, a) }
}

impl Topology
{
	pub fn locations(&self) -> &[Location]
	{
		&self.locations
	}

	pub fn links(&self) -> &[Link]
	{
		&self.links
	}

	pub fn location(&self, index: usize) -> &Location
	{
		&self.locations[index]
	}

	/// First tries a name match, then falls back to an IP match (§3).
	pub fn get_location(&self, name_or_ip: &str) -> Option<&Location>
	{
		if let Some(&idx) = self.name_index.get(name_or_ip)
		{
			return Some(&self.locations[idx]);
		}
		let addr: IpAddr = name_or_ip.parse().ok()?;
		self.locations.iter().find(|loc| loc.addr() == addr)
	}

	pub fn get_link(&self, l1: usize, l2: usize) -> Option<&Link>
	{
		self.link_index.get(&link_key(l1, l2)).map(|&idx| &self.links[idx])
	}

	/// Links incident to `index`, for neighbor iteration during search.
	pub fn incident_links(&self, index: usize) -> impl Iterator<Item = &Link>
	{
		self.adjacency[index].iter().map(move |&idx| &self.links[idx])
	}

	pub fn link_metrics(&self, link: &Link) -> LinkMetrics
	{
		*link.metrics.get_or_init(||
		{
			let pop_a = self.locations[link.a].population;
			let pop_b = self.locations[link.b].population;
			metrics::compute(link.distance, pop_a, pop_b)
		})
	}

	/// The port on `from` facing `to`, via whatever link joins them (§4.6, §8
	/// property 7 — port symmetry).
	pub fn port_to(&self, from: usize, to: usize) -> Option<u32>
	{
		self.get_link(from, to)?.port_from(from)
	}

	/// Saturating utilization update: `utilization <- min(bandwidth, utilization + amount)` (§4.5).
	pub fn increase_utilization(&self, link: &Link, amount: f64)
	{
		let bandwidth = self.link_metrics(link).bandwidth;
		let new = (link.utilization.get() + amount).min(bandwidth);
		link.utilization.set(new);
	}

	/// Maxima across all links, memoized on first call. The link set never
	/// changes after [`load`] returns, so this cache is never invalidated in
	/// practice (§3, §5).
	pub fn maxima(&self) -> Maxima
	{
		*self.maxima.get_or_init(||
		{
			let mut m = Maxima::default();
			for link in &self.links
			{
				let lm = self.link_metrics(link);
				m.max_delay = m.max_delay.max(lm.delay);
				m.max_jitter = m.max_jitter.max(lm.jitter);
				m.max_bandwidth = m.max_bandwidth.max(lm.bandwidth);
				m.max_loss = m.max_loss.max(lm.loss);
			}
			m
		})
	}

	pub fn set_coordinates(&mut self, name: &str, lat: Option<f64>, lon: Option<f64>)
	{
		if let Some(&idx) = self.name_index.get(name)
		{
			self.locations[idx].lat = lat;
			self.locations[idx].lon = lon;
		}
	}
}

/// Build a Topology from a parsed topology file, per §4.1's build rules.
/// Geocoding is the caller's responsibility (see [`crate::geocode`]); pass
/// `coords` pre-resolved, keyed by city name, or an empty map to leave every
/// Location's `lat`/`lon` as `None`.
pub fn load(file: &TopologyFile, coords: &HashMap<String, (Option<f64>, Option<f64>)>) -> Topology
{
	let mut locations = Vec::with_capacity(file.len());
	let mut name_index = HashMap::with_capacity(file.len());
	for (index, (name, record)) in file.iter().enumerate()
	{
		let mut location = Location::new(name.clone(), index, record.population, record.connectivity);
		if let Some((lat, lon)) = coords.get(name)
		{
			location.lat = *lat;
			location.lon = *lon;
		}
		name_index.insert(name.clone(), index);
		locations.push(location);
	}

	let mut links: Vec<Link> = Vec::new();
	let mut link_index: HashMap<(usize, usize), usize> = HashMap::new();
	for (name, record) in file.iter()
	{
		let a_idx = name_index[name];
		for (neighbor, &distance) in record.neighbors.iter()
		{
			let Some(&b_idx) = name_index.get(neighbor) else { continue };
			if a_idx == b_idx
			{
				continue;
			}
			let key = link_key(a_idx, b_idx);
			if link_index.contains_key(&key)
			{
				continue;
			}
			locations[a_idx].link_count += 1;
			let port_a = locations[a_idx].link_count;
			locations[b_idx].link_count += 1;
			let port_b = locations[b_idx].link_count;
			let (a, b, ports) = if a_idx <= b_idx { (a_idx, b_idx, (port_a, port_b)) } else { (b_idx, a_idx, (port_b, port_a)) };
			let link = Link { a, b, distance, ports, utilization: Cell::new(0.0), metrics: OnceCell::new() };
			link_index.insert(key, links.len());
			links.push(link);
		}
	}

	let mut adjacency = vec![Vec::new(); locations.len()];
	for (idx, link) in links.iter().enumerate()
	{
		adjacency[link.a].push(idx);
		adjacency[link.b].push(idx);
	}

	Topology { locations, links, name_index, link_index, adjacency, maxima: OnceCell::new() }
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn sample() -> TopologyFile
	{
		let raw = r#"{
			"X": {"population": 1000000, "neighbors": {"Y": 200}},
			"Y": {"population": 1000000, "neighbors": {"X": 200}}
		}"#;
		serde_json::from_str(raw).unwrap()
	}

	#[test]
	fn assigns_indices_in_insertion_order()
	{
		let topo = load(&sample(), &HashMap::new());
		assert_eq!(topo.location(0).name, "X");
		assert_eq!(topo.location(1).name, "Y");
		assert_eq!(topo.location(0).ofname, "of:0000000000000001");
	}

	#[test]
	fn deduplicates_the_undirected_link()
	{
		let topo = load(&sample(), &HashMap::new());
		assert_eq!(topo.links().len(), 1);
	}

	#[test]
	fn port_one_is_reserved_for_the_host()
	{
		let topo = load(&sample(), &HashMap::new());
		let link = topo.get_link(0, 1).unwrap();
		assert_eq!(link.ports, (2, 2));
		assert_eq!(topo.port_to(0, 1), Some(2));
		assert_eq!(topo.port_to(1, 0), Some(2));
	}

	#[test]
	fn utilization_saturates_at_bandwidth()
	{
		let topo = load(&sample(), &HashMap::new());
		let link = topo.get_link(0, 1).unwrap();
		let bandwidth = topo.link_metrics(link).bandwidth;
		topo.increase_utilization(link, bandwidth + 1000.0);
		assert_eq!(link.utilization(), bandwidth);
	}

	#[test]
	fn default_ip_is_10_0_0_x_slash_8()
	{
		let topo = load(&sample(), &HashMap::new());
		assert_eq!(topo.location(0).ip.to_string(), "10.0.0.1/8");
		assert_eq!(topo.location(1).ip.to_string(), "10.0.0.2/8");
	}
}
