/*!

Graph search (spec §4.4): a single-pair A* over the cost function of §4.3 with a
geographic-distance heuristic, and an all-pairs Dijkstra variant for offline
analysis under fixed priorities.

*/

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use ordered_float::OrderedFloat;

use crate::cost;
use crate::stream::{Priorities, Requirements, StreamType};
use crate::topology::{Link, Topology};

/// The per-stream cost callable captured for a single search: `(priorities,
/// requirements, stream_type, rate, topology)`, per the "function factory"
/// design note (spec §9). Kept as a small struct rather than a boxed closure —
/// there is exactly one shape of cost function in this system.
pub struct CostContext<'a>
{
	pub topology: &'a Topology,
	pub priorities: Option<&'a Priorities>,
	pub requirements: &'a Requirements,
	pub stream_type: StreamType,
	pub rate: u32,
}

impl<'a> CostContext<'a>
{
	pub fn edge_cost(&self, link: &Link) -> f64
	{
		cost::cost(link, self.priorities, self.requirements, self.stream_type, self.rate, self.topology)
	}
}

/// Earth radius in km, for the A* admissible heuristic.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two (lat, lon) pairs in degrees, in km.
pub fn great_circle_km(a: (f64, f64), b: (f64, f64)) -> f64
{
	let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
	let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
	let dlat = lat2 - lat1;
	let dlon = lon2 - lon1;
	let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
	2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Optimistic straight-line delay from `node` to `dst`, in ms. Zero (still
/// admissible) if either endpoint lacks coordinates.
fn heuristic(topology: &Topology, node: usize, dst: usize) -> f64
{
	let a = topology.location(node);
	let b = topology.location(dst);
	match (a.lat, a.lon, b.lat, b.lon)
	{
		(Some(lat1), Some(lon1), Some(lat2), Some(lon2)) => great_circle_km((lat1, lon1), (lat2, lon2)) / 200.0,
		_ => 0.0,
	}
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct Frontier
{
	priority: OrderedFloat<f64>,
	node: usize,
}

impl Ord for Frontier
{
	fn cmp(&self, other: &Self) -> Ordering
	{
		// BinaryHeap is a max-heap; we want the smallest priority first.
		other.priority.cmp(&self.priority)
	}
}

impl PartialOrd for Frontier
{
	fn partial_cmp(&self, other: &Self) -> Option<Ordering>
	{
		Some(self.cmp(other))
	}
}

/// A* shortest path from `src` to `dst` using `ctx`'s cost function and the
/// geographic heuristic. Returns the ordered list of Location indices from
/// `src` to `dst` inclusive, or an empty vec if `dst` is unreachable. A path
/// where `src == dst` is valid and returns `[src]`.
pub fn astar(topology: &Topology, src: usize, dst: usize, ctx: &CostContext) -> Vec<usize>
{
	if src == dst
	{
		return vec![src];
	}

	let mut open = BinaryHeap::new();
	let mut g_score: HashMap<usize, f64> = HashMap::new();
	let mut came_from: HashMap<usize, usize> = HashMap::new();

	g_score.insert(src, 0.0);
	open.push(Frontier { priority: OrderedFloat(heuristic(topology, src, dst)), node: src });

	let mut closed: HashMap<usize, bool> = HashMap::new();

	while let Some(Frontier { node, .. }) = open.pop()
	{
		if node == dst
		{
			return reconstruct_path(&came_from, src, dst);
		}
		if closed.get(&node).copied().unwrap_or(false)
		{
			continue;
		}
		closed.insert(node, true);

		let current_g = g_score[&node];
		for link in topology.incident_links(node)
		{
			let Some(neighbor) = link.other_end(node) else { continue };
			let edge_cost = ctx.edge_cost(link);
			if !edge_cost.is_finite()
			{
				continue;
			}
			let tentative_g = current_g + edge_cost;
			if tentative_g < *g_score.get(&neighbor).unwrap_or(&f64::INFINITY)
			{
				came_from.insert(neighbor, node);
				g_score.insert(neighbor, tentative_g);
				let f = tentative_g + heuristic(topology, neighbor, dst);
				open.push(Frontier { priority: OrderedFloat(f), node: neighbor });
			}
		}
	}

	Vec::new()
}

fn reconstruct_path(came_from: &HashMap<usize, usize>, src: usize, dst: usize) -> Vec<usize>
{
	let mut path = vec![dst];
	let mut current = dst;
	while current != src
	{
		match came_from.get(&current)
		{
			Some(&prev) => { path.push(prev); current = prev; }
			None => return Vec::new(),
		}
	}
	path.reverse();
	path
}

/// All-pairs shortest paths under fixed `priorities` and no stream-specific
/// requirements, for offline analysis (§4.4). Dijkstra from every node.
pub fn all_pairs_shortest_paths(topology: &Topology, priorities: Option<&Priorities>) -> HashMap<usize, HashMap<usize, Vec<usize>>>
{
	let requirements = Requirements::default();
	let mut result = HashMap::new();
	for src in 0..topology.locations().len()
	{
		let mut targets = HashMap::new();
		for dst in 0..topology.locations().len()
		{
			let ctx = CostContext { topology, priorities, requirements: &requirements, stream_type: StreamType::Tcp, rate: 0 };
			let path = dijkstra_single(topology, src, dst, &ctx);
			if !path.is_empty()
			{
				targets.insert(dst, path);
			}
		}
		result.insert(src, targets);
	}
	result
}

/// Plain Dijkstra (zero heuristic) from `src` to `dst`, shared by the all-pairs
/// variant. A* with an all-zero heuristic degenerates to this exact algorithm.
fn dijkstra_single(topology: &Topology, src: usize, dst: usize, ctx: &CostContext) -> Vec<usize>
{
	if src == dst
	{
		return vec![src];
	}
	let mut open = BinaryHeap::new();
	let mut g_score: HashMap<usize, f64> = HashMap::new();
	let mut came_from: HashMap<usize, usize> = HashMap::new();
	g_score.insert(src, 0.0);
	open.push(Frontier { priority: OrderedFloat(0.0), node: src });
	let mut closed: HashMap<usize, bool> = HashMap::new();

	while let Some(Frontier { node, .. }) = open.pop()
	{
		if node == dst
		{
			return reconstruct_path(&came_from, src, dst);
		}
		if closed.get(&node).copied().unwrap_or(false)
		{
			continue;
		}
		closed.insert(node, true);
		let current_g = g_score[&node];
		for link in topology.incident_links(node)
		{
			let Some(neighbor) = link.other_end(node) else { continue };
			let edge_cost = ctx.edge_cost(link);
			if !edge_cost.is_finite()
			{
				continue;
			}
			let tentative_g = current_g + edge_cost;
			if tentative_g < *g_score.get(&neighbor).unwrap_or(&f64::INFINITY)
			{
				came_from.insert(neighbor, node);
				g_score.insert(neighbor, tentative_g);
				open.push(Frontier { priority: OrderedFloat(tentative_g), node: neighbor });
			}
		}
	}
	Vec::new()
}
