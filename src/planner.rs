/*!

Path planner (spec §4.5): orchestrates per-stream search, requirement checks,
adaptive priority escalation, utilization updates and path acceptance.

*/

use tracing::{debug, info, warn};

use crate::rules::{self, RuleSet};
use crate::search::{self, CostContext};
use crate::stream::{Priorities, Requirements, Stream, StreamType};
use crate::topology::Topology;

/// Non-fatal, per-stream outcomes (spec §7). None of these abort the batch —
/// the run is best-effort and returns whatever rules were actually produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic
{
	UnknownEndpoint { stream_index: usize, src: String, dst: String },
	Unreachable { stream_index: usize },
	MissingLink { stream_index: usize },
	Unrouted { stream_index: usize, attempts: u32 },
}

#[derive(Clone, Copy, Debug)]
pub struct PlannerConfig
{
	/// Bounded attempt count; the loop runs at most `max_attempts + 1` times
	/// per stream (spec §8 property 5).
	pub max_attempts: u32,
}

impl Default for PlannerConfig
{
	fn default() -> Self
	{
		PlannerConfig { max_attempts: 10 }
	}
}

#[derive(Clone, Debug, Default)]
struct PathMetrics
{
	delay_total: f64,
	jitter_total: f64,
	bandwidth_path: f64,
	loss_total: f64,
}

fn aggregate(path: &[usize], topology: &Topology, stream: &Stream) -> Option<PathMetrics>
{
	let mut delay_total = 0.0;
	let mut jitter_total = 0.0;
	let mut bandwidth_path = f64::INFINITY;
	let mut success_probability = 1.0;

	for (&a, &b) in path.iter().zip(path.iter().skip(1))
	{
		let link = topology.get_link(a, b)?;
		let metrics = topology.link_metrics(link);
		delay_total += metrics.delay;
		jitter_total += metrics.jitter;
		bandwidth_path = bandwidth_path.min(metrics.bandwidth);
		success_probability *= 1.0 - metrics.loss;
	}

	if path.len() < 2
	{
		bandwidth_path = 0.0;
	}

	let mut loss_total = 1.0 - success_probability;
	if stream.kind == StreamType::Udp && bandwidth_path < stream.rate as f64
	{
		loss_total += (stream.rate as f64 - bandwidth_path) / stream.rate as f64;
	}

	Some(PathMetrics { delay_total, jitter_total, bandwidth_path, loss_total })
}

/// Which dimensions (of delay/jitter/loss) the aggregate path metrics violate
/// against `requirements`. Bandwidth is never reported here — it is already
/// ruled out by the `+INFINITY` admission guard in [`crate::cost`].
fn violations(metrics: &PathMetrics, requirements: &Requirements) -> (bool, bool, bool)
{
	let delay_violated = requirements.delay_max.is_some_and(|max| metrics.delay_total > max);
	let jitter_violated = requirements.jitter_max.is_some_and(|max| metrics.jitter_total > max);
	let loss_violated = requirements.loss_max.is_some_and(|max| metrics.loss_total > max);
	(delay_violated, jitter_violated, loss_violated)
}

/// Route every stream against `topology`, in order, mutating link utilization
/// as streams are accepted so later streams see the congestion earlier ones
/// created (spec §4.5's ordering note).
pub fn plan(topology: &Topology, streams: &[Stream], config: &PlannerConfig) -> (RuleSet, Vec<Diagnostic>)
{
	let mut rule_set = RuleSet::new();
	let mut diagnostics = Vec::new();

	for (stream_index, stream) in streams.iter().enumerate()
	{
		let Some(src) = topology.get_location(&stream.src) else
		{
			diagnostics.push(Diagnostic::UnknownEndpoint { stream_index, src: stream.src.clone(), dst: stream.dst.clone() });
			continue;
		};
		let Some(dst) = topology.get_location(&stream.dst) else
		{
			diagnostics.push(Diagnostic::UnknownEndpoint { stream_index, src: stream.src.clone(), dst: stream.dst.clone() });
			continue;
		};
		let (src_index, dst_index) = (src.index, dst.index);

		let mut priorities: Priorities = stream.priorities.unwrap_or_default();
		let requirements: Requirements = stream.requirements.unwrap_or_default();

		let mut accepted = false;
		for attempt in 1..=(config.max_attempts + 1)
		{
			let ctx = CostContext { topology, priorities: Some(&priorities), requirements: &requirements, stream_type: stream.kind, rate: stream.rate };
			let path = search::astar(topology, src_index, dst_index, &ctx);
			if path.is_empty()
			{
				diagnostics.push(Diagnostic::Unreachable { stream_index });
				break;
			}

			let Some(metrics) = aggregate(&path, topology, stream) else
			{
				diagnostics.push(Diagnostic::MissingLink { stream_index });
				break;
			};

			let (delay_violated, jitter_violated, loss_violated) = violations(&metrics, &requirements);
			if !delay_violated && !jitter_violated && !loss_violated
			{
				accept(topology, &path, stream, &mut rule_set);
				info!(stream_index, rate = stream.rate, hops = path.len(), "accepted stream");
				accepted = true;
				break;
			}

			if attempt == config.max_attempts + 1
			{
				diagnostics.push(Diagnostic::Unrouted { stream_index, attempts: config.max_attempts });
				break;
			}

			debug!(stream_index, attempt, delay_violated, jitter_violated, loss_violated, "requirement violated, escalating priorities");
			if delay_violated { priorities.escalate_delay(attempt); }
			if jitter_violated { priorities.escalate_jitter(attempt); }
			if loss_violated { priorities.escalate_loss(attempt); }
		}

		if !accepted
		{
			warn!(stream_index, "stream left unrouted");
		}
	}

	(rule_set, diagnostics)
}

fn accept(topology: &Topology, path: &[usize], stream: &Stream, rule_set: &mut RuleSet)
{
	let reversed: Vec<usize> = path.iter().rev().copied().collect();
	rule_set.extend(rules::transit_rules(path, topology));
	rule_set.extend(rules::transit_rules(&reversed, topology));
	rule_set.extend(rules::endpoint_rules(path, topology));

	for (&a, &b) in path.iter().zip(path.iter().skip(1))
	{
		if let Some(link) = topology.get_link(a, b)
		{
			topology.increase_utilization(link, stream.rate as f64);
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::stream::StreamType;
	use std::collections::HashMap;

	fn two_city_topology() -> Topology
	{
		let raw = r#"{
			"X": {"population": 1000000, "neighbors": {"Y": 200}},
			"Y": {"population": 1000000, "neighbors": {"X": 200}}
		}"#;
		let file = serde_json::from_str(raw).unwrap();
		crate::topology::load(&file, &HashMap::new())
	}

	#[test]
	fn scenario_a_trivial_two_node_path()
	{
		let topo = two_city_topology();
		let streams = vec![Stream { src: "X".into(), dst: "Y".into(), kind: StreamType::Tcp, rate: 10, size: None, requirements: None, priorities: None }];
		let (rules, diagnostics) = plan(&topo, &streams, &PlannerConfig::default());
		assert!(diagnostics.is_empty());
		assert_eq!(rules.len(), 4);
	}

	#[test]
	fn scenario_b_bandwidth_admission_rejects_the_second_stream()
	{
		let topo = two_city_topology();
		let requirements = Requirements { bandwidth_min: Some(100.0), ..Default::default() };
		let priorities = Priorities { bandwidth: Some(1.0), ..Default::default() };
		let streams = vec![
			Stream { src: "X".into(), dst: "Y".into(), kind: StreamType::Tcp, rate: 50, size: None, requirements: Some(requirements), priorities: Some(priorities) },
			Stream { src: "X".into(), dst: "Y".into(), kind: StreamType::Tcp, rate: 50, size: None, requirements: Some(requirements), priorities: Some(priorities) },
		];
		let (_rules, diagnostics) = plan(&topo, &streams, &PlannerConfig::default());
		assert_eq!(diagnostics, vec![Diagnostic::Unreachable { stream_index: 1 }]);
		let link = topo.get_link(0, 1).unwrap();
		assert_eq!(link.utilization(), 50.0);
	}

	#[test]
	fn scenario_c_delay_requirement_cannot_be_met_after_escalation()
	{
		let raw = r#"{
			"X": {"population": 1000000, "neighbors": {"M": 300}},
			"M": {"population": 1000000, "neighbors": {"X": 300, "Y": 300}},
			"Y": {"population": 1000000, "neighbors": {"M": 300}}
		}"#;
		let file = serde_json::from_str(raw).unwrap();
		let topo = crate::topology::load(&file, &HashMap::new());
		let requirements = Requirements { delay_max: Some(2.5), ..Default::default() };
		let priorities = Priorities { delay: Some(1.0), ..Default::default() };
		let streams = vec![Stream { src: "X".into(), dst: "Y".into(), kind: StreamType::Tcp, rate: 10, size: None, requirements: Some(requirements), priorities: Some(priorities) }];
		let config = PlannerConfig { max_attempts: 3 };
		let (rules, diagnostics) = plan(&topo, &streams, &config);
		assert!(rules.is_empty());
		assert_eq!(diagnostics, vec![Diagnostic::Unrouted { stream_index: 0, attempts: 3 }]);
	}

	#[test]
	fn unknown_endpoint_is_reported_and_does_not_panic()
	{
		let topo = two_city_topology();
		let streams = vec![Stream { src: "Nowhere".into(), dst: "Y".into(), kind: StreamType::Tcp, rate: 10, size: None, requirements: None, priorities: None }];
		let (rules, diagnostics) = plan(&topo, &streams, &PlannerConfig::default());
		assert!(rules.is_empty());
		assert_eq!(diagnostics.len(), 1);
	}
}
