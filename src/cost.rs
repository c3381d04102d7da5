/*!

The link cost function (spec §4.3). Maps `(link, priorities, requirements,
stream_type, rate, topology)` to a scalar cost, enforcing hard admission as a
side effect of returning `f64::INFINITY`.

*/

use crate::stream::{Priorities, Requirements, StreamType};
use crate::topology::{Link, Topology};

/// `cost(link, priorities, requirements, stream_type, rate, topology)`.
///
/// Returns `f64::INFINITY` when the link cannot carry the stream at all (a hard
/// requirement violation or an admission failure), never a `Result` — callers
/// treat `INFINITY` as "this edge does not exist" for the purposes of search.
pub fn cost(
	link: &Link,
	priorities: Option<&Priorities>,
	requirements: &Requirements,
	stream_type: StreamType,
	rate: u32,
	topology: &Topology,
) -> f64
{
	let Some(priorities) = priorities else
	{
		return link.distance as f64;
	};

	let metrics = topology.link_metrics(link);
	let maxima = topology.maxima();
	let mut total = 0.0;

	// Delay.
	if let Some(p) = nonzero(priorities.delay)
	{
		let d = metrics.delay;
		if let Some(delay_max) = requirements.delay_max
		{
			if d > delay_max
			{
				return f64::INFINITY;
			}
		}
		total += term(p, d, maxima.max_delay);
	}

	// Jitter. May legitimately be negative (§9) — accepted as-is.
	if let Some(p) = nonzero(priorities.jitter)
	{
		let j = metrics.jitter;
		total += term(p, j, maxima.max_jitter);
	}

	// Bandwidth: admission test against remaining capacity runs whenever a
	// floor is requested, independent of whether the bandwidth dimension
	// carries cost weight — this is the one dimension the planner never
	// re-checks at the path level (§4.5), so it must not be skippable by
	// leaving `priorities.bandwidth` unset. The exponent (not reciprocal)
	// contribution to the scalar cost still only applies when weighted.
	let bw = metrics.bandwidth;
	if bw - link.utilization() < requirements.bandwidth_min_or_zero()
	{
		return f64::INFINITY;
	}
	if let Some(p) = nonzero(priorities.bandwidth)
	{
		total += (maxima.max_bandwidth / bw).powf(p);
	}

	// Loss, with UDP inflation under remaining-bandwidth pressure.
	if let Some(p) = nonzero(priorities.loss)
	{
		let mut l = metrics.loss;
		if stream_type == StreamType::Udp
		{
			let remaining = metrics.bandwidth - link.utilization();
			if remaining < rate as f64
			{
				l += (rate as f64 - remaining) / rate as f64;
			}
		}
		if l > requirements.loss_max_or_zero()
		{
			return f64::INFINITY;
		}
		total += term(p, l, maxima.max_loss);
	}

	// Congestion.
	if let Some(p) = nonzero(priorities.congestion)
	{
		total += (link.utilization() * p) / metrics.bandwidth;
	}

	total
}

/// `None`/`Some(0.0)` both mean "no contribution"; only a genuinely positive
/// weight participates.
fn nonzero(weight: Option<f64>) -> Option<f64>
{
	weight.filter(|&w| w != 0.0)
}

/// `priority / (metric / max_metric)`, i.e. the reciprocal-normalized
/// contribution shared by delay, jitter and loss. A zero metric with a
/// non-zero priority is a perfect link, costless only in the limit — hence
/// `+INFINITY` rather than a divide-by-zero `NaN`.
fn term(priority: f64, metric: f64, max_metric: f64) -> f64
{
	if max_metric == 0.0
	{
		return 0.0;
	}
	let normalized = metric / max_metric;
	if normalized == 0.0
	{
		return f64::INFINITY;
	}
	priority / normalized
}
