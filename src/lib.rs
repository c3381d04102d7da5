/*!
sendero-lib
=====

A QoS-aware path planner and flow installer for an ONOS-managed SDN.

Given a topology of switches/hosts with per-link QoS metrics derived from
distance and city population, and a set of requested traffic streams, this
crate searches for paths that satisfy each stream's hard requirements
(delay/jitter/bandwidth/loss), escalating priority weights on repeated
admission failure, and synthesizes the ONOS flow rules needed to install the
accepted paths.

# Usage

```toml
[dependencies]
sendero-lib = "0.1"
```

# Public interface

- [`topology`] builds a [`topology::Topology`] from a topology file (city
  population + neighbor distances) and optional geocoded coordinates.
- [`stream`] describes the traffic a caller wants routed: [`stream::Stream`],
  [`stream::Requirements`], [`stream::Priorities`].
- [`cost`] computes the per-link scalar cost a search minimizes, and enforces
  hard admission via `f64::INFINITY`.
- [`search`] runs A* (single-pair) or all-pairs Dijkstra over that cost.
- [`planner`] drives the per-stream search/requirement-check/escalation loop
  and produces a deduplicated rule set plus non-fatal diagnostics.
- [`rules`] converts an accepted path into ONOS flow rules.
- [`controller`] publishes a rule set to a live ONOS controller.
- [`geocode`] resolves city names to coordinates through a chain of public
  geocoding services, with a persisted cache.
- [`config`] loads topology/stream files and resolves the persisted
  application directory.
- [`error`] is the crate-wide fallible-operation error type.

*/

pub mod config;
pub mod controller;
pub mod cost;
pub mod error;
pub mod geocode;
pub mod planner;
pub mod rules;
pub mod search;
pub mod stream;
pub mod topology;

pub mod prelude
{
	pub use crate::controller::{ControllerClient, OnosClient};
	pub use crate::cost::cost;
	pub use crate::error::{Error, Result};
	pub use crate::planner::{plan, Diagnostic, PlannerConfig};
	pub use crate::rules::{Flow, RuleSet};
	pub use crate::search::{all_pairs_shortest_paths, astar};
	pub use crate::stream::{Priorities, Requirements, Stream, StreamFile, StreamType};
	pub use crate::topology::{Topology, TopologyFile};
}
