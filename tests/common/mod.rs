//! Fixture builders shared by the integration suite: small topologies and
//! stream sets assembled straight from the JSON shapes spec.md §6 describes,
//! plus a stub [`ControllerClient`] so publication can be exercised without a
//! live ONOS instance.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sendero_lib::controller::ControllerClient;
use sendero_lib::error::Result;
use sendero_lib::rules::{Flow, RuleSet};
use sendero_lib::stream::{Stream, StreamFile};
use sendero_lib::topology::{Topology, TopologyFile};

/// Parse a topology file's JSON text and build it with no geocoded
/// coordinates (every [`sendero_lib::topology::Location`] gets `lat`/`lon` of
/// `None`), matching a run where the geocoder exhausted every provider.
pub fn topology_from_json(json: &str) -> Topology
{
	let file: TopologyFile = serde_json::from_str(json).expect("fixture topology JSON is well-formed");
	sendero_lib::topology::load(&file, &HashMap::new())
}

/// Parse a `{"streams": [...]}` envelope's JSON text.
pub fn streams_from_json(json: &str) -> Vec<Stream>
{
	let file: StreamFile = serde_json::from_str(json).expect("fixture stream JSON is well-formed");
	file.streams
}

/// An in-memory [`ControllerClient`] that records what it was asked to do
/// instead of reaching a live controller.
#[derive(Default)]
pub struct MockController
{
	pub sent_flows: Mutex<Vec<RuleSet>>,
	pub sent_single: Mutex<Vec<Flow>>,
	pub activations: Mutex<u32>,
}

#[async_trait]
impl ControllerClient for MockController
{
	async fn send_flows(&self, rules: &RuleSet) -> Result<()>
	{
		self.sent_flows.lock().unwrap().push(rules.clone());
		Ok(())
	}

	async fn send_flow(&self, flow: &Flow) -> Result<()>
	{
		self.sent_single.lock().unwrap().push(flow.clone());
		Ok(())
	}

	async fn send_raw(&self, _body: serde_json::Value) -> Result<()>
	{
		Ok(())
	}

	async fn activate_default_apps(&self) -> Result<()>
	{
		*self.activations.lock().unwrap() += 1;
		Ok(())
	}

	async fn list_flows(&self) -> Result<serde_json::Value>
	{
		Ok(serde_json::json!({ "flows": [] }))
	}
}
