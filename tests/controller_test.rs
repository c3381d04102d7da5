//! Flow publisher integration (spec §4.7): activating prerequisite apps
//! before publishing a planned rule set, against the stub
//! [`common::MockController`] rather than a live ONOS instance.

mod common;

use common::{streams_from_json, topology_from_json, MockController};
use sendero_lib::controller::ControllerClient;
use sendero_lib::planner::{plan, PlannerConfig};

#[tokio::test]
async fn publishing_activates_apps_then_sends_the_planned_rules()
{
	let topo = topology_from_json(r#"{"X":{"population":1000000,"neighbors":{"Y":200}},"Y":{"population":1000000,"neighbors":{"X":200}}}"#);
	let streams = streams_from_json(r#"{"streams":[{"src":"X","dst":"Y","type":"TCP","rate":10}]}"#);
	let (rule_set, diagnostics) = plan(&topo, &streams, &PlannerConfig::default());
	assert!(diagnostics.is_empty());

	let client = MockController::default();
	client.activate_default_apps().await.unwrap();
	client.send_flows(&rule_set).await.unwrap();

	assert_eq!(*client.activations.lock().unwrap(), 1);
	let sent = client.sent_flows.lock().unwrap();
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].len(), rule_set.len());
}

#[tokio::test]
async fn single_hop_flow_is_published_independently_of_planning()
{
	use sendero_lib::rules::Flow;

	let client = MockController::default();
	let flow = Flow::single_hop("of:0000000000000001", 2, "10.0.0.2".parse().unwrap());
	client.send_flow(&flow).await.unwrap();

	let sent = client.sent_single.lock().unwrap();
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0], flow);
}
