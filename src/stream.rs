/*!

The application-level traffic descriptors a caller asks the planner to route.

See spec §3 (`Stream`, `Requirements`, `Priorities`) and §6 (stream file format).

*/

use serde::{Deserialize, Serialize};

/// Transport carried by a stream. Only `UDP` changes cost/acceptance behaviour
/// (loss inflation under remaining-bandwidth pressure, §4.3/§4.5); `TCP` and
/// `QUIC` are otherwise interchangeable to the planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamType
{
	Tcp,
	Udp,
	Quic,
}

/// Hard upper (or lower, for bandwidth) bounds a path must satisfy. Every field
/// is optional: an absent field never rejects a link or path on that dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements
{
	#[serde(rename = "delay", default, skip_serializing_if = "Option::is_none")]
	pub delay_max: Option<f64>,
	#[serde(rename = "jitter", default, skip_serializing_if = "Option::is_none")]
	pub jitter_max: Option<f64>,
	#[serde(rename = "bandwidth", default, skip_serializing_if = "Option::is_none")]
	pub bandwidth_min: Option<f64>,
	#[serde(rename = "loss", default, skip_serializing_if = "Option::is_none")]
	pub loss_max: Option<f64>,
}

impl Requirements
{
	/// `requirements.loss_max`, treating an unset bound as zero — spec §4.3's
	/// loss term compares the adjusted loss against this floor.
	pub fn loss_max_or_zero(&self) -> f64
	{
		self.loss_max.unwrap_or(0.0)
	}

	/// `requirements.bandwidth_min`, treating an unset floor as zero.
	pub fn bandwidth_min_or_zero(&self) -> f64
	{
		self.bandwidth_min.unwrap_or(0.0)
	}
}

/// Per-dimension cost weights. Absent or zero both mean "contributes nothing";
/// the distinction only matters for the escalation policy (§4.5), which turns an
/// absent weight into `1` before doubling it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Priorities
{
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delay: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jitter: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bandwidth: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub loss: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub congestion: Option<f64>,
}

impl Priorities
{
	/// Escalate dimension `d` for attempt `attempt` (1-based): `d <- (d or 1) * 2^attempt`.
	pub fn escalate_delay(&mut self, attempt: u32)
	{
		self.delay = Some(self.delay.unwrap_or(1.0) * 2f64.powi(attempt as i32));
	}

	pub fn escalate_jitter(&mut self, attempt: u32)
	{
		self.jitter = Some(self.jitter.unwrap_or(1.0) * 2f64.powi(attempt as i32));
	}

	pub fn escalate_loss(&mut self, attempt: u32)
	{
		self.loss = Some(self.loss.unwrap_or(1.0) * 2f64.powi(attempt as i32));
	}
}

/// One requested application flow to route through the topology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stream
{
	pub src: String,
	pub dst: String,
	#[serde(rename = "type")]
	pub kind: StreamType,
	pub rate: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub size: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub requirements: Option<Requirements>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub priorities: Option<Priorities>,
}

/// The `{"streams": [...]}` envelope used by the stream file (§6).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StreamFile
{
	pub streams: Vec<Stream>,
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn deserializes_minimal_stream()
	{
		let raw = r#"{"src":"CityA","dst":"CityB","type":"UDP","rate":50}"#;
		let stream: Stream = serde_json::from_str(raw).unwrap();
		assert_eq!(stream.kind, StreamType::Udp);
		assert_eq!(stream.rate, 50);
		assert!(stream.requirements.is_none());
		assert!(stream.priorities.is_none());
	}

	/// spec §6's literal stream-file example: the wire keys are `delay`/`loss`,
	/// not `delay_max`/`loss_max` — those are only the internal field names.
	#[test]
	fn deserializes_full_envelope()
	{
		let raw = r#"{ "streams": [
			{ "src":"CityA","dst":"CityB","type":"UDP","rate":50,
			  "requirements":{"delay":30.0,"loss":0.02},
			  "priorities":{"delay":2.0,"bandwidth":1.0} } ] }"#;
		let file: StreamFile = serde_json::from_str(raw).unwrap();
		assert_eq!(file.streams.len(), 1);
		let req = file.streams[0].requirements.unwrap();
		assert_eq!(req.delay_max, Some(30.0));
		assert_eq!(req.loss_max_or_zero(), 0.02);
	}

	#[test]
	fn escalation_doubles_from_one_when_absent()
	{
		let mut p = Priorities::default();
		p.escalate_delay(1);
		assert_eq!(p.delay, Some(2.0));
		p.escalate_delay(2);
		assert_eq!(p.delay, Some(8.0));
	}
}
