/*!

Flow publisher (spec §4.7): pushes a synthesized [`RuleSet`] to an
ONOS-managed SDN controller and activates the applications needed for the
hosts and switches to actually see traffic (host discovery, proxy ARP, LLDP,
OpenFlow). Flow removal/lifecycle management is out of scope (spec §1) — this
is a write-mostly publisher, not a reconciler.

*/

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{Error, Result};
use crate::rules::{Flow, RuleSet};

/// Applications activated on a fresh controller before flows can take effect.
/// Order does not matter — activation is fanned out concurrently (§5).
const DEFAULT_APPS: &[&str] = &["org.onosproject.openflow", "org.onosproject.proxyarp", "org.onosproject.lldpprovider", "org.onosproject.hostprovider"];

/// ONOS application id flows are installed under.
const APP_ID: &str = "scht_lab";

/// The controller capability boundary. Exists so `planner`/CLI callers can be
/// tested against a stub without a live ONOS instance.
#[async_trait]
pub trait ControllerClient: Send + Sync
{
	async fn send_flows(&self, rules: &RuleSet) -> Result<()>;
	/// Push a single ad hoc flow, independent of any [`RuleSet`].
	async fn send_flow(&self, flow: &Flow) -> Result<()>;
	/// Push a raw `{"flows": [...]}` document verbatim — used by `flows load`,
	/// which reads flow JSON from disk rather than synthesizing it.
	async fn send_raw(&self, body: serde_json::Value) -> Result<()>;
	async fn activate_default_apps(&self) -> Result<()>;
	/// Fetch every flow currently installed on the controller, for the `flows
	/// list` read path (supplemented from `scht_lab/cli/flows.py::get_flows`).
	/// Returned as the controller's raw JSON body — `Flow` is a write-side
	/// synthesis type, not a general decoder for ONOS's flow representation.
	async fn list_flows(&self) -> Result<serde_json::Value>;
}

/// A real ONOS REST client.
pub struct OnosClient
{
	client: Client,
	base_url: Url,
	username: String,
	password: String,
}

impl OnosClient
{
	/// `host` is a base URL such as `http://localhost:8181/`; a missing
	/// trailing slash is corrected so that `Url::join` resolves `onos/v1/...`
	/// relative to the whole host rather than replacing its last segment.
	pub fn new(host: &str, username: impl Into<String>, password: impl Into<String>) -> Result<Self>
	{
		let host = if host.ends_with('/') { host.to_string() } else { format!("{host}/") };
		let base_url: Url = host.parse()?;
		let client = Client::builder().timeout(std::time::Duration::from_secs(30)).build()?;
		Ok(OnosClient { client, base_url, username: username.into(), password: password.into() })
	}
}

#[async_trait]
impl ControllerClient for OnosClient
{
	/// Single POST to `/onos/v1/flows?appId={APP_ID}` with every flow in the
	/// rule set (spec §6).
	async fn send_flows(&self, rules: &RuleSet) -> Result<()>
	{
		let url = self.base_url.join(&format!("onos/v1/flows?appId={APP_ID}"))?;
		let response = self.client.post(url).basic_auth(&self.username, Some(&self.password)).json(&rules.to_value()).send().await?;
		if !response.status().is_success()
		{
			return Err(Error::ControllerStatus { status: response.status() });
		}
		tracing::info!(flows = rules.len(), "published flows");
		Ok(())
	}

	async fn send_flow(&self, flow: &Flow) -> Result<()>
	{
		self.send_raw(serde_json::json!({ "flows": [flow.to_value()] })).await
	}

	async fn send_raw(&self, body: serde_json::Value) -> Result<()>
	{
		let url = self.base_url.join(&format!("onos/v1/flows?appId={APP_ID}"))?;
		let response = self.client.post(url).basic_auth(&self.username, Some(&self.password)).json(&body).send().await?;
		if !response.status().is_success()
		{
			return Err(Error::ControllerStatus { status: response.status() });
		}
		Ok(())
	}

	/// Concurrently POST `/applications/{app}/active` for every app in
	/// [`DEFAULT_APPS`], joining before returning (§5).
	async fn activate_default_apps(&self) -> Result<()>
	{
		let futures = DEFAULT_APPS.iter().map(|app| self.activate_app(app));
		let results = futures::future::join_all(futures).await;
		results.into_iter().collect::<Result<Vec<()>>>()?;
		Ok(())
	}

	async fn list_flows(&self) -> Result<serde_json::Value>
	{
		let url = self.base_url.join("onos/v1/flows")?;
		let response = self.client.get(url).basic_auth(&self.username, Some(&self.password)).send().await?;
		if !response.status().is_success()
		{
			return Err(Error::ControllerStatus { status: response.status() });
		}
		Ok(response.json().await?)
	}
}

impl OnosClient
{
	/// A 4xx here almost always means "already active" (ONOS has no idempotent
	/// activation endpoint) rather than a real failure, so it is logged and
	/// swallowed rather than propagated (spec §4.7).
	async fn activate_app(&self, app: &str) -> Result<()>
	{
		let url = self.base_url.join(&format!("onos/v1/applications/{app}/active"))?;
		let response = self.client.post(url).basic_auth(&self.username, Some(&self.password)).send().await?;
		let status = response.status();
		if status.is_client_error()
		{
			tracing::debug!(app, %status, "activation returned a 4xx, assuming already active");
			return Ok(());
		}
		if !status.is_success()
		{
			return Err(Error::ControllerStatus { status });
		}
		tracing::debug!(app, "activated controller application");
		Ok(())
	}
}
