use std::process::ExitCode;

use clap::Parser;
use sendero_lib::config;
use sendero_lib::controller::{ControllerClient, OnosClient};
use sendero_lib::geocode::Geocoder;
use sendero_lib::planner::{self, PlannerConfig};
use sendero_lib::rules::Flow;
use sendero_lib::stream::Stream;
use sendero_lib::topology::{self, Topology};

mod cli;

use cli::{Cli, Command, FlowsAction, GlobalOpts, PathsAction, StreamsAction, TopoAction};

#[tokio::main]
async fn main() -> ExitCode
{
	tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

	let cli = Cli::parse();
	match run(cli).await
	{
		Ok(()) => ExitCode::SUCCESS,
		Err(err) =>
		{
			eprintln!("error: {err}");
			ExitCode::FAILURE
		}
	}
}

async fn run(cli: Cli) -> sendero_lib::error::Result<()>
{
	match cli.command
	{
		Command::Topo { action } => run_topo(action).await,
		Command::Streams { action } => run_streams(action),
		Command::Paths { action } => run_paths(action, &cli.global).await,
		Command::Flows { action } => run_flows(action, &cli.global).await,
		Command::Clean => run_clean(),
	}
}

async fn run_topo(action: TopoAction) -> sendero_lib::error::Result<()>
{
	match action
	{
		TopoAction::Load { file } =>
		{
			let parsed = config::load_topology(&file)?;
			let destination = config::topology_path()?;
			if let Some(parent) = destination.parent()
			{
				std::fs::create_dir_all(parent).map_err(|source| sendero_lib::error::Error::Io { path: parent.to_path_buf(), source })?;
			}
			let bytes = serde_json::to_vec_pretty(&parsed).expect("TopologyFile always serializes");
			std::fs::write(&destination, bytes).map_err(|source| sendero_lib::error::Error::Io { path: destination, source })?;
			println!("loaded {} cities from {}", parsed.len(), file.display());
			Ok(())
		}
		TopoAction::Show { topology: topology_arg, output, layout } =>
		{
			let path = topology_arg.map(Ok).unwrap_or_else(config::topology_path)?;
			let file = config::load_topology(&path)?;
			let cities: Vec<String> = file.keys().cloned().collect();
			let geocoder = Geocoder::new(config::geocoder_cache_path()?);
			let coords = geocoder.resolve_all(&cities).await;
			let built = topology::load(&file, &coords);
			let rendered = render_topology(&built, &layout);
			match output
			{
				Some(path) => std::fs::write(&path, rendered).map_err(|source| sendero_lib::error::Error::Io { path, source })?,
				None => println!("{rendered}"),
			}
			Ok(())
		}
	}
}

fn render_topology(topology: &Topology, layout: &str) -> String
{
	if layout == "json"
	{
		let cities: Vec<_> = topology.locations().iter().map(|loc| serde_json::json!({ "name": loc.name, "ip": loc.ip.to_string(), "population": loc.population })).collect();
		serde_json::to_string_pretty(&serde_json::json!({ "locations": cities })).expect("json values always serialize")
	}
	else
	{
		let mut out = format!("{} locations, {} links\n", topology.locations().len(), topology.links().len());
		for location in topology.locations()
		{
			out.push_str(&format!("  {} ({}) port 1 -> host\n", location.name, location.ip));
		}
		out
	}
}

fn run_streams(action: StreamsAction) -> sendero_lib::error::Result<()>
{
	match action
	{
		StreamsAction::Load { file } =>
		{
			let streams = config::load_streams(&file)?;
			write_staged_streams(&streams)?;
			println!("staged {} streams from {}", streams.len(), file.display());
			Ok(())
		}
		StreamsAction::Save { fragments } =>
		{
			let mut streams: Vec<Stream> = Vec::with_capacity(fragments.len());
			for fragment in &fragments
			{
				let stream: Stream = serde_json::from_str(fragment).map_err(|source| sendero_lib::error::Error::StreamParse { path: "<argv>".into(), source })?;
				streams.push(stream);
			}
			let path = config::resources_streams_path()?;
			if let Some(parent) = path.parent()
			{
				std::fs::create_dir_all(parent).map_err(|source| sendero_lib::error::Error::Io { path: parent.to_path_buf(), source })?;
			}
			let mut existing: Vec<Stream> = std::fs::read(&path).ok().and_then(|bytes| serde_json::from_slice::<sendero_lib::stream::StreamFile>(&bytes).ok()).map(|f| f.streams).unwrap_or_default();
			existing.extend(streams);
			let body = sendero_lib::stream::StreamFile { streams: existing };
			let bytes = serde_json::to_vec_pretty(&body).expect("StreamFile always serializes");
			std::fs::write(&path, bytes).map_err(|source| sendero_lib::error::Error::Io { path, source })
		}
		StreamsAction::List =>
		{
			let streams = read_staged_streams()?;
			for (index, stream) in streams.iter().enumerate()
			{
				println!("{index}: {} -> {} ({:?}, {} Mbps)", stream.src, stream.dst, stream.kind, stream.rate);
			}
			Ok(())
		}
	}
}

fn write_staged_streams(streams: &[Stream]) -> sendero_lib::error::Result<()>
{
	let path = config::streams_path()?;
	if let Some(parent) = path.parent()
	{
		std::fs::create_dir_all(parent).map_err(|source| sendero_lib::error::Error::Io { path: parent.to_path_buf(), source })?;
	}
	let mut text = String::new();
	for stream in streams
	{
		text.push_str(&serde_json::to_string(stream).expect("Stream always serializes"));
		text.push('\n');
	}
	std::fs::write(&path, text).map_err(|source| sendero_lib::error::Error::Io { path, source })
}

fn read_staged_streams() -> sendero_lib::error::Result<Vec<Stream>>
{
	let path = config::streams_path()?;
	if !path.exists()
	{
		return Ok(Vec::new());
	}
	config::load_streams(&path)
}

async fn run_paths(action: PathsAction, global: &GlobalOpts) -> sendero_lib::error::Result<()>
{
	let PathsAction::Find { file, topology: topology_path, output, max_attempts, apply } = action;

	let topology_file = match topology_path
	{
		Some(path) => config::load_topology(&path)?,
		None => config::load_topology(config::topology_path()?)?,
	};
	let cities: Vec<String> = topology_file.keys().cloned().collect();
	let geocoder = Geocoder::new(config::geocoder_cache_path()?);
	let coords = geocoder.resolve_all(&cities).await;
	let built = topology::load(&topology_file, &coords);

	let streams = match file
	{
		Some(path) => config::load_streams(&path)?,
		None => read_staged_streams()?,
	};

	let planner_config = match max_attempts
	{
		Some(max_attempts) => PlannerConfig { max_attempts },
		None => PlannerConfig::default(),
	};
	let (rule_set, diagnostics) = planner::plan(&built, &streams, &planner_config);

	for diagnostic in &diagnostics
	{
		eprintln!("{diagnostic:?}");
	}
	println!("planned {} flows for {} streams ({} diagnostics)", rule_set.len(), streams.len(), diagnostics.len());

	if let Some(path) = output
	{
		let bytes = serde_json::to_vec_pretty(&rule_set.to_value()).expect("RuleSet always serializes");
		std::fs::write(&path, bytes).map_err(|source| sendero_lib::error::Error::Io { path, source })?;
	}

	if apply
	{
		let client = OnosClient::new(&global.host, &global.user, &global.password)?;
		if let Err(err) = client.activate_default_apps().await
		{
			eprintln!("controller error: {err}");
		}
		else if let Err(err) = client.send_flows(&rule_set).await
		{
			eprintln!("controller error: {err}");
		}
	}

	Ok(())
}

async fn run_flows(action: FlowsAction, global: &GlobalOpts) -> sendero_lib::error::Result<()>
{
	let client = OnosClient::new(&global.host, &global.user, &global.password)?;

	match action
	{
		FlowsAction::List => match client.list_flows().await
		{
			Ok(body) => println!("{}", serde_json::to_string_pretty(&body).expect("controller body is valid json")),
			Err(err) => eprintln!("controller error: {err}"),
		},
		FlowsAction::Add { device, in_port: _, out_port, ip } =>
		{
			let destination = ip.parse().map_err(|_| sendero_lib::error::Error::InvalidIp(ip.clone()))?;
			let flow = Flow::single_hop(device, out_port, destination);
			if let Err(err) = client.send_flow(&flow).await
			{
				eprintln!("controller error: {err}");
			}
		}
		FlowsAction::Load { file } =>
		{
			let bytes = std::fs::read(&file).map_err(|source| sendero_lib::error::Error::Io { path: file.clone(), source })?;
			let body: serde_json::Value = serde_json::from_slice(&bytes).map_err(|source| sendero_lib::error::Error::StreamParse { path: file, source })?;
			if let Err(err) = client.send_raw(body).await
			{
				eprintln!("controller error: {err}");
			}
		}
	}
	Ok(())
}

fn run_clean() -> sendero_lib::error::Result<()>
{
	let dir = config::app_dir()?;
	if dir.exists()
	{
		std::fs::remove_dir_all(&dir).map_err(|source| sendero_lib::error::Error::Io { path: dir, source })?;
	}
	println!("removed persisted state");
	Ok(())
}
