/*!

Argument parsing for the `sendero` binary (spec §6 — CLI surface, boundary
only, not core). `src/main.rs` holds the dispatch logic; this module only
defines the shape.

*/

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sendero", about = "QoS-aware path planner and flow installer for an ONOS-managed SDN")]
pub struct Cli
{
	#[command(flatten)]
	pub global: GlobalOpts,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Args)]
pub struct GlobalOpts
{
	/// ONOS REST base URL.
	#[arg(short = 'h', long, env = "SENDERO_HOST", default_value = "http://localhost:8181/")]
	pub host: String,

	/// ONOS REST username.
	#[arg(short = 'u', long, env = "SENDERO_USER", default_value = "onos")]
	pub user: String,

	/// ONOS REST password.
	#[arg(short = 'p', long, env = "SENDERO_PASSWORD", default_value = "rocks")]
	pub password: String,
}

#[derive(Subcommand)]
pub enum Command
{
	/// Manage the persisted default topology.
	Topo
	{
		#[command(subcommand)]
		action: TopoAction,
	},
	/// Manage staged traffic streams.
	Streams
	{
		#[command(subcommand)]
		action: StreamsAction,
	},
	/// Plan paths for staged streams and synthesize flow rules.
	Paths
	{
		#[command(subcommand)]
		action: PathsAction,
	},
	/// Interact with the live controller's flow table.
	Flows
	{
		#[command(subcommand)]
		action: FlowsAction,
	},
	/// Remove all persisted application state.
	Clean,
}

#[derive(Subcommand)]
pub enum TopoAction
{
	/// Parse `file` and store it as the default topology.
	Load
	{
		file: PathBuf,
	},
	/// Print the default (or `-t`-given) topology.
	Show
	{
		#[arg(short = 't', long)]
		topology: Option<PathBuf>,
		#[arg(short = 'o', long)]
		output: Option<PathBuf>,
		/// `summary` (default) or `json`.
		#[arg(short = 'm', long, default_value = "summary")]
		layout: String,
	},
}

#[derive(Subcommand)]
pub enum StreamsAction
{
	/// Parse `file` (JSON or JSONL) and stage it as the default stream set.
	Load
	{
		file: PathBuf,
	},
	/// Append one or more raw JSON stream fragments to the saved stream set.
	Save
	{
		fragments: Vec<String>,
	},
	/// Print the currently staged streams.
	List,
}

#[derive(Subcommand)]
pub enum PathsAction
{
	/// Plan every staged stream and synthesize its flow rules.
	Find
	{
		#[arg(short = 'f', long)]
		file: Option<PathBuf>,
		#[arg(short = 't', long)]
		topology: Option<PathBuf>,
		#[arg(short = 'o', long)]
		output: Option<PathBuf>,
		#[arg(short = 'm', long)]
		max_attempts: Option<u32>,
		/// Also push the resulting rules to the controller.
		#[arg(short = 'a', long)]
		apply: bool,
	},
}

#[derive(Subcommand)]
pub enum FlowsAction
{
	/// Fetch and print every flow currently installed on the controller.
	List,
	/// Install a single ad hoc forwarding rule, independent of path planning.
	Add
	{
		device: String,
		in_port: u32,
		out_port: u32,
		ip: String,
	},
	/// Push a `{"flows": [...]}` document straight to the controller.
	Load
	{
		file: PathBuf,
	},
}
