/*!

Crate-wide error type.

Planning diagnostics (unreachable pair, admission failure, unresolved stream
endpoint) are *not* represented here — those are per-stream, non-fatal outcomes
collected into [`crate::planner::Diagnostic`] and returned alongside whatever rules
were produced. `Error` is reserved for failures that abort the operation that
raised them: a malformed input file, a controller that cannot be reached, state
that cannot be persisted to disk.

*/

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error
{
	#[error("failed to read {path}: {source}")]
	Io
	{
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("malformed topology file {path}: {source}")]
	TopologyParse
	{
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("malformed stream file {path}: {source}")]
	StreamParse
	{
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("stream file {path} is neither valid JSON nor JSONL")]
	StreamFormat
	{
		path: PathBuf,
	},

	#[error("no application directory available for persisted state")]
	NoAppDir,

	#[error("controller request failed: {0}")]
	Controller(#[from] reqwest::Error),

	#[error("malformed controller URL: {0}")]
	ControllerUrl(#[from] url::ParseError),

	#[error("controller returned a non-JSON, non-success response: HTTP {status}")]
	ControllerStatus
	{
		status: reqwest::StatusCode,
	},

	#[error("geocoder cache I/O error: {0}")]
	GeocoderCache(#[source] std::io::Error),

	#[error("'{0}' is not a valid IP address")]
	InvalidIp(String),
}
