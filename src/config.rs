/*!

Input loading and persisted-state layout (spec §6 ambient concerns): turning
on-disk JSON/JSONL into the in-memory structures the rest of the crate works
with, and resolving where per-user state (topology, streams, geocoder cache)
lives on disk.

*/

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::stream::{Stream, StreamFile};
use crate::topology::TopologyFile;

/// Parse a topology file from `path` (see [`crate::topology::load`] for the
/// schema and the build rules applied to the result).
pub fn load_topology(path: impl AsRef<Path>) -> Result<TopologyFile>
{
	let path = path.as_ref();
	let bytes = std::fs::read(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
	serde_json::from_slice(&bytes).map_err(|source| Error::TopologyParse { path: path.to_path_buf(), source })
}

/// Parse a stream file from `path`. Accepts either the `{"streams": [...]}`
/// envelope, a bare JSON array of streams, or JSON Lines (one `Stream` object
/// per line) — the three shapes a caller might reasonably hand-author or have
/// emitted by an earlier run (§6).
pub fn load_streams(path: impl AsRef<Path>) -> Result<Vec<Stream>>
{
	let path = path.as_ref();
	let text = std::fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;

	if let Ok(file) = serde_json::from_str::<StreamFile>(&text)
	{
		return Ok(file.streams);
	}
	if let Ok(streams) = serde_json::from_str::<Vec<Stream>>(&text)
	{
		return Ok(streams);
	}

	jsonl_to_array(&text).map_err(|source| Error::StreamParse { path: path.to_path_buf(), source })?
		.into_iter()
		.map(|value| serde_json::from_value(value).map_err(|source| Error::StreamParse { path: path.to_path_buf(), source }))
		.collect::<Result<Vec<_>>>()
		.or(Err(Error::StreamFormat { path: path.to_path_buf() }))
}

/// Turn JSON Lines text (one JSON value per non-blank line) into the
/// equivalent JSON array, so downstream code has a single shape to deserialize
/// from. Mirrors `scht_lab/helpers/jsonl.py::jsonl_to_keyed`'s line-splitting
/// behaviour, minus the keying (streams have no natural key).
pub fn jsonl_to_array(text: &str) -> std::result::Result<Vec<serde_json::Value>, serde_json::Error>
{
	text.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(serde_json::from_str)
		.collect()
}

/// Per-user application directory for persisted state: `topo.json`,
/// `streams.jsonl`, `resources/streams.json`, and the geocoder cache.
/// Resolved via `dirs::config_dir()`, matching the teacher's use of `dirs`.
pub fn app_dir() -> Result<PathBuf>
{
	dirs::config_dir().map(|dir| dir.join("sendero")).ok_or(Error::NoAppDir)
}

pub fn topology_path() -> Result<PathBuf>
{
	Ok(app_dir()?.join("topo.json"))
}

pub fn streams_path() -> Result<PathBuf>
{
	Ok(app_dir()?.join("streams.jsonl"))
}

pub fn resources_streams_path() -> Result<PathBuf>
{
	Ok(app_dir()?.join("resources").join("streams.json"))
}

pub fn geocoder_cache_path() -> Result<PathBuf>
{
	Ok(app_dir()?.join("geocoder_cache.json"))
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn jsonl_to_array_skips_blank_lines()
	{
		let text = "{\"a\":1}\n\n{\"a\":2}\n";
		let values = jsonl_to_array(text).unwrap();
		assert_eq!(values.len(), 2);
	}

	#[test]
	fn jsonl_to_array_rejects_malformed_lines()
	{
		let text = "{\"a\":1}\nnot json\n";
		assert!(jsonl_to_array(text).is_err());
	}

	#[test]
	fn load_streams_accepts_the_envelope_shape()
	{
		let dir = std::env::temp_dir().join(format!("sendero-test-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("streams.json");
		std::fs::write(&path, r#"{"streams":[{"src":"A","dst":"B","type":"TCP","rate":10}]}"#).unwrap();
		let streams = load_streams(&path).unwrap();
		assert_eq!(streams.len(), 1);
		std::fs::remove_dir_all(&dir).ok();
	}

	#[test]
	fn load_streams_accepts_jsonl()
	{
		let dir = std::env::temp_dir().join(format!("sendero-test-jsonl-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("streams.jsonl");
		std::fs::write(&path, "{\"src\":\"A\",\"dst\":\"B\",\"type\":\"TCP\",\"rate\":10}\n{\"src\":\"B\",\"dst\":\"A\",\"type\":\"UDP\",\"rate\":5}\n").unwrap();
		let streams = load_streams(&path).unwrap();
		assert_eq!(streams.len(), 2);
		std::fs::remove_dir_all(&dir).ok();
	}
}
