/*!

The external geocoder capability (spec §1, §4.1, §5): an opaque, cached lookup
from city name to latitude/longitude, tried against a sequence of providers
(Nominatim -> Photon -> IGNFrance -> DataBC) with strictly sequential fallback
*within* a city's lookup, and concurrent fan-out *across* cities during topology
load. A provider failure is never fatal — exhaustion yields `None` coordinates,
not an error bubbling to the planner.

*/

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

/// One geocoding backend. Implementations should treat any transient failure
/// (timeout, 5xx, malformed body) as `Ok(None)` so the caller falls through to
/// the next provider rather than aborting the whole lookup.
#[async_trait]
pub trait GeocoderProvider: Send + Sync
{
	fn name(&self) -> &'static str;
	async fn lookup(&self, city: &str) -> Option<(f64, f64)>;
}

/// <https://nominatim.openstreetmap.org> — tried first.
pub struct Nominatim
{
	client: reqwest::Client,
}

impl Nominatim
{
	pub fn new(client: reqwest::Client) -> Self
	{
		Nominatim { client }
	}
}

#[async_trait]
impl GeocoderProvider for Nominatim
{
	fn name(&self) -> &'static str
	{
		"nominatim"
	}

	async fn lookup(&self, city: &str) -> Option<(f64, f64)>
	{
		#[derive(Deserialize)]
		struct Hit { lat: String, lon: String }

		let response = self.client.get("https://nominatim.openstreetmap.org/search")
			.query(&[("q", city), ("format", "json"), ("limit", "1")])
			.send().await.ok()?;
		let hits: Vec<Hit> = response.json().await.ok()?;
		let hit = hits.into_iter().next()?;
		Some((hit.lat.parse().ok()?, hit.lon.parse().ok()?))
	}
}

/// <https://photon.komoot.io> — tried second.
pub struct Photon
{
	client: reqwest::Client,
}

impl Photon
{
	pub fn new(client: reqwest::Client) -> Self
	{
		Photon { client }
	}
}

#[async_trait]
impl GeocoderProvider for Photon
{
	fn name(&self) -> &'static str
	{
		"photon"
	}

	async fn lookup(&self, city: &str) -> Option<(f64, f64)>
	{
		#[derive(Deserialize)]
		struct Geometry { coordinates: (f64, f64) }
		#[derive(Deserialize)]
		struct Feature { geometry: Geometry }
		#[derive(Deserialize)]
		struct FeatureCollection { features: Vec<Feature> }

		let response = self.client.get("https://photon.komoot.io/api").query(&[("q", city), ("limit", "1")]).send().await.ok()?;
		let collection: FeatureCollection = response.json().await.ok()?;
		let feature = collection.features.into_iter().next()?;
		let (lon, lat) = feature.geometry.coordinates;
		Some((lat, lon))
	}
}

/// <https://api-adresse.data.gouv.fr> (IGN France) — tried third.
pub struct IgnFrance
{
	client: reqwest::Client,
}

impl IgnFrance
{
	pub fn new(client: reqwest::Client) -> Self
	{
		IgnFrance { client }
	}
}

#[async_trait]
impl GeocoderProvider for IgnFrance
{
	fn name(&self) -> &'static str
	{
		"ignfrance"
	}

	async fn lookup(&self, city: &str) -> Option<(f64, f64)>
	{
		#[derive(Deserialize)]
		struct Geometry { coordinates: (f64, f64) }
		#[derive(Deserialize)]
		struct Feature { geometry: Geometry }
		#[derive(Deserialize)]
		struct FeatureCollection { features: Vec<Feature> }

		let response = self.client.get("https://api-adresse.data.gouv.fr/search/").query(&[("q", city), ("limit", "1")]).send().await.ok()?;
		let collection: FeatureCollection = response.json().await.ok()?;
		let feature = collection.features.into_iter().next()?;
		let (lon, lat) = feature.geometry.coordinates;
		Some((lat, lon))
	}
}

/// British Columbia's address geocoder — tried last.
pub struct DataBc
{
	client: reqwest::Client,
}

impl DataBc
{
	pub fn new(client: reqwest::Client) -> Self
	{
		DataBc { client }
	}
}

#[async_trait]
impl GeocoderProvider for DataBc
{
	fn name(&self) -> &'static str
	{
		"databc"
	}

	async fn lookup(&self, city: &str) -> Option<(f64, f64)>
	{
		#[derive(Deserialize)]
		struct Point { coordinates: (f64, f64) }
		#[derive(Deserialize)]
		struct Feature { geometry: Point }
		#[derive(Deserialize)]
		struct FeatureCollection { features: Vec<Feature> }

		let response = self.client.get("https://geocoder.api.gov.bc.ca/addresses.json").query(&[("addressString", city)]).send().await.ok()?;
		let collection: FeatureCollection = response.json().await.ok()?;
		let feature = collection.features.into_iter().next()?;
		let (lon, lat) = feature.geometry.coordinates;
		Some((lat, lon))
	}
}

/// One persisted cache entry. `None` records a prior exhaustion so we do not
/// re-query every provider on every run for a city known to have no result.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct CacheEntry
{
	lat: Option<f64>,
	lon: Option<f64>,
	cached_at: chrono::DateTime<chrono::Utc>,
}

/// City-name-keyed, on-disk geocoder cache. The whole map is held in memory and
/// rewritten atomically (write to a sibling temp file, then rename) on every
/// update, so a crash mid-write leaves either the old complete file or the new
/// one, never a half-written one (spec §5).
pub struct GeocoderCache
{
	path: PathBuf,
	entries: Mutex<HashMap<String, CacheEntry>>,
}

impl GeocoderCache
{
	pub fn load(path: impl Into<PathBuf>) -> Self
	{
		let path = path.into();
		let entries = std::fs::read(&path).ok().and_then(|bytes| serde_json::from_slice(&bytes).ok()).unwrap_or_default();
		GeocoderCache { path, entries: Mutex::new(entries) }
	}

	async fn get(&self, city: &str) -> Option<(Option<f64>, Option<f64>)>
	{
		let entries = self.entries.lock().await;
		entries.get(city).map(|e| (e.lat, e.lon))
	}

	async fn put(&self, city: &str, coords: (Option<f64>, Option<f64>)) -> crate::error::Result<()>
	{
		let mut entries = self.entries.lock().await;
		entries.insert(city.to_string(), CacheEntry { lat: coords.0, lon: coords.1, cached_at: chrono::Utc::now() });
		write_atomic(&self.path, &*entries)
	}
}

fn write_atomic(path: &Path, entries: &HashMap<String, CacheEntry>) -> crate::error::Result<()>
{
	let dir = path.parent().unwrap_or_else(|| Path::new("."));
	std::fs::create_dir_all(dir).map_err(crate::error::Error::GeocoderCache)?;
	let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(crate::error::Error::GeocoderCache)?;
	serde_json::to_writer_pretty(&mut tmp, entries).map_err(|e| crate::error::Error::GeocoderCache(e.into()))?;
	tmp.persist(path).map_err(|e| crate::error::Error::GeocoderCache(e.error))?;
	Ok(())
}

/// The whole provider-fallback + cache orchestration.
pub struct Geocoder
{
	providers: Vec<Box<dyn GeocoderProvider>>,
	cache: Arc<GeocoderCache>,
}

impl Geocoder
{
	pub fn new(cache_path: impl Into<PathBuf>) -> Self
	{
		let client = reqwest::Client::builder().timeout(std::time::Duration::from_secs(10)).build().expect("reqwest client builder cannot fail with these options");
		let providers: Vec<Box<dyn GeocoderProvider>> = vec![
			Box::new(Nominatim::new(client.clone())),
			Box::new(Photon::new(client.clone())),
			Box::new(IgnFrance::new(client.clone())),
			Box::new(DataBc::new(client)),
		];
		Geocoder { providers, cache: Arc::new(GeocoderCache::load(cache_path)) }
	}

	/// Resolve every city concurrently; providers within one city's lookup are
	/// tried strictly in order (Nominatim, Photon, IGNFrance, DataBC).
	pub async fn resolve_all(&self, cities: &[String]) -> HashMap<String, (Option<f64>, Option<f64>)>
	{
		let futures = cities.iter().map(|city| self.resolve_one(city));
		let results = futures::future::join_all(futures).await;
		cities.iter().cloned().zip(results).collect()
	}

	async fn resolve_one(&self, city: &str) -> (Option<f64>, Option<f64>)
	{
		if let Some(cached) = self.cache.get(city).await
		{
			return cached;
		}
		for provider in &self.providers
		{
			if let Some((lat, lon)) = provider.lookup(city).await
			{
				if let Err(err) = self.cache.put(city, (Some(lat), Some(lon))).await
				{
					warn!(city, provider = provider.name(), %err, "failed to persist geocoder cache entry");
				}
				return (Some(lat), Some(lon));
			}
			warn!(city, provider = provider.name(), "geocoder provider found nothing, trying next");
		}
		let _ = self.cache.put(city, (None, None)).await;
		(None, None)
	}
}
