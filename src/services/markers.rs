// src/services/markers.rs

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use tokio::{sync::RwLock, task::JoinSet};

use crate::{
    error::AppError,
    models::{
        profile::Profile,
        region::{DEFAULT_CENTER, LatLng, find_province},
    },
    services::directory::DirectoryStore,
    utils::{avatar, photo},
};

/// Markers land within ±JITTER/2 degrees of the province centroid.
pub const JITTER: f64 = 0.1;

/// How marker positions are spread around the province centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterMode {
    /// Offset seeded by the profile id: same profile, same spot.
    Stable,
    /// Fresh offset on every placement.
    Random,
}

/// Source of raw avatar bytes for a photo reference.
#[async_trait]
pub trait AvatarSource: Send + Sync {
    async fn fetch(&self, photo_ref: &str) -> Result<Vec<u8>, AppError>;
}

/// Fetches `http(s)` photo refs and decodes inline `data:` ones.
pub struct HttpAvatarSource {
    client: reqwest::Client,
}

impl HttpAvatarSource {
    pub fn new() -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AvatarSource for HttpAvatarSource {
    async fn fetch(&self, photo_ref: &str) -> Result<Vec<u8>, AppError> {
        if photo_ref.starts_with("data:") {
            return photo::decode_data_url(photo_ref);
        }

        let response = self.client.get(photo_ref).send().await?.error_for_status()?;
        if response
            .content_length()
            .is_some_and(|len| len as usize > photo::MAX_PHOTO_BYTES)
        {
            return Err(AppError::PayloadTooLarge(format!(
                "Avatar at {} exceeds the size limit",
                photo_ref
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.len() > photo::MAX_PHOTO_BYTES {
            return Err(AppError::PayloadTooLarge(format!(
                "Avatar at {} exceeds the size limit",
                photo_ref
            )));
        }
        Ok(bytes.to_vec())
    }
}

/// A placed map marker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub profile_id: String,
    pub username: String,
    pub position: LatLng,
    /// PNG badge as a data URL.
    pub icon: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Serialize)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub kept: usize,
    /// A newer pass started before this one finished placing markers.
    pub superseded: bool,
}

/// Keeps the marker set equal to the directory's online subset.
///
/// Every pass takes a new generation number. A pass stops placing markers as
/// soon as it sees a newer generation, so slow avatar loads from an old pass
/// never land after a newer pass has run.
pub struct MarkerReconciler {
    source: Arc<dyn AvatarSource>,
    jitter: JitterMode,
    markers: RwLock<HashMap<String, Marker>>,
    generation: AtomicU64,
}

impl MarkerReconciler {
    pub fn new(source: Arc<dyn AvatarSource>, jitter: JitterMode) -> Self {
        Self {
            source,
            jitter,
            markers: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot ordered by profile id.
    pub async fn markers(&self) -> Vec<Marker> {
        let mut markers: Vec<Marker> = self.markers.read().await.values().cloned().collect();
        markers.sort_by(|a, b| a.profile_id.cmp(&b.profile_id));
        markers
    }

    /// Removes stale markers, renders and places missing ones, leaves the rest untouched.
    pub async fn reconcile(&self, online: &[Profile]) -> ReconcileReport {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let online_ids: HashSet<&str> = online.iter().map(|p| p.id.as_str()).collect();
        let mut report = ReconcileReport::default();

        let missing: Vec<Profile> = {
            let mut markers = self.markers.write().await;
            report.removed = markers
                .keys()
                .filter(|id| !online_ids.contains(id.as_str()))
                .cloned()
                .collect();
            for id in &report.removed {
                markers.remove(id);
            }
            online
                .iter()
                .filter(|p| !markers.contains_key(&p.id))
                .cloned()
                .collect()
        };
        report.kept = online.len() - missing.len();

        let mut tasks = JoinSet::new();
        for profile in missing {
            let source = Arc::clone(&self.source);
            tasks.spawn(async move {
                let icon = render_icon(source.as_ref(), &profile).await;
                (profile, icon)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (profile, icon) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::warn!("Avatar task failed: {:?}", e);
                    continue;
                }
            };

            let mut markers = self.markers.write().await;
            if self.generation.load(Ordering::SeqCst) != generation {
                report.superseded = true;
                tasks.abort_all();
                break;
            }

            let position = self.position_for(&profile);
            markers.entry(profile.id.clone()).or_insert_with(|| {
                report.added.push(profile.id.clone());
                Marker {
                    profile_id: profile.id.clone(),
                    username: profile.username.clone(),
                    position,
                    icon,
                }
            });
        }

        tracing::debug!(
            "Marker pass {}: +{} -{} ={}{}",
            generation,
            report.added.len(),
            report.removed.len(),
            report.kept,
            if report.superseded { " (superseded)" } else { "" }
        );
        report
    }

    /// Province centroid plus jitter; the default center when the province is unknown.
    pub fn position_for(&self, profile: &Profile) -> LatLng {
        let Some((_, province)) = find_province(&profile.province) else {
            return DEFAULT_CENTER;
        };
        let centroid = province.centroid();

        let (dlat, dlng) = match self.jitter {
            JitterMode::Stable => {
                let mut rng = StdRng::seed_from_u64(seed_for(&profile.id));
                jitter_pair(&mut rng)
            }
            JitterMode::Random => jitter_pair(&mut rand::thread_rng()),
        };

        LatLng {
            lat: centroid.lat + dlat,
            lng: centroid.lng + dlng,
        }
    }

    /// Runs a pass now and again whenever the directory's online subset changes.
    pub fn watch(self: Arc<Self>, directory: Arc<DirectoryStore>) -> tokio::task::JoinHandle<()> {
        let mut changes = directory.subscribe();

        tokio::spawn(async move {
            let mut last: Option<BTreeSet<String>> = None;
            loop {
                let online = directory.online_subset().await;
                let ids: BTreeSet<String> = online.iter().map(|p| p.id.clone()).collect();

                if last.as_ref() != Some(&ids) {
                    last = Some(ids);
                    let reconciler = Arc::clone(&self);
                    // Passes may overlap; the newest one wins.
                    tokio::spawn(async move {
                        reconciler.reconcile(&online).await;
                    });
                }

                if changes.changed().await.is_err() {
                    tracing::info!("Directory closed, marker watcher stopping");
                    break;
                }
            }
        })
    }
}

fn jitter_pair<R: Rng>(rng: &mut R) -> (f64, f64) {
    let half = JITTER / 2.0;
    (rng.gen_range(-half..half), rng.gen_range(-half..half))
}

/// FNV-1a over the id bytes; stable across runs and platforms.
fn seed_for(id: &str) -> u64 {
    id.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Loads the photo and draws the badge off the async runtime.
/// Any failure yields the grey fallback badge.
async fn render_icon(source: &dyn AvatarSource, profile: &Profile) -> String {
    let online = profile.visible_on_map;

    let rendered = match source.fetch(&profile.photo_ref).await {
        Ok(bytes) => tokio::task::spawn_blocking(move || {
            avatar::render_badge(&bytes, online).and_then(|badge| avatar::to_data_url(&badge))
        })
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))
        .and_then(|result| result),
        Err(e) => Err(e),
    };

    rendered.unwrap_or_else(|e| {
        tracing::warn!("Avatar for {} unavailable, using fallback: {}", profile.id, e);
        avatar::to_data_url(&avatar::render_fallback()).unwrap_or_default()
    })
}
