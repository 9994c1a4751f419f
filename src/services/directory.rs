// src/services/directory.rs

use std::{
    collections::{BTreeSet, HashSet},
    sync::{Arc, LazyLock},
};

use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric, seq::SliceRandom};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, watch};
use url::Url;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        identity::Identity,
        profile::{Link, LinkInput, Profile, SaveProfileRequest, Theme},
        region::find_province,
    },
    storage::{KvStore, keys, load_json, save_json},
    utils::html::{clean_html, clean_text},
};

pub const REAL_UID_PREFIX: &str = "022026";
pub const SIMULATED_UID_PREFIX: &str = "0";

/// Upper bound of the explore sidebar.
pub const EXPLORE_FEED_LIMIT: usize = 15;

/// Substring that marks a generated placeholder avatar rather than a real photo.
const PLACEHOLDER_AVATAR_HOST: &str = "ui-avatars";

static REAL_UID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^022026(\d+)$").expect("valid uid regex"));
static SIMULATED_UID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0(\d+)$").expect("valid uid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UidClass {
    Real,
    Simulated,
}

/// Splits a uid into its class and sequence number. `None` when malformed.
pub fn parse_uid(uid: &str) -> Option<(UidClass, u64)> {
    if let Some(caps) = REAL_UID_RE.captures(uid) {
        return caps[1].parse().ok().map(|n| (UidClass::Real, n));
    }
    SIMULATED_UID_RE
        .captures(uid)
        .and_then(|caps| caps[1].parse().ok())
        .map(|n| (UidClass::Simulated, n))
}

fn format_uid(class: UidClass, sequence: u64) -> String {
    match class {
        UidClass::Real => format!("{}{}", REAL_UID_PREFIX, sequence),
        UidClass::Simulated => format!("{}{}", SIMULATED_UID_PREFIX, sequence),
    }
}

/// Highest sequence ever issued per class. Removing a profile never lowers it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct UidMarks {
    real: u64,
    simulated: u64,
}

impl UidMarks {
    fn slot(&mut self, class: UidClass) -> &mut u64 {
        match class {
            UidClass::Real => &mut self.real,
            UidClass::Simulated => &mut self.simulated,
        }
    }

    /// Raises the mark to cover `uid`.
    fn observe(&mut self, uid: &str) {
        if let Some((class, sequence)) = parse_uid(uid) {
            let slot = self.slot(class);
            *slot = (*slot).max(sequence);
        }
    }

    /// Issues the next uid in `class` and records it.
    fn issue(&mut self, class: UidClass) -> String {
        let slot = self.slot(class);
        let mut sequence = *slot + 1;
        // A simulated code must never read as a real one.
        while class == UidClass::Simulated
            && parse_uid(&format_uid(class, sequence)).map(|(c, _)| c) != Some(UidClass::Simulated)
        {
            sequence += 1;
        }
        *slot = sequence;
        format_uid(class, sequence)
    }
}

/// `<origin>/#/<username>`
pub fn share_link(origin: &str, username: &str) -> String {
    match Url::parse(origin) {
        Ok(mut url) => {
            url.set_fragment(Some(&format!("/{}", username)));
            url.to_string()
        }
        Err(_) => format!("{}/#/{}", origin.trim_end_matches('/'), username),
    }
}

/// The collection of all profiles.
pub struct DirectoryStore {
    kv: Arc<dyn KvStore>,
    profiles: RwLock<Vec<Profile>>,
    /// Locked only while `profiles` is write-locked.
    uid_marks: Mutex<UidMarks>,
    revision: watch::Sender<u64>,
}

impl DirectoryStore {
    /// Loads the persisted directory, seeding the demo profile on first run.
    pub async fn load(kv: Arc<dyn KvStore>) -> Result<Self, AppError> {
        let profiles = match load_json::<Vec<Profile>>(kv.as_ref(), keys::DIRECTORY).await? {
            Some(profiles) => profiles,
            None => {
                let seed = vec![demo_profile()];
                save_json(kv.as_ref(), keys::DIRECTORY, &seed).await?;
                tracing::info!("Seeded directory with demo profile");
                seed
            }
        };

        let mut uid_marks = load_json::<UidMarks>(kv.as_ref(), keys::UID_MARKS)
            .await?
            .unwrap_or_default();
        for profile in &profiles {
            uid_marks.observe(&profile.uid);
        }

        tracing::info!("Directory loaded with {} profiles", profiles.len());

        let (revision, _) = watch::channel(0);
        Ok(Self {
            kv,
            profiles: RwLock::new(profiles),
            uid_marks: Mutex::new(uid_marks),
            revision,
        })
    }

    /// Notified after every committed mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Records issued uids ahead of the directory write, so a failed write
    /// can only skip numbers, never reuse them.
    async fn save_marks(&self, marks: &UidMarks) -> Result<(), AppError> {
        save_json(self.kv.as_ref(), keys::UID_MARKS, marks).await
    }

    /// Persists `next` and only then makes it the live collection.
    async fn commit(&self, current: &mut Vec<Profile>, next: Vec<Profile>) -> Result<(), AppError> {
        save_json(self.kv.as_ref(), keys::DIRECTORY, &next).await?;
        *current = next;
        self.revision.send_modify(|rev| *rev += 1);
        Ok(())
    }

    pub async fn list_profiles(&self) -> Vec<Profile> {
        self.profiles.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Result<Profile, AppError> {
        self.profiles
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Profile '{}' not found", id)))
    }

    /// Public page lookup.
    pub async fn find_by_username(&self, username: &str) -> Result<Profile, AppError> {
        self.profiles
            .read()
            .await
            .iter()
            .find(|p| p.username == username)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Profile '{}' not found", username)))
    }

    pub async fn find_by_owner(&self, owner_id: &str) -> Option<Profile> {
        self.profiles
            .read()
            .await
            .iter()
            .find(|p| p.owner_id == owner_id)
            .cloned()
    }

    /// Profiles eligible for the map.
    pub async fn online_subset(&self) -> Vec<Profile> {
        self.profiles
            .read()
            .await
            .iter()
            .filter(|p| p.visible_on_map)
            .cloned()
            .collect()
    }

    /// Inserts or replaces by id. Last write wins, no merge.
    ///
    /// Assigns the next real-class uid when the given one is absent, malformed
    /// or already held by another profile, and stamps `updated_at`.
    pub async fn upsert_profile(&self, mut profile: Profile) -> Result<Profile, AppError> {
        let mut profiles = self.profiles.write().await;

        if profiles
            .iter()
            .any(|p| p.id != profile.id && p.username == profile.username)
        {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                profile.username
            )));
        }

        if let Some(existing) = profiles.iter().find(|p| p.id == profile.id) {
            if existing.username != profile.username {
                return Err(AppError::Validation(
                    "Username cannot be changed once saved".to_string(),
                ));
            }
        }

        let uid_taken = profiles
            .iter()
            .any(|p| p.id != profile.id && p.uid == profile.uid);
        let mut marks = self.uid_marks.lock().await;
        let before = *marks;
        if parse_uid(&profile.uid).is_none() || uid_taken {
            profile.uid = marks.issue(UidClass::Real);
            tracing::info!("Assigned uid {} to profile {}", profile.uid, profile.id);
        } else {
            marks.observe(&profile.uid);
        }
        if *marks != before {
            self.save_marks(&marks).await?;
        }
        drop(marks);
        profile.updated_at = Utc::now();

        let mut next: Vec<Profile> = profiles
            .iter()
            .filter(|p| p.id != profile.id)
            .cloned()
            .collect();
        next.push(profile.clone());

        self.commit(&mut profiles, next).await?;
        tracing::debug!("Upserted profile {} ({})", profile.id, profile.username);

        Ok(profile)
    }

    /// Builds the owner's profile from a dashboard save and upserts it.
    ///
    /// Requires a real photo and a complete location. Region and postal code
    /// are derived from the province; counters, uid and link click counts
    /// carry over from the previously saved profile.
    pub async fn save_for_owner(
        &self,
        owner: &Identity,
        payload: SaveProfileRequest,
    ) -> Result<Profile, AppError> {
        payload.validate()?;

        if payload.photo_ref.trim().is_empty() || payload.photo_ref.contains(PLACEHOLDER_AVATAR_HOST) {
            return Err(AppError::Validation(
                "Please upload a profile photo before saving".to_string(),
            ));
        }
        if payload.province.trim().is_empty()
            || payload.district.trim().is_empty()
            || payload.sub_district.trim().is_empty()
        {
            return Err(AppError::Validation(
                "Province, district and sub-district are required".to_string(),
            ));
        }
        let (region, province) = find_province(&payload.province).ok_or_else(|| {
            AppError::Validation(format!("Unknown province '{}'", payload.province))
        })?;

        let existing = self.find_by_owner(&owner.id).await;
        let now = Utc::now();

        let links = merge_links(
            existing.as_ref().map(|p| p.links.as_slice()).unwrap_or(&[]),
            payload.links,
        );
        let theme = payload
            .theme
            .or_else(|| existing.as_ref().map(|p| p.theme.clone()))
            .unwrap_or_default();
        let display_name = if payload.display_name.trim().is_empty() {
            owner.display_name.clone()
        } else {
            payload.display_name
        };

        let profile = Profile {
            id: existing
                .as_ref()
                .map(|p| p.id.clone())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            owner_id: owner.id.clone(),
            uid: existing.as_ref().map(|p| p.uid.clone()).unwrap_or_default(),
            username: payload.username,
            display_name,
            photo_ref: payload.photo_ref,
            bio: clean_html(&payload.bio),
            tags: payload.tags,
            region: region.name.to_string(),
            province: province.name.to_string(),
            district: payload.district,
            sub_district: payload.sub_district,
            postal_code: province.postal_code(),
            visible_on_map: payload.visible_on_map,
            like_count: existing.as_ref().map(|p| p.like_count).unwrap_or(0),
            view_count: existing.as_ref().map(|p| p.view_count).unwrap_or(0),
            theme,
            links,
            created_at: existing.as_ref().map(|p| p.created_at).unwrap_or(now),
            updated_at: now,
        };

        self.upsert_profile(profile).await
    }

    /// Ban or delete. Questions and popups keep their references.
    pub async fn remove_profile(&self, id: &str) -> Result<Profile, AppError> {
        let mut profiles = self.profiles.write().await;

        let removed = profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Profile '{}' not found", id)))?;

        let next = profiles.iter().filter(|p| p.id != id).cloned().collect();
        self.commit(&mut profiles, next).await?;
        tracing::info!("Removed profile {} ({})", removed.id, removed.username);

        Ok(removed)
    }

    /// Adds one like. Not de-duplicated per visitor.
    pub async fn like(&self, id: &str) -> Result<u64, AppError> {
        self.bump(id, |p| {
            p.like_count += 1;
            p.like_count
        })
        .await
    }

    pub async fn record_view(&self, id: &str) -> Result<u64, AppError> {
        self.bump(id, |p| {
            p.view_count += 1;
            p.view_count
        })
        .await
    }

    pub async fn record_click(&self, id: &str, link_id: &str) -> Result<u64, AppError> {
        let mut profiles = self.profiles.write().await;

        let mut next = profiles.clone();
        let link = next
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Profile '{}' not found", id)))?
            .links
            .iter_mut()
            .find(|l| l.id == link_id)
            .ok_or_else(|| AppError::NotFound(format!("Link '{}' not found", link_id)))?;
        link.click_count += 1;
        let clicks = link.click_count;

        self.commit(&mut profiles, next).await?;
        Ok(clicks)
    }

    /// Applies a counter update to one profile in place.
    async fn bump<F>(&self, id: &str, update: F) -> Result<u64, AppError>
    where
        F: FnOnce(&mut Profile) -> u64,
    {
        let mut profiles = self.profiles.write().await;

        let mut next = profiles.clone();
        let target = next
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Profile '{}' not found", id)))?;
        let value = update(target);

        self.commit(&mut profiles, next).await?;
        Ok(value)
    }

    /// Appends `count` synthetic profiles placed in `province`.
    pub async fn simulate_profiles(
        &self,
        count: usize,
        province: &str,
    ) -> Result<Vec<Profile>, AppError> {
        let mut profiles = self.profiles.write().await;

        let (region_name, postal_code) = match find_province(province) {
            Some((region, p)) => (region.name.to_string(), p.postal_code()),
            None => {
                tracing::warn!("Simulating profiles in unknown province '{}'", province);
                ("Unknown".to_string(), "00000".to_string())
            }
        };

        let mut marks = self.uid_marks.lock().await;
        let mut next = profiles.clone();
        let mut taken: HashSet<String> = next.iter().map(|p| p.username.clone()).collect();
        let batch = Utc::now().timestamp_millis();
        let mut created = Vec::with_capacity(count);

        for i in 0..count {
            let uid = marks.issue(UidClass::Simulated);
            let sequence = parse_uid(&uid).map(|(_, n)| n).unwrap_or_default();

            let mut rng = rand::thread_rng();
            let username = loop {
                let suffix: String = (&mut rng)
                    .sample_iter(&Alphanumeric)
                    .take(5)
                    .map(|c| char::from(c).to_ascii_lowercase())
                    .collect();
                let candidate = format!("user_{}", suffix);
                if taken.insert(candidate.clone()) {
                    break candidate;
                }
            };

            let now = Utc::now();
            let profile = Profile {
                id: format!("sim-{}-{}", batch, i),
                owner_id: format!("sim-user-{}-{}", batch, i),
                uid,
                username,
                display_name: format!("User {}", sequence),
                photo_ref: format!("https://picsum.photos/seed/{}-{}/200", batch, i),
                bio: "Simulated User".to_string(),
                tags: BTreeSet::new(),
                region: region_name.clone(),
                province: province.to_string(),
                district: "เมือง".to_string(),
                sub_district: "ในเมือง".to_string(),
                postal_code: postal_code.clone(),
                visible_on_map: true,
                like_count: rng.gen_range(0..50),
                view_count: rng.gen_range(0..100),
                theme: Theme::default(),
                links: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            next.push(profile.clone());
            created.push(profile);
        }

        self.save_marks(&marks).await?;
        drop(marks);
        self.commit(&mut profiles, next).await?;
        tracing::info!("Simulated {} profiles in {}", count, province);

        Ok(created)
    }

    /// Explore sidebar: visible profiles, narrowed to `province` when any
    /// match, shuffled and capped.
    pub async fn explore_feed(&self, province: Option<&str>, limit: usize) -> Vec<Profile> {
        let mut candidates = self.online_subset().await;

        if let Some(province) = province {
            let same: Vec<Profile> = candidates
                .iter()
                .filter(|p| p.province == province)
                .cloned()
                .collect();
            if !same.is_empty() {
                candidates = same;
            }
        }

        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(limit.min(EXPLORE_FEED_LIMIT));
        candidates
    }
}

/// Keeps ids and click counts of links that survive an edit, in the new order.
fn merge_links(previous: &[Link], edited: Vec<LinkInput>) -> Vec<Link> {
    edited
        .into_iter()
        .map(|input| {
            let kept = input
                .id
                .as_deref()
                .and_then(|id| previous.iter().find(|l| l.id == id));
            Link {
                id: kept
                    .map(|l| l.id.clone())
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
                title: clean_text(&input.title),
                url: input.url,
                click_count: kept.map(|l| l.click_count).unwrap_or(0),
                is_active: input.is_active,
            }
        })
        .collect()
}

fn demo_profile() -> Profile {
    let now = Utc::now();
    Profile {
        id: "mock1".to_string(),
        owner_id: "mock1".to_string(),
        uid: format!("{}1", REAL_UID_PREFIX),
        username: "somchai".to_string(),
        display_name: "Somchai K.".to_string(),
        photo_ref: "https://picsum.photos/200".to_string(),
        bio: "Coffee lover in Bangkok".to_string(),
        tags: BTreeSet::from(["Foodie".to_string()]),
        region: "ภาคกลาง".to_string(),
        province: "กรุงเทพมหานคร".to_string(),
        district: "ปทุมวัน".to_string(),
        sub_district: "รองเมือง".to_string(),
        postal_code: "10330".to_string(),
        visible_on_map: true,
        like_count: 25,
        view_count: 102,
        theme: Theme::default(),
        links: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
