//! Song catalog: bounded, newest-first collection of generated songs.
//!
//! Each song owns a playback handle acquired from a [`PlaybackProvider`].
//! Handles stay live while the song is cataloged and are released when the
//! song is evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::CatalogError;
use crate::mood::Mood;

/// Most songs the catalog ever holds.
pub const MAX_SONGS: usize = 10;
/// MIME type of every generated song.
pub const MIME_TYPE: &str = "audio/wav";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Suggested download name: `{mood}-music-creation-{ISO8601}.wav`.
pub fn download_filename(mood: Mood, created_at: DateTime<Utc>) -> String {
    format!(
        "{}-music-creation-{}.wav",
        mood.label(),
        created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

// ── Rendered audio ──────────────────────────────────────────

/// WAV bytes produced by one generation, before they are cataloged.
#[derive(Debug, Clone)]
pub struct RenderedAudio {
    pub mood: Mood,
    pub wav: Arc<[u8]>,
    pub duration_seconds: f64,
    pub created_at: DateTime<Utc>,
}

impl RenderedAudio {
    pub fn new(mood: Mood, wav: Vec<u8>, duration_seconds: f64) -> Self {
        RenderedAudio {
            mood,
            wav: wav.into(),
            duration_seconds,
            created_at: Utc::now(),
        }
    }

    pub fn download_filename(&self) -> String {
        download_filename(self.mood, self.created_at)
    }

    pub fn share_payload(&self) -> SharePayload {
        SharePayload {
            filename: self.download_filename(),
            mime_type: MIME_TYPE,
            bytes: Arc::clone(&self.wav),
        }
    }
}

/// What a platform share sheet needs.
#[derive(Debug, Clone)]
pub struct SharePayload {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Arc<[u8]>,
}

// ── Playback handles ────────────────────────────────────────

/// Opaque reference to a playable resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackHandle(pub String);

/// Hands out playable resources for generated audio.
pub trait PlaybackProvider: Send + Sync {
    fn acquire(&self, wav: Arc<[u8]>) -> Result<PlaybackHandle, CatalogError>;
    fn release(&self, handle: &PlaybackHandle);
    fn resolve(&self, handle: &PlaybackHandle) -> Option<Arc<[u8]>>;
}

/// In-process playback store with a cap on live handles.
#[derive(Debug)]
pub struct MemoryPlayback {
    limit: usize,
    live: Mutex<HashMap<PlaybackHandle, Arc<[u8]>>>,
}

impl MemoryPlayback {
    pub fn new(limit: usize) -> Self {
        MemoryPlayback {
            limit,
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn live_count(&self) -> usize {
        lock(&self.live).len()
    }
}

impl Default for MemoryPlayback {
    fn default() -> Self {
        // One spare so a new song can be staged before the oldest is evicted.
        MemoryPlayback::new(MAX_SONGS + 1)
    }
}

impl PlaybackProvider for MemoryPlayback {
    fn acquire(&self, wav: Arc<[u8]>) -> Result<PlaybackHandle, CatalogError> {
        let mut live = lock(&self.live);
        if live.len() >= self.limit {
            return Err(CatalogError::HandleExhausted {
                live: live.len(),
                limit: self.limit,
            });
        }
        let handle = PlaybackHandle(format!("playback:{}", Uuid::new_v4()));
        live.insert(handle.clone(), wav);
        Ok(handle)
    }

    fn release(&self, handle: &PlaybackHandle) {
        lock(&self.live).remove(handle);
    }

    fn resolve(&self, handle: &PlaybackHandle) -> Option<Arc<[u8]>> {
        lock(&self.live).get(handle).cloned()
    }
}

// ── Generated song ──────────────────────────────────────────

/// A cataloged generation result. Immutable once created.
#[derive(Debug, Clone)]
pub struct GeneratedSong {
    pub id: String,
    pub title: String,
    pub duration_seconds: f64,
    pub mood: Mood,
    pub wav: Arc<[u8]>,
    pub handle: PlaybackHandle,
    pub created_at: DateTime<Utc>,
    /// Hex SHA-256 of `wav`.
    pub sha256: String,
}

impl GeneratedSong {
    pub fn new(audio: RenderedAudio, title: String, handle: PlaybackHandle) -> Self {
        let sha256 = Sha256::digest(&audio.wav)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        GeneratedSong {
            id: Uuid::new_v4().to_string(),
            title,
            duration_seconds: audio.duration_seconds,
            mood: audio.mood,
            wav: audio.wav,
            handle,
            created_at: audio.created_at,
            sha256,
        }
    }

    pub fn download_filename(&self) -> String {
        download_filename(self.mood, self.created_at)
    }

    pub fn share_payload(&self) -> SharePayload {
        SharePayload {
            filename: self.download_filename(),
            mime_type: MIME_TYPE,
            bytes: Arc::clone(&self.wav),
        }
    }

    /// `data:audio/wav;base64,...` for hosts that play from a URI.
    pub fn data_uri(&self) -> String {
        format!("data:{MIME_TYPE};base64,{}", STANDARD.encode(&self.wav))
    }

    pub fn summary(&self) -> SongSummary {
        SongSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            duration_seconds: self.duration_seconds,
            mood: self.mood,
            created_at: self.created_at,
            filename: self.download_filename(),
            size_bytes: self.wav.len(),
            sha256: self.sha256.clone(),
        }
    }
}

/// Byte-free view of a song for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongSummary {
    pub id: String,
    pub title: String,
    pub duration_seconds: f64,
    pub mood: Mood,
    pub created_at: DateTime<Utc>,
    pub filename: String,
    pub size_bytes: usize,
    pub sha256: String,
}

// ── Catalog ─────────────────────────────────────────────────

/// Newest-first list of songs, never longer than its capacity.
#[derive(Debug)]
pub struct SongCatalog {
    capacity: usize,
    songs: Mutex<VecDeque<Arc<GeneratedSong>>>,
}

impl SongCatalog {
    pub fn new() -> Self {
        SongCatalog::with_capacity(MAX_SONGS)
    }

    /// Capacity is clamped to `1..=MAX_SONGS`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_SONGS);
        SongCatalog {
            capacity,
            songs: Mutex::new(VecDeque::with_capacity(capacity + 1)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert at the front. Returns the evicted oldest song, if the
    /// catalog was full. Insert and eviction happen under one lock.
    pub fn append(&self, song: Arc<GeneratedSong>) -> Option<Arc<GeneratedSong>> {
        let mut songs = lock(&self.songs);
        let evicted = if songs.len() >= self.capacity {
            songs.pop_back()
        } else {
            None
        };
        songs.push_front(song);
        evicted
    }

    /// Snapshot, newest first.
    pub fn list(&self) -> Vec<Arc<GeneratedSong>> {
        lock(&self.songs).iter().cloned().collect()
    }

    pub fn select(&self, id: &str) -> Result<Arc<GeneratedSong>, CatalogError> {
        lock(&self.songs)
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    pub fn latest(&self) -> Option<Arc<GeneratedSong>> {
        lock(&self.songs).front().cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.songs).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.songs).is_empty()
    }
}

impl Default for SongCatalog {
    fn default() -> Self {
        SongCatalog::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn song(n: usize) -> Arc<GeneratedSong> {
        let audio = RenderedAudio::new(Mood::Calm, vec![n as u8; 4], 1.0);
        Arc::new(GeneratedSong::new(
            audio,
            format!("Song {n}"),
            PlaybackHandle(format!("h{n}")),
        ))
    }

    #[test]
    fn eleventh_append_evicts_first() {
        let catalog = SongCatalog::new();
        let songs: Vec<_> = (1..=11).map(song).collect();
        let mut evicted = Vec::new();
        for s in &songs {
            evicted.extend(catalog.append(Arc::clone(s)));
        }

        assert_eq!(catalog.len(), 10);
        let list = catalog.list();
        assert_eq!(list[0].id, songs[10].id);
        assert_eq!(list[9].id, songs[1].id);
        assert!(list.iter().all(|s| s.id != songs[0].id));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, songs[0].id);
    }

    #[test]
    fn list_is_newest_first() {
        let catalog = SongCatalog::new();
        let a = song(1);
        let b = song(2);
        catalog.append(Arc::clone(&a));
        catalog.append(Arc::clone(&b));
        let ids: Vec<_> = catalog.list().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec![b.id.clone(), a.id.clone()]);
        assert_eq!(catalog.latest().unwrap().id, b.id);
    }

    #[test]
    fn select_by_id() {
        let catalog = SongCatalog::new();
        let s = song(3);
        catalog.append(Arc::clone(&s));
        assert_eq!(catalog.select(&s.id).unwrap().title, "Song 3");
        assert_eq!(
            catalog.select("missing").unwrap_err(),
            CatalogError::NotFound("missing".into())
        );
    }

    #[test]
    fn capacity_never_exceeds_max() {
        assert_eq!(SongCatalog::with_capacity(50).capacity(), MAX_SONGS);
        assert_eq!(SongCatalog::with_capacity(0).capacity(), 1);

        let small = SongCatalog::with_capacity(2);
        for n in 0..5 {
            small.append(song(n));
            assert!(small.len() <= 2);
        }
    }

    #[test]
    fn concurrent_appends_stay_bounded() {
        let catalog = Arc::new(SongCatalog::new());
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let catalog = Arc::clone(&catalog);
                std::thread::spawn(move || {
                    for n in 0..20 {
                        catalog.append(song(t * 100 + n));
                        assert!(catalog.len() <= MAX_SONGS);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(catalog.len(), MAX_SONGS);
    }

    #[test]
    fn memory_playback_limits_live_handles() {
        let playback = MemoryPlayback::new(2);
        let bytes: Arc<[u8]> = Arc::from(vec![1u8, 2, 3]);
        let a = playback.acquire(Arc::clone(&bytes)).unwrap();
        let _b = playback.acquire(Arc::clone(&bytes)).unwrap();
        assert_eq!(
            playback.acquire(Arc::clone(&bytes)),
            Err(CatalogError::HandleExhausted { live: 2, limit: 2 })
        );
        assert_eq!(playback.resolve(&a).as_deref(), Some(&[1u8, 2, 3][..]));

        playback.release(&a);
        assert!(playback.resolve(&a).is_none());
        assert!(playback.acquire(bytes).is_ok());
        assert_eq!(playback.live_count(), 2);
    }

    #[test]
    fn filename_and_share_metadata() {
        let mut audio = RenderedAudio::new(Mood::Energetic, vec![0; 8], 2.5);
        audio.created_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            audio.download_filename(),
            "energetic-music-creation-2024-03-09T14:05:07.000Z.wav"
        );

        let song = GeneratedSong::new(audio, "Energetic Music Creation".into(), PlaybackHandle("h".into()));
        let share = song.share_payload();
        assert_eq!(share.mime_type, "audio/wav");
        assert_eq!(share.filename, song.download_filename());
        assert_eq!(share.bytes.len(), 8);
        assert!(song.data_uri().starts_with("data:audio/wav;base64,AAAA"));
    }

    #[test]
    fn digest_and_summary() {
        let audio = RenderedAudio::new(Mood::Sad, Vec::new(), 0.0);
        let song = GeneratedSong::new(audio, "t".into(), PlaybackHandle("h".into()));
        assert_eq!(
            song.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        let summary = song.summary();
        assert_eq!(summary.size_bytes, 0);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["mood"], "sad");
        assert!(json.get("durationSeconds").is_some());
    }
}
