//! One-time search for a platform voice that speaks the target language.
//!
//! Platforms often populate their voice list lazily, so discovery checks once,
//! then re-checks on an interval until a bounded number of attempts or an
//! overall timeout runs out. Whatever the result, discovery commits exactly
//! one backend; it never switches again later.

use serde::{Deserialize, Serialize};

use gefen_core::model::{NarrationSettings, DiscoverySettings};

/// A voice the platform offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub name: String,
    /// Language tag as reported by the platform, e.g. `he-IL` or `he_IL`.
    pub lang: String,
}

impl VoiceInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// The platform's voice list.
pub trait VoiceCatalog {
    /// False when the platform has no speech engine at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Voices available right now. May be empty until the platform loads them.
    fn voices(&self) -> Vec<VoiceInfo>;
}

/// Which backend discovery committed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    Native(VoiceInfo),
    Fallback,
}

/// Pick the best voice for `language`/`region`.
///
/// An exact `lang-REGION` (or `lang_REGION`) match wins; otherwise any voice
/// whose tag starts with the bare language is taken.
#[must_use]
pub fn find_voice(voices: &[VoiceInfo], language: &str, region: &str) -> Option<VoiceInfo> {
    let language = language.to_ascii_lowercase();
    let normalized = |v: &VoiceInfo| v.lang.replace('_', "-").to_ascii_lowercase();

    if !region.is_empty() {
        let wanted = format!("{language}-{}", region.to_ascii_lowercase());
        if let Some(voice) = voices.iter().find(|v| normalized(v).contains(&wanted)) {
            return Some(voice.clone());
        }
    }
    voices
        .iter()
        .find(|v| normalized(v).starts_with(&language))
        .cloned()
}

/// Look for a local voice, polling until one appears or the bounds run out.
///
/// Returns [`DiscoveryOutcome::Fallback`] right away on an unsupported platform,
/// and after the attempts or the timeout run out without a usable voice.
pub async fn discover_voice(
    catalog: &dyn VoiceCatalog,
    narration: &NarrationSettings,
    bounds: &DiscoverySettings,
) -> DiscoveryOutcome {
    if !catalog.is_supported() {
        log::info!("speech synthesis unsupported, using remote fallback");
        return DiscoveryOutcome::Fallback;
    }

    let lookup = || find_voice(&catalog.voices(), &narration.language, &narration.region);
    let search = async {
        if let Some(voice) = lookup() {
            return Some(voice);
        }
        for attempt in 1..=bounds.max_attempts {
            tokio::time::sleep(bounds.poll_interval()).await;
            if let Some(voice) = lookup() {
                log::debug!("voice found after {attempt} re-checks");
                return Some(voice);
            }
        }
        None
    };

    match tokio::time::timeout(bounds.timeout(), search).await {
        Ok(Some(voice)) => {
            log::info!("using platform voice {} ({})", voice.name, voice.lang);
            DiscoveryOutcome::Native(voice)
        }
        Ok(None) => {
            log::info!(
                "no {} voice after {} attempts, using remote fallback",
                narration.language_tag(),
                bounds.max_attempts
            );
            DiscoveryOutcome::Fallback
        }
        Err(_) => {
            log::info!("voice discovery timed out, using remote fallback");
            DiscoveryOutcome::Fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    struct LateCatalog {
        ready_at: Instant,
        voices: Vec<VoiceInfo>,
    }

    impl VoiceCatalog for LateCatalog {
        fn voices(&self) -> Vec<VoiceInfo> {
            if Instant::now() >= self.ready_at {
                self.voices.clone()
            } else {
                Vec::new()
            }
        }
    }

    struct Unsupported;

    impl VoiceCatalog for Unsupported {
        fn is_supported(&self) -> bool {
            false
        }

        fn voices(&self) -> Vec<VoiceInfo> {
            vec![VoiceInfo::new("never", "he-IL")]
        }
    }

    fn late(after_ms: u64, voices: Vec<VoiceInfo>) -> LateCatalog {
        LateCatalog {
            ready_at: Instant::now() + Duration::from_millis(after_ms),
            voices,
        }
    }

    #[test]
    fn strict_match_beats_prefix_match() {
        let voices = vec![
            VoiceInfo::new("generic", "he"),
            VoiceInfo::new("carmit", "he_IL"),
        ];
        assert_eq!(find_voice(&voices, "he", "IL").unwrap().name, "carmit");
    }

    #[test]
    fn relaxed_match_takes_language_prefix() {
        let voices = vec![
            VoiceInfo::new("english", "en-US"),
            VoiceInfo::new("generic", "HE"),
        ];
        assert_eq!(find_voice(&voices, "he", "IL").unwrap().name, "generic");
        assert!(find_voice(&voices, "ar", "").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn voice_loaded_late_is_found_by_polling() {
        let catalog = late(500, vec![VoiceInfo::new("carmit", "he-IL")]);
        let outcome =
            discover_voice(&catalog, &NarrationSettings::default(), &DiscoverySettings::default()).await;
        assert_eq!(outcome, DiscoveryOutcome::Native(VoiceInfo::new("carmit", "he-IL")));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_commit_to_fallback() {
        let catalog = late(60_000, vec![VoiceInfo::new("carmit", "he-IL")]);
        let started = Instant::now();
        let outcome =
            discover_voice(&catalog, &NarrationSettings::default(), &DiscoverySettings::default()).await;
        assert_eq!(outcome, DiscoveryOutcome::Fallback);
        assert!(started.elapsed() <= Duration::from_millis(4_000));
    }

    #[tokio::test(start_paused = true)]
    async fn overall_timeout_cuts_polling_short() {
        let catalog = late(60_000, vec![VoiceInfo::new("carmit", "he-IL")]);
        let bounds = DiscoverySettings {
            max_attempts: 1_000,
            ..DiscoverySettings::default()
        };
        let started = Instant::now();
        let outcome = discover_voice(&catalog, &NarrationSettings::default(), &bounds).await;
        assert_eq!(outcome, DiscoveryOutcome::Fallback);
        assert!(started.elapsed() >= Duration::from_millis(4_000));
    }

    #[tokio::test]
    async fn unsupported_platform_falls_back_immediately() {
        let outcome =
            discover_voice(&Unsupported, &NarrationSettings::default(), &DiscoverySettings::default())
                .await;
        assert_eq!(outcome, DiscoveryOutcome::Fallback);
    }
}
