use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};
use ts_core::{AudioAsset, ExtractedDocument, IdeaSet, Script, Stage, TrendItem, TrendQuery};

use crate::client::{AudioOptions, ScriptOptions, StageClient};
use crate::error::ControllerError;

/// Where the pipeline stands, derived from which results are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Idle,
    TrendsLoaded,
    Extracted,
    IdeasGenerated,
    ScriptWritten,
    AudioGenerated,
}

/// Everything the controller holds. At most one result per stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub trends: Vec<TrendItem>,
    pub extracted: Option<ExtractedDocument>,
    pub ideas: Option<IdeaSet>,
    pub script: Option<Script>,
    pub audio: Option<AudioAsset>,
    pub errors: BTreeMap<Stage, String>,
    pub busy: bool,
    pub status: String,
}

impl PipelineState {
    pub fn phase(&self) -> Phase {
        if self.audio.is_some() {
            Phase::AudioGenerated
        } else if self.script.is_some() {
            Phase::ScriptWritten
        } else if self.ideas.is_some() {
            Phase::IdeasGenerated
        } else if self.extracted.is_some() {
            Phase::Extracted
        } else if !self.trends.is_empty() {
            Phase::TrendsLoaded
        } else {
            Phase::Idle
        }
    }

    pub fn selected(&self) -> Option<&TrendItem> {
        self.trends.iter().find(|t| t.selected)
    }

    /// Drops the result of `stage` and of every stage after it.
    fn clear_from(&mut self, stage: Stage) {
        for s in std::iter::once(stage).chain(stage.downstream()) {
            match s {
                Stage::Trends => self.trends.clear(),
                Stage::Extract => self.extracted = None,
                Stage::Ideas => self.ideas = None,
                Stage::Script => self.script = None,
                Stage::Audio => self.audio = None,
            }
            self.errors.remove(&s);
        }
    }
}

/// Resets the busy flag when a stage call ends, including on cancellation.
struct BusyGuard<'a> {
    state: &'a Mutex<PipelineState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).busy = false;
    }
}

fn lock(state: &Mutex<PipelineState>) -> MutexGuard<'_, PipelineState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drives the five stages in order, one call at a time.
///
/// Starting a stage clears its own result and every downstream result before the
/// call is made. While a call is in flight every other action is refused with
/// [`ControllerError::Busy`] and the client is not touched.
pub struct PipelineController<C> {
    client: C,
    state: Mutex<PipelineState>,
}

impl<C: StageClient> PipelineController<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: Mutex::new(PipelineState {
                status: "Ready.".to_string(),
                ..PipelineState::default()
            }),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn snapshot(&self) -> PipelineState {
        lock(&self.state).clone()
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).busy
    }

    pub fn status(&self) -> String {
        lock(&self.state).status.clone()
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase()
    }

    /// Checks gating, clears `stage` onward and marks the controller busy.
    fn begin<T>(
        &self,
        stage: Stage,
        status: &str,
        input: impl FnOnce(&PipelineState) -> Option<T>,
    ) -> Result<(BusyGuard<'_>, T), ControllerError> {
        let mut state = lock(&self.state);
        if state.busy {
            warn!("⏳ Ignoring {} while another stage is running", stage);
            return Err(ControllerError::Busy);
        }
        let input = input(&state)
            .ok_or_else(|| ControllerError::NotReady(prerequisite(stage).unwrap_or(stage)))?;

        state.clear_from(stage);
        state.busy = true;
        state.status = status.to_string();
        info!("▶️ {}", status);
        Ok((BusyGuard { state: &self.state }, input))
    }

    /// Stores a stage result, or records its error and leaves the output empty.
    fn finish<T, R>(
        &self,
        stage: Stage,
        result: ts_core::Result<T>,
        apply: impl FnOnce(&mut PipelineState, T) -> (String, R),
    ) -> Result<R, ControllerError> {
        let mut state = lock(&self.state);
        match result {
            Ok(value) => {
                let (status, output) = apply(&mut state, value);
                info!("✅ {}", status);
                state.status = status;
                Ok(output)
            }
            Err(source) => {
                warn!("❌ {} stage failed: {}", stage, source);
                state.status = format!("The {} stage failed: {}", stage, source);
                state.errors.insert(stage, source.to_string());
                Err(ControllerError::Stage { stage, source })
            }
        }
    }

    pub async fn load_trends(&self, query: &TrendQuery) -> Result<Vec<TrendItem>, ControllerError> {
        let (_busy, ()) = self.begin(Stage::Trends, "Fetching trends...", |_| Some(()))?;
        let result = self.client.trends(query).await;
        self.finish(Stage::Trends, result, |state, items| {
            state.trends = items.clone();
            (format!("Found {} trends.", items.len()), items)
        })
    }

    /// Marks one trend as the working article, discarding everything derived from the previous one.
    pub fn select_trend(&self, index: usize) -> Result<TrendItem, ControllerError> {
        let mut state = lock(&self.state);
        if state.busy {
            return Err(ControllerError::Busy);
        }
        if state.trends.is_empty() {
            return Err(ControllerError::NotReady(Stage::Trends));
        }
        if index >= state.trends.len() {
            return Err(ControllerError::InvalidSelection(index));
        }

        state.clear_from(Stage::Extract);
        for (i, item) in state.trends.iter_mut().enumerate() {
            item.selected = i == index;
        }
        let item = state.trends[index].clone();
        state.status = format!(
            "Selected \"{}\".",
            item.title.as_deref().unwrap_or("untitled article")
        );
        Ok(item)
    }

    pub async fn extract(&self) -> Result<ExtractedDocument, ControllerError> {
        let (_busy, url) = self.begin(Stage::Extract, "Extracting article...", |state| {
            state.selected().and_then(|t| t.url.clone())
        })?;
        let result = self.client.extract(&url).await;
        self.finish(Stage::Extract, result, |state, text| {
            let document = ExtractedDocument { url, text };
            state.extracted = Some(document.clone());
            (
                format!("Article extracted ({} characters).", document.text.chars().count()),
                document,
            )
        })
    }

    pub async fn generate_ideas(&self) -> Result<IdeaSet, ControllerError> {
        let (_busy, text) = self.begin(Stage::Ideas, "Generating ideas...", |state| {
            state.extracted.as_ref().map(|d| d.text.clone())
        })?;
        let result = self.client.ideas(&text).await;
        self.finish(Stage::Ideas, result, |state, text| {
            let ideas = IdeaSet { text };
            state.ideas = Some(ideas.clone());
            ("Ideas ready.".to_string(), ideas)
        })
    }

    pub async fn write_script(&self, options: &ScriptOptions) -> Result<Script, ControllerError> {
        let (_busy, (article, ideas)) = self.begin(Stage::Script, "Writing script...", |state| {
            let article = state.extracted.as_ref()?.text.clone();
            let ideas = state.ideas.as_ref()?.text.clone();
            Some((article, ideas))
        })?;
        let result = self.client.script(&article, &ideas, options).await;
        self.finish(Stage::Script, result, |state, text| {
            let script = Script {
                text,
                duration_secs: options
                    .duration_secs
                    .filter(|d| *d > 0)
                    .unwrap_or(ts_core::types::DEFAULT_SCRIPT_DURATION_SECS),
                tone: options
                    .tone
                    .clone()
                    .unwrap_or_else(|| ts_core::types::DEFAULT_TONE.to_string()),
            };
            state.script = Some(script.clone());
            ("Script ready.".to_string(), script)
        })
    }

    /// Any previous audio is released when this stage starts.
    pub async fn generate_audio(&self, options: &AudioOptions) -> Result<AudioAsset, ControllerError> {
        let (_busy, script) = self.begin(Stage::Audio, "Generating audio...", |state| {
            state.script.as_ref().map(|s| s.text.clone())
        })?;
        let result = self.client.audio(&script, options).await;
        self.finish(Stage::Audio, result, |state, audio| {
            let asset = AudioAsset {
                audio,
                voice: options.voice,
                source_script: script,
                created_at: Utc::now(),
            };
            state.audio = Some(asset.clone());
            (format!("Audio ready ({} bytes).", asset.audio.len()), asset)
        })
    }

    /// Writes the current audio to `dir` under its timestamped file name.
    pub async fn save_audio(&self, dir: &Path) -> Result<PathBuf, ControllerError> {
        let asset = lock(&self.state)
            .audio
            .clone()
            .ok_or(ControllerError::NotReady(Stage::Audio))?;

        let path = dir.join(asset.file_name());
        tokio::fs::write(&path, &asset.audio).await?;
        info!("💾 Saved audio to {}", path.display());

        lock(&self.state).status = format!("Audio saved to {}.", path.display());
        Ok(path)
    }
}

fn prerequisite(stage: Stage) -> Option<Stage> {
    match stage {
        Stage::Trends => None,
        Stage::Extract => Some(Stage::Trends),
        Stage::Ideas => Some(Stage::Extract),
        Stage::Script => Some(Stage::Ideas),
        Stage::Audio => Some(Stage::Script),
    }
}
