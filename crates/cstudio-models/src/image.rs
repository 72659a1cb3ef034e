//! Generated image slots.
//!
//! Every slot of a batch is created up front in the pending state and then
//! leaves it exactly once per generation attempt, either with a resolved
//! image or with a failure reason. Transitions never mutate a slot in place:
//! they build the next value from the current one and the batch swaps it in
//! under the slot's stable id.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable identity of one batch slot, preserved across edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the slot at `index` in a batch.
    pub fn for_index(index: usize) -> Self {
        Self(format!("gen-{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle of a single slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotState {
    /// Request not finished yet
    Pending,
    /// Image resolved to a directly renderable data URI
    Succeeded { url: String },
    /// Request failed; the slot stays in the batch with no image
    Failed { reason: String },
}

/// Coarse slot status without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Pending,
    Succeeded,
    Failed,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Pending => "pending",
            SlotStatus::Succeeded => "succeeded",
            SlotStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SlotState {
    pub fn status(&self) -> SlotStatus {
        match self {
            SlotState::Pending => SlotStatus::Pending,
            SlotState::Succeeded { .. } => SlotStatus::Succeeded,
            SlotState::Failed { .. } => SlotStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotTransitionError {
    #[error("Slot {id} is already {status}")]
    AlreadyResolved { id: SlotId, status: SlotStatus },

    #[error("Slot {0} is still pending")]
    StillPending(SlotId),

    #[error("Unknown slot: {0}")]
    UnknownSlot(SlotId),
}

/// One image result slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedImage {
    pub id: SlotId,
    /// Instruction that produced (or is producing) the image
    pub prompt: String,
    #[serde(flatten)]
    pub state: SlotState,
}

impl GeneratedImage {
    /// Create a slot that is waiting for its first result.
    pub fn pending(id: SlotId, prompt: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            state: SlotState::Pending,
        }
    }

    pub fn status(&self) -> SlotStatus {
        self.state.status()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SlotState::Pending)
    }

    /// Resolved image URL, or an empty string while pending or after failure.
    pub fn url(&self) -> &str {
        match &self.state {
            SlotState::Succeeded { url } => url,
            _ => "",
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            SlotState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// `Pending -> Succeeded`.
    pub fn succeeded(&self, url: impl Into<String>) -> Result<Self, SlotTransitionError> {
        self.ensure_pending()?;
        Ok(Self {
            id: self.id.clone(),
            prompt: self.prompt.clone(),
            state: SlotState::Succeeded { url: url.into() },
        })
    }

    /// `Pending -> Failed`.
    pub fn failed(&self, reason: impl Into<String>) -> Result<Self, SlotTransitionError> {
        self.ensure_pending()?;
        Ok(Self {
            id: self.id.clone(),
            prompt: self.prompt.clone(),
            state: SlotState::Failed {
                reason: reason.into(),
            },
        })
    }

    /// Replace the image and prompt of a resolved slot after an edit.
    pub fn edited(
        &self,
        url: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Result<Self, SlotTransitionError> {
        if self.is_loading() {
            return Err(SlotTransitionError::StillPending(self.id.clone()));
        }
        Ok(Self {
            id: self.id.clone(),
            prompt: instruction.into(),
            state: SlotState::Succeeded { url: url.into() },
        })
    }

    pub fn view(&self) -> ImageSlotView {
        ImageSlotView {
            id: self.id.clone(),
            url: self.url().to_string(),
            prompt: self.prompt.clone(),
            is_loading: self.is_loading(),
            status: self.status(),
            error: self.failure_reason().map(str::to_string),
        }
    }

    fn ensure_pending(&self) -> Result<(), SlotTransitionError> {
        if self.is_loading() {
            Ok(())
        } else {
            Err(SlotTransitionError::AlreadyResolved {
                id: self.id.clone(),
                status: self.status(),
            })
        }
    }
}

/// Flat projection of a slot for the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSlotView {
    pub id: SlotId,
    pub url: String,
    pub prompt: String,
    pub is_loading: bool,
    pub status: SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ordered set of slots for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageBatch {
    slots: Vec<GeneratedImage>,
}

impl ImageBatch {
    /// Create one pending slot per prompt, ids following prompt order.
    pub fn pending<I, S>(prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = prompts
            .into_iter()
            .enumerate()
            .map(|(i, prompt)| GeneratedImage::pending(SlotId::for_index(i), prompt))
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[GeneratedImage] {
        &self.slots
    }

    pub fn get(&self, id: &SlotId) -> Option<&GeneratedImage> {
        self.slots.iter().find(|s| &s.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.count(SlotStatus::Pending)
    }

    pub fn succeeded_count(&self) -> usize {
        self.count(SlotStatus::Succeeded)
    }

    pub fn failed_count(&self) -> usize {
        self.count(SlotStatus::Failed)
    }

    /// True once no slot is loading.
    pub fn is_complete(&self) -> bool {
        self.pending_count() == 0
    }

    /// Record the outcome of one slot's generation request.
    pub fn resolve(
        &mut self,
        id: &SlotId,
        outcome: Result<String, String>,
    ) -> Result<&GeneratedImage, SlotTransitionError> {
        self.transition(id, |slot| match outcome {
            Ok(url) => slot.succeeded(url),
            Err(reason) => slot.failed(reason),
        })
    }

    /// Swap in an edited image, leaving every other slot untouched.
    pub fn apply_edit(
        &mut self,
        id: &SlotId,
        url: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Result<&GeneratedImage, SlotTransitionError> {
        let url = url.into();
        let instruction = instruction.into();
        self.transition(id, |slot| slot.edited(url, instruction))
    }

    /// Fail every slot that is still pending. Returns how many were failed.
    pub fn fail_pending(&mut self, reason: &str) -> usize {
        let mut failed = 0;
        for slot in self.slots.iter_mut().filter(|s| s.is_loading()) {
            if let Ok(next) = slot.failed(reason) {
                *slot = next;
                failed += 1;
            }
        }
        failed
    }

    pub fn views(&self) -> Vec<ImageSlotView> {
        self.slots.iter().map(GeneratedImage::view).collect()
    }

    fn count(&self, status: SlotStatus) -> usize {
        self.slots.iter().filter(|s| s.status() == status).count()
    }

    fn transition<F>(&mut self, id: &SlotId, f: F) -> Result<&GeneratedImage, SlotTransitionError>
    where
        F: FnOnce(&GeneratedImage) -> Result<GeneratedImage, SlotTransitionError>,
    {
        let index = self
            .slots
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| SlotTransitionError::UnknownSlot(id.clone()))?;
        let next = f(&self.slots[index])?;
        self.slots[index] = next;
        Ok(&self.slots[index])
    }
}
