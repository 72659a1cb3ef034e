//! Creative generation flows.
//!
//! Each flow is a short, strictly sequential conversation with a
//! [`GenerativeProvider`](cstudio_genai::GenerativeProvider):
//! - [`scenes`]: ask the text model for scene ideas
//! - [`batch`]: render one image per scene, one request at a time
//! - [`edit`]: re-render a single image from a free-text instruction
//! - [`analysis`]: critique a script or reference video and pull out a video prompt
//! - [`video`]: submit a video job and poll it to completion

pub mod analysis;
pub mod batch;
pub mod edit;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod observer;
pub mod prompts;
pub mod scenes;
pub mod video;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use analysis::{analyze, AnalysisSource};
pub use batch::{run_batch, BatchPlan, CANCELLED_REASON};
pub use edit::{render_edit, EditRequest};
pub use error::{WorkflowError, WorkflowResult};
pub use logging::FlowLogger;
pub use observer::{BatchObserver, VideoObserver};
pub use scenes::{suggest_scenes, SceneRequest};
pub use video::{generate_video, PollPolicy, VideoJob, VideoProgress};
