//! Recipient action framework for the WhatsApp bridge console.
//!
//! A [`RecipientSelector`] resolves the target, an [`ActionForm`] validates
//! its inputs and builds an [`ActionRequest`], the [`SubmissionController`]
//! sends it and normalizes the outcome, and the [`ResultPresenter`] renders
//! it. The [`MediaDownloadCoordinator`] fetches message attachments with a
//! bounded number of concurrent downloads.

pub mod attachment;
pub mod device;
pub mod error;
pub mod export;
pub mod forms;
pub mod handoff;
pub mod login;
pub mod media;
pub mod presenter;
pub mod recipient;
pub mod remap;
pub mod request;
pub mod submission;
pub mod transport;

pub use attachment::{AttachmentRules, AttachmentSlot, LocalFile, MediaSource};
pub use device::{DeviceContext, DeviceRecord};
pub use error::{ActionError, ValidationError};
pub use export::{contacts_csv, write_contacts_csv};
pub use forms::{ActionForm, SendOptions};
pub use handoff::{FileSlot, HandoffSlot, MemorySlot, SELECTED_CHAT_KEY};
pub use login::{QrLoginRefresher, QrSource, QrState};
pub use media::{
    CoordinatorConfig, DownloadStatus, DownloadedMediaRecord, MediaDownloadCoordinator,
    MediaRequest, RetryHandle,
};
pub use presenter::{ChatFilter, Feedback, MessageFilter, Pager, ResultPresenter, Table, TriState};
pub use recipient::{KindChange, RecipientIdentifier, RecipientKind, RecipientSelector};
pub use remap::ErrorRemapTable;
pub use request::{ActionRequest, EphemeralDuration, Modifiers};
pub use submission::{SubmissionController, SubmitOutcome};
pub use transport::Transport;
