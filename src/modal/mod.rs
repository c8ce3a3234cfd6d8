//! Opening, closing and parametrizing modal dialogs from anywhere in the UI
//!
//! ```text
//! shortcut / button → ModalEventBus::publish::<C>() → ModalHost<C> → on_show
//! ```

mod bus;
mod channel;
mod host;

pub use bus::{ModalEvent, ModalEventBus, Subscription};
pub use channel::{
    Channel, CommandPaletteModal, CommandPalettePayload, EntityId, GoalCreateModal,
    GoalCreatePayload, GoalDeleteModal, GoalDeletePayload, IssueCreateModal, IssueCreatePayload,
    ModalName, ProjectCreateModal, ProjectCreatePayload,
};
pub use host::{ModalContext, ModalHost, ModalHostBuilder, ModalState, Trigger};
