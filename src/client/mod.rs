//! Client side of the task list: transport, result cache, query trigger
//! controller, and the session that drives them.

pub mod api;
pub mod cache;
pub mod controller;
pub mod session;

pub use api::{ClientError, HttpTaskApi, LocalTaskApi, TaskApi};
pub use cache::{GET_TASKS_ENDPOINT, RefetchPolicy, ResultCache};
pub use controller::{
    ControllerConfig, ControllerState, DEFAULT_DEBOUNCE, DEFAULT_SCROLL_THRESHOLD, DebounceEdge,
    FetchRequest, FetchTicket, QueryController, ScrollPosition,
};
pub use session::TaskListSession;
