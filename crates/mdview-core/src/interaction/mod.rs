//! Pointer interaction: click disambiguation and drag-and-drop.

pub mod click;
pub mod drag;

pub use click::{
    ClickDispatcher, Clock, ManualClock, SystemClock, UiAction, DEFAULT_DOUBLE_CLICK,
};
pub use drag::{DragOperation, DragState};
