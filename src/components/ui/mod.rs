pub mod alert;
pub mod button;
pub mod card;
pub mod dialog;
pub mod input;
pub mod label;
pub mod popover;
pub mod separator;
pub mod spinner;
pub mod textarea;
pub mod tooltip;

// Re-export component symbols so callers can `use crate::components::ui::Button` etc.
pub use alert::*;
pub use button::*;
#[allow(unused_imports)]
pub use card::*;
pub use dialog::*;
pub use input::*;
pub use label::*;
pub use popover::*;
pub use separator::*;
pub use spinner::*;
pub use textarea::*;
pub use tooltip::*;
