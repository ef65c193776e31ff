pub mod desktop;
pub mod gate;
pub mod line_ending;
pub mod loopback;
pub mod remote_control;

pub use desktop::{DesktopAccess, SystemDesktop};
pub use gate::{Admission, CallerTicket, RendezvousGate};
pub use line_ending::{LineEnding, convert_line_ending};
pub use loopback::translate_loopback;
pub use remote_control::RemoteControl;
