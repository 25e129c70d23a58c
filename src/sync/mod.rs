mod intr_lock;
mod up;

pub use intr_lock::IntrLock;
pub use up::{UPIntrFreeCell, UPSafeCellRaw};
