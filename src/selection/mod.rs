pub mod binplan;
pub mod postage;
pub mod selector;

pub use binplan::{plan_bins, Bin, BinKind};
pub use postage::{estimate_postage, PostageEstimate};
pub use selector::select;

pub const TRAY_SIZE: usize = 150;
