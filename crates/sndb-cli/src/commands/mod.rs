pub mod coord;
pub mod dispatch;
pub mod import;
pub mod photometry;
pub mod reconcile;
pub mod resolve;
